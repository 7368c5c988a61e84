// ═══════════════════════════════════════════════════════════════════
// Provider Tests — retry policy, the bounded retry loop, API key shape
// checks
// ═══════════════════════════════════════════════════════════════════

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use wallet_tracker_core::errors::CoreError;
use wallet_tracker_core::models::settings::Settings;
use wallet_tracker_core::providers::coinmarketcap::CoinMarketCapProvider;
use wallet_tracker_core::providers::retry::{send_with_retry, RetryPolicy, Sleeper};

#[derive(Default)]
struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    fn delays(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Retry policy
// ═══════════════════════════════════════════════════════════════════

mod retry_policy {
    use super::*;

    #[test]
    fn rate_limits_wait_out_the_rolling_minute() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_for(StatusCode::TOO_MANY_REQUESTS),
            Duration::from_secs(110)
        );
    }

    #[test]
    fn server_errors_get_a_short_delay() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_for(StatusCode::INTERNAL_SERVER_ERROR),
            Duration::from_secs(20)
        );
        assert_eq!(
            policy.delay_for(StatusCode::SERVICE_UNAVAILABLE),
            Duration::from_secs(20)
        );
    }

    #[test]
    fn other_statuses_get_the_default_delay() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_for(StatusCode::NOT_FOUND),
            Duration::from_secs(30)
        );
        assert_eq!(
            policy.delay_for(StatusCode::FORBIDDEN),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn key_validation_variant_shortens_only_the_rate_limit_wait() {
        let policy = RetryPolicy {
            max_attempts: Some(4),
            ..RetryPolicy::default()
        }
        .for_key_validation();

        assert_eq!(
            policy.delay_for(StatusCode::TOO_MANY_REQUESTS),
            Duration::from_secs(60)
        );
        assert_eq!(
            policy.delay_for(StatusCode::INTERNAL_SERVER_ERROR),
            Duration::from_secs(20)
        );
        assert_eq!(policy.max_attempts, Some(4));
    }

    #[test]
    fn from_settings_takes_the_attempt_bound() {
        let settings = Settings {
            max_retry_attempts: Some(7),
            ..Settings::default()
        };
        assert_eq!(RetryPolicy::from_settings(&settings).max_attempts, Some(7));
        assert_eq!(RetryPolicy::from_settings(&Settings::default()).max_attempts, None);
    }

    #[test]
    fn unbounded_policy_never_exhausts() {
        let policy = RetryPolicy::default();
        assert!(!policy.exhausted(1));
        assert!(!policy.exhausted(1000));
    }

    #[test]
    fn bounded_policy_exhausts_at_the_limit() {
        let policy = RetryPolicy {
            max_attempts: Some(3),
            ..RetryPolicy::default()
        };
        assert!(!policy.exhausted(2));
        assert!(policy.exhausted(3));
        assert!(policy.exhausted(4));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Retry loop
// ═══════════════════════════════════════════════════════════════════

mod retry_loop {
    use super::*;

    // Nothing listens on port 1, so every send fails immediately with a
    // connection error and no test ever touches the network.
    fn refused_request(client: &reqwest::Client) -> reqwest::RequestBuilder {
        client.get("http://127.0.0.1:1/")
    }

    #[tokio::test]
    async fn single_attempt_bound_fails_without_sleeping() {
        let client = reqwest::Client::new();
        let policy = RetryPolicy {
            max_attempts: Some(1),
            ..RetryPolicy::default()
        };
        let sleeper = RecordingSleeper::default();

        let result =
            send_with_retry("TestProvider", &policy, &sleeper, || refused_request(&client)).await;

        match result {
            Err(CoreError::ProviderUnavailable { provider, attempts }) => {
                assert_eq!(provider, "TestProvider");
                assert_eq!(attempts, 1);
            }
            other => panic!("Expected ProviderUnavailable, got {other:?}"),
        }
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn sleeps_between_attempts_but_not_after_the_last() {
        let client = reqwest::Client::new();
        let policy = RetryPolicy {
            max_attempts: Some(3),
            ..RetryPolicy::default()
        };
        let sleeper = RecordingSleeper::default();

        let result =
            send_with_retry("TestProvider", &policy, &sleeper, || refused_request(&client)).await;

        assert!(result.is_err());
        // Connection errors wait the default delay.
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_secs(30), Duration::from_secs(30)]
        );
    }
}

// ═══════════════════════════════════════════════════════════════════
// API key shape
// ═══════════════════════════════════════════════════════════════════

mod key_shape {
    use super::*;

    #[test]
    fn uuid_shaped_keys_are_plausible() {
        assert!(CoinMarketCapProvider::plausible_key(
            "01234567-89ab-cdef-0123-456789abcdef"
        ));
    }

    #[test]
    fn other_strings_are_rejected_before_any_request() {
        assert!(!CoinMarketCapProvider::plausible_key("definitely-not-a-key"));
        assert!(!CoinMarketCapProvider::plausible_key(""));
        assert!(!CoinMarketCapProvider::plausible_key("01234567-89ab"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// YahooFinanceProvider
// ═══════════════════════════════════════════════════════════════════

mod yahoo_finance {
    use wallet_tracker_core::providers::traits::PairPriceSource;
    use wallet_tracker_core::providers::yahoo_finance::YahooFinanceProvider;

    #[test]
    fn name() {
        let provider = YahooFinanceProvider::new().unwrap();
        assert_eq!(provider.name(), "Yahoo Finance");
    }
}
