use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::warn;

use crate::errors::CoreError;
use crate::models::settings::Settings;

/// Clock seam so retry behavior is testable without real waits.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How long to wait after each kind of provider failure.
///
/// Free-tier rate limits reset on a rolling minute, so the rate-limit
/// delay sits comfortably past one minute. Unattended runs keep retrying
/// until the provider answers unless `max_attempts` is set.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub rate_limit_delay: Duration,
    pub server_error_delay: Duration,
    pub default_delay: Duration,
    /// After this many consecutive failures, log that the provider may
    /// be down rather than merely busy.
    pub outage_warning_threshold: u32,
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            rate_limit_delay: Duration::from_secs(110),
            server_error_delay: Duration::from_secs(20),
            default_delay: Duration::from_secs(30),
            outage_warning_threshold: 5,
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_attempts: settings.max_retry_attempts,
            ..Self::default()
        }
    }

    /// Variant used while validating an API key at startup: a shorter
    /// rate-limit wait keeps a misconfigured run from hanging for ages.
    pub fn for_key_validation(&self) -> Self {
        Self {
            rate_limit_delay: Duration::from_secs(60),
            ..self.clone()
        }
    }

    pub fn delay_for(&self, status: StatusCode) -> Duration {
        if status == StatusCode::TOO_MANY_REQUESTS {
            self.rate_limit_delay
        } else if status.is_server_error() {
            self.server_error_delay
        } else {
            self.default_delay
        }
    }

    pub fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

/// Send a request, retrying on any non-success outcome until it succeeds
/// or the policy's attempt bound is hit.
///
/// `request` builds a fresh request per attempt since a builder is
/// consumed by send.
pub async fn send_with_retry<F>(
    provider: &str,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut request: F,
) -> Result<reqwest::Response, CoreError>
where
    F: FnMut() -> reqwest::RequestBuilder + Send,
{
    let mut attempts: u32 = 0;
    loop {
        let delay = match request().send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                let status = response.status();
                let delay = policy.delay_for(status);
                warn!(
                    "{provider} answered {status}, retrying in {}s",
                    delay.as_secs()
                );
                delay
            }
            Err(e) => {
                let err = CoreError::from(e);
                warn!(
                    "{provider} request failed ({err}), retrying in {}s",
                    policy.default_delay.as_secs()
                );
                policy.default_delay
            }
        };

        attempts += 1;
        if attempts > policy.outage_warning_threshold {
            warn!("{provider} may be down, still retrying (attempt {attempts})");
        }
        if policy.exhausted(attempts) {
            return Err(CoreError::ProviderUnavailable {
                provider: provider.to_string(),
                attempts,
            });
        }
        sleeper.sleep(delay).await;
    }
}
