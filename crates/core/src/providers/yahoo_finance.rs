use async_trait::async_trait;
use time::OffsetDateTime;

use crate::errors::CoreError;
use super::traits::PairPriceSource;

/// A few days of lookback rides over weekends and market holidays.
const LOOKBACK_DAYS: i64 = 5;

/// Yahoo Finance provider for fiat exchange rates.
///
/// - **Free**: No API key required.
/// - **Coverage**: All the usual currency pairs, quoted as `EURUSD=X`.
/// - **Data**: Daily closes; the most recent one is treated as current.
///
/// Uses the `yahoo_finance_api` crate which wraps Yahoo Finance's public
/// endpoints.
pub struct YahooFinanceProvider {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self, CoreError> {
        let connector = yahoo_finance_api::YahooConnector::new()
            .map_err(|e| CoreError::Api {
                provider: "Yahoo Finance".into(),
                message: format!("Failed to create connector: {e}"),
            })?;
        Ok(Self { connector })
    }
}

#[async_trait]
impl PairPriceSource for YahooFinanceProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    async fn latest_price(&self, symbol: &str) -> Result<f64, CoreError> {
        let end = OffsetDateTime::now_utc();
        let start = end - time::Duration::days(LOOKBACK_DAYS);

        let resp = self
            .connector
            .get_quote_history(symbol, start, end)
            .await
            .map_err(|e| CoreError::Api {
                provider: "Yahoo Finance".into(),
                message: format!("Failed to fetch history for {symbol}: {e}"),
            })?;

        let quotes = resp.quotes().map_err(|e| CoreError::Api {
            provider: "Yahoo Finance".into(),
            message: format!("Failed to parse quotes for {symbol}: {e}"),
        })?;

        quotes
            .last()
            .map(|q| q.close)
            .ok_or_else(|| CoreError::Api {
                provider: "Yahoo Finance".into(),
                message: format!("No recent close for {symbol}"),
            })
    }
}
