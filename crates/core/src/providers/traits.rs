use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use crate::errors::CoreError;

/// Result of mapping user tickers to provider ids.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolutionOutcome {
    /// ticker → provider id, for every ticker that resolved.
    pub resolved: BTreeMap<String, String>,
    /// Tickers with no usable catalog match.
    pub unresolved: BTreeSet<String>,
}

/// Result of one pricing round-trip for a batch of tickers.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PriceBatch {
    /// ticker → spot price in the requested currency.
    pub prices: BTreeMap<String, f64>,
    /// Tickers that never resolved to a provider id.
    pub unresolved: BTreeSet<String>,
    /// Resolved tickers the provider returned no price for.
    pub missing: BTreeSet<String>,
}

/// Trait abstraction for crypto spot-price APIs.
///
/// Each provider (CoinGecko, CoinMarketCap) implements this trait. If an
/// API stops working or changes, we replace only that one implementation
/// and the rest of the codebase is untouched.
#[async_trait]
pub trait SpotPriceProvider: Send + Sync {
    /// Human-readable name of this provider (for logs and snapshots).
    fn name(&self) -> &str;

    /// Map tickers to this provider's asset ids.
    async fn resolve(&self, tickers: &[String]) -> Result<ResolutionOutcome, CoreError>;

    /// Current prices for `tickers`, quoted in `currency`.
    async fn fetch_prices(
        &self,
        tickers: &[String],
        currency: &str,
    ) -> Result<PriceBatch, CoreError>;

    /// Re-download the provider's asset catalog. Returns the entry count.
    async fn refresh_catalog(&self) -> Result<usize, CoreError>;
}

/// A quote source addressed by pair symbol, used for fiat exchange rates.
#[async_trait]
pub trait PairPriceSource: Send + Sync {
    fn name(&self) -> &str;

    /// Latest price for a pair symbol such as `EURUSD=X`.
    async fn latest_price(&self, symbol: &str) -> Result<f64, CoreError>;
}
