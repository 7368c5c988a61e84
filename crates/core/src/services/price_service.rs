use crate::errors::CoreError;
use crate::providers::registry::ProviderRegistry;
use crate::providers::traits::PriceBatch;

/// Thin façade over the provider registry: spot prices for crypto and
/// stablecoins, pair quotes for fiat conversion.
///
/// **Note on precision**: all prices are `f64`, which has ~15-17
/// significant decimal digits. Plenty for wallet totals, but repeated
/// arithmetic may accumulate small floating-point errors.
pub struct PriceService {
    registry: ProviderRegistry,
}

impl PriceService {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    /// Name of the active spot provider, recorded into snapshots.
    pub fn provider_name(&self) -> &str {
        self.registry.spot().name()
    }

    /// Current spot prices for `tickers`, quoted in `currency`.
    pub async fn spot_prices(
        &self,
        tickers: &[String],
        currency: &str,
    ) -> Result<PriceBatch, CoreError> {
        self.registry.spot().fetch_prices(tickers, currency).await
    }

    /// Exchange rate from `base` to `quote`, via the pair symbol
    /// `{BASE}{QUOTE}=X`. Same currency is always 1.
    pub async fn fx_rate(&self, base: &str, quote: &str) -> Result<f64, CoreError> {
        if base.eq_ignore_ascii_case(quote) {
            return Ok(1.0);
        }
        let pair = format!("{}{}=X", base.to_uppercase(), quote.to_uppercase());
        self.registry.fx().latest_price(&pair).await
    }

    pub async fn refresh_catalog(&self) -> Result<usize, CoreError> {
        self.registry.spot().refresh_catalog().await
    }
}
