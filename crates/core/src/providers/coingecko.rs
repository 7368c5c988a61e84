use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::catalog::{AssetCatalog, CatalogEntry};
use crate::storage::catalog_store::CatalogStore;
use crate::storage::symbol_cache_store::SymbolCacheStore;

use super::resolver::SymbolResolver;
use super::retry::{send_with_retry, RetryPolicy, Sleeper};
use super::traits::{PriceBatch, ResolutionOutcome, SpotPriceProvider};

const BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko spot-price provider. Keyless, so the only startup work is
/// making sure a catalog is on disk.
pub struct CoinGeckoProvider {
    client: reqwest::Client,
    resolver: SymbolResolver,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl CoinGeckoProvider {
    pub async fn connect(
        cache_store: Arc<dyn SymbolCacheStore>,
        catalog_store: Arc<dyn CatalogStore>,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let provider = Self {
            client,
            resolver: SymbolResolver::new(cache_store, catalog_store)?,
            policy,
            sleeper,
        };
        if provider.resolver.catalog_is_empty() {
            provider.refresh_catalog().await?;
        }
        Ok(provider)
    }

    async fn download_catalog(&self) -> Result<AssetCatalog, CoreError> {
        let response = send_with_retry(self.name(), &self.policy, self.sleeper.as_ref(), || {
            self.client.get(format!("{BASE_URL}/coins/list"))
        })
        .await?;
        // /coins/list entries carry exactly id, symbol and name.
        let entries: Vec<CatalogEntry> = response.json().await?;
        Ok(AssetCatalog::new(entries))
    }
}

#[async_trait]
impl SpotPriceProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        "CoinGecko"
    }

    async fn resolve(&self, tickers: &[String]) -> Result<ResolutionOutcome, CoreError> {
        let tickers = SymbolResolver::normalize(tickers);
        self.resolver.resolve(&tickers)
    }

    async fn fetch_prices(
        &self,
        tickers: &[String],
        currency: &str,
    ) -> Result<PriceBatch, CoreError> {
        let tickers = SymbolResolver::normalize(tickers);
        let resolution = self.resolver.resolve(&tickers)?;

        let mut batch = PriceBatch {
            unresolved: resolution.unresolved,
            ..PriceBatch::default()
        };
        if resolution.resolved.is_empty() {
            return Ok(batch);
        }

        let ids = resolution
            .resolved
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let vs = currency.to_lowercase();

        let response = send_with_retry(self.name(), &self.policy, self.sleeper.as_ref(), || {
            self.client.get(format!("{BASE_URL}/simple/price")).query(&[
                ("ids", ids.clone()),
                ("vs_currencies", vs.clone()),
                ("precision", "2".to_string()),
            ])
        })
        .await?;

        // Shape: { "<id>": { "<currency>": 123.45 } }. A known id with no
        // market data comes back as an empty object.
        let payload: HashMap<String, HashMap<String, f64>> = response.json().await?;

        for (ticker, id) in &resolution.resolved {
            match payload.get(id) {
                Some(quote) => match quote.get(&vs) {
                    Some(price) => {
                        batch.prices.insert(ticker.clone(), *price);
                    }
                    None => {
                        // Listed but not priced, count it at zero so the
                        // wallet still carries the position.
                        batch.prices.insert(ticker.clone(), 0.0);
                        batch.missing.insert(ticker.clone());
                    }
                },
                None => {
                    batch.missing.insert(ticker.clone());
                }
            }
        }
        Ok(batch)
    }

    async fn refresh_catalog(&self) -> Result<usize, CoreError> {
        let catalog = self.download_catalog().await?;
        self.resolver.install_catalog(catalog)
    }
}
