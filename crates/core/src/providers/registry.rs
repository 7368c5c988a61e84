use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::settings::{PriceSource, Settings};
use crate::storage::catalog_store::{CatalogStore, JsonCatalogStore};
use crate::storage::symbol_cache_store::{JsonSymbolCacheStore, SymbolCacheStore};

use super::coingecko::CoinGeckoProvider;
use super::coinmarketcap::CoinMarketCapProvider;
use super::retry::{RetryPolicy, Sleeper, TokioSleeper};
use super::traits::{PairPriceSource, SpotPriceProvider};
use super::yahoo_finance::YahooFinanceProvider;

/// The two providers a run needs: one spot-price API for crypto and
/// stablecoins, one pair-quote source for fiat exchange rates.
pub struct ProviderRegistry {
    spot: Box<dyn SpotPriceProvider>,
    fx: Box<dyn PairPriceSource>,
}

impl ProviderRegistry {
    /// Build the configured providers, including their startup work
    /// (key validation, first catalog download).
    pub async fn from_settings(settings: &Settings) -> Result<Self, CoreError> {
        let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);
        let policy = RetryPolicy::from_settings(settings);
        let cache_store: Arc<dyn SymbolCacheStore> = Arc::new(JsonSymbolCacheStore::new(
            settings.symbol_cache_path(settings.price_source),
        ));
        let catalog_store: Arc<dyn CatalogStore> = Arc::new(JsonCatalogStore::new(
            settings.catalog_path(settings.price_source),
        ));

        let spot: Box<dyn SpotPriceProvider> = match settings.price_source {
            // CoinGecko — crypto, no API key needed
            PriceSource::CoinGecko => Box::new(
                CoinGeckoProvider::connect(cache_store, catalog_store, policy, sleeper).await?,
            ),
            // CoinMarketCap — crypto, requires API key
            PriceSource::CoinMarketCap => {
                let key = settings.cmc_api_key.as_deref().ok_or_else(|| {
                    CoreError::ApiKeyMalformed {
                        provider: "CoinMarketCap".to_string(),
                    }
                })?;
                Box::new(
                    CoinMarketCapProvider::connect(
                        key,
                        cache_store,
                        catalog_store,
                        policy,
                        sleeper,
                    )
                    .await?,
                )
            }
        };

        // Yahoo Finance — fiat pairs, no API key needed
        let fx: Box<dyn PairPriceSource> = Box::new(YahooFinanceProvider::new()?);

        Ok(Self { spot, fx })
    }

    /// Assemble a registry from pre-built providers. Lets callers swap
    /// in their own implementations.
    pub fn with_providers(
        spot: Box<dyn SpotPriceProvider>,
        fx: Box<dyn PairPriceSource>,
    ) -> Self {
        Self { spot, fx }
    }

    pub fn spot(&self) -> &dyn SpotPriceProvider {
        self.spot.as_ref()
    }

    pub fn fx(&self) -> &dyn PairPriceSource {
        self.fx.as_ref()
    }
}
