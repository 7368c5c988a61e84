use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::catalog::{AssetCatalog, CatalogEntry};
use crate::storage::catalog_store::CatalogStore;
use crate::storage::symbol_cache_store::SymbolCacheStore;

use super::resolver::SymbolResolver;
use super::retry::{send_with_retry, RetryPolicy, Sleeper};
use super::traits::{PriceBatch, ResolutionOutcome, SpotPriceProvider};

const BASE_URL: &str = "https://pro-api.coinmarketcap.com/v1";
const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

/// CoinMarketCap spot-price provider. Needs an API key, which is shape-
/// checked locally and then validated against the API before first use.
pub struct CoinMarketCapProvider {
    client: reqwest::Client,
    api_key: String,
    resolver: SymbolResolver,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl CoinMarketCapProvider {
    /// CoinMarketCap issues keys as UUID strings, so anything else is a
    /// typo we can reject without spending a network call.
    pub fn plausible_key(key: &str) -> bool {
        Uuid::try_parse(key).is_ok()
    }

    pub async fn connect(
        api_key: &str,
        cache_store: Arc<dyn SymbolCacheStore>,
        catalog_store: Arc<dyn CatalogStore>,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, CoreError> {
        if !Self::plausible_key(api_key) {
            return Err(CoreError::ApiKeyMalformed {
                provider: "CoinMarketCap".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let provider = Self {
            client,
            api_key: api_key.to_string(),
            resolver: SymbolResolver::new(cache_store, catalog_store)?,
            policy,
            sleeper,
        };
        provider.validate_key().await?;
        if provider.resolver.catalog_is_empty() {
            provider.refresh_catalog().await?;
        }
        Ok(provider)
    }

    /// Probe the key against /key/info. Rate limits and server errors
    /// are retried; any other rejection is final.
    async fn validate_key(&self) -> Result<(), CoreError> {
        let policy = self.policy.for_key_validation();
        let mut attempts: u32 = 0;
        loop {
            let outcome = self
                .client
                .get(format!("{BASE_URL}/key/info"))
                .header(API_KEY_HEADER, &self.api_key)
                .send()
                .await;

            let delay = match outcome {
                Ok(response) if response.status().is_success() => {
                    info!("CoinMarketCap accepted the API key");
                    return Ok(());
                }
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    warn!(
                        "CoinMarketCap rate-limited the key check, retrying in {}s",
                        policy.rate_limit_delay.as_secs()
                    );
                    policy.rate_limit_delay
                }
                Ok(response) if response.status().is_server_error() => {
                    warn!(
                        "CoinMarketCap answered {} during the key check, retrying in {}s",
                        response.status(),
                        policy.server_error_delay.as_secs()
                    );
                    policy.server_error_delay
                }
                Ok(_) => {
                    return Err(CoreError::ApiKeyRejected {
                        provider: self.name().to_string(),
                    });
                }
                Err(e) => {
                    let err = CoreError::from(e);
                    warn!(
                        "CoinMarketCap key check failed ({err}), retrying in {}s",
                        policy.default_delay.as_secs()
                    );
                    policy.default_delay
                }
            };

            attempts += 1;
            if policy.exhausted(attempts) {
                return Err(CoreError::ProviderUnavailable {
                    provider: self.name().to_string(),
                    attempts,
                });
            }
            self.sleeper.sleep(delay).await;
        }
    }

    async fn download_catalog(&self) -> Result<AssetCatalog, CoreError> {
        let response = send_with_retry(self.name(), &self.policy, self.sleeper.as_ref(), || {
            self.client
                .get(format!("{BASE_URL}/cryptocurrency/map"))
                .header(API_KEY_HEADER, &self.api_key)
        })
        .await?;

        let payload: MapResponse = response.json().await?;
        let entries = payload
            .data
            .into_iter()
            .map(|e| CatalogEntry {
                id: e.id.to_string(),
                symbol: e.symbol,
                name: e.name,
            })
            .collect();
        Ok(AssetCatalog::new(entries))
    }
}

#[async_trait]
impl SpotPriceProvider for CoinMarketCapProvider {
    fn name(&self) -> &str {
        "CoinMarketCap"
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
        let convert = currency.to_uppercase();

        let sent = send_with_retry(self.name(), &self.policy, self.sleeper.as_ref(), || {
            self.client
                .get(format!("{BASE_URL}/cryptocurrency/quotes/latest"))
                .header(API_KEY_HEADER, &self.api_key)
                .query(&[("id", ids.clone()), ("convert", convert.clone())])
        })
        .await;

        // A quote batch that cannot be fetched or read degrades to
        // missing prices instead of failing the whole run.
        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                warn!("CoinMarketCap quote batch failed ({e}), marking all tickers missing");
                batch.missing.extend(resolution.resolved.keys().cloned());
                return Ok(batch);
            }
        };
        let payload: QuotesResponse = match response.json().await {
            Ok(payload) => payload,
            Err(e) => {
                let err = CoreError::from(e);
                warn!("CoinMarketCap quote payload unreadable ({err}), marking all tickers missing");
                batch.missing.extend(resolution.resolved.keys().cloned());
                return Ok(batch);
            }
        };

        for (ticker, id) in &resolution.resolved {
            match payload.data.get(id) {
                Some(entry) => match entry.quote.get(&convert).and_then(|q| q.price) {
                    Some(price) => {
                        batch.prices.insert(ticker.clone(), price);
                    }
                    None => {
                        // Listed but unpriced (price comes back null).
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

// ── CoinMarketCap API response types ────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MapResponse {
    data: Vec<MapEntry>,
}

#[derive(Debug, Deserialize)]
struct MapEntry {
    id: u64,
    symbol: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct QuotesResponse {
    data: HashMap<String, QuoteEntry>,
}

#[derive(Debug, Deserialize)]
struct QuoteEntry {
    quote: HashMap<String, Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    price: Option<f64>,
}
