use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::errors::CoreError;
use crate::models::catalog::AssetCatalog;
use crate::models::symbol_cache::SymbolCache;
use crate::storage::catalog_store::CatalogStore;
use crate::storage::symbol_cache_store::SymbolCacheStore;

use super::traits::ResolutionOutcome;

/// Maps user tickers to provider asset ids using the downloaded catalog,
/// a user-editable fixed list for ambiguous tickers, and a persistent
/// cache of everything resolved so far.
///
/// Shared by both spot providers; only the catalog contents differ.
pub struct SymbolResolver {
    cache_store: Arc<dyn SymbolCacheStore>,
    catalog_store: Arc<dyn CatalogStore>,
    cache: Mutex<SymbolCache>,
    catalog: Mutex<AssetCatalog>,
}

impl SymbolResolver {
    pub fn new(
        cache_store: Arc<dyn SymbolCacheStore>,
        catalog_store: Arc<dyn CatalogStore>,
    ) -> Result<Self, CoreError> {
        let cache = cache_store.load()?;
        let catalog = catalog_store.load()?.unwrap_or_default();
        Ok(Self {
            cache_store,
            catalog_store,
            cache: Mutex::new(cache),
            catalog: Mutex::new(catalog),
        })
    }

    /// Canonical ticker form: trimmed, lowercased, empties dropped,
    /// duplicates removed keeping first-seen order.
    pub fn normalize(tickers: &[String]) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for ticker in tickers {
            let t = ticker.trim().to_lowercase();
            if t.is_empty() {
                continue;
            }
            if seen.insert(t.clone()) {
                out.push(t);
            }
        }
        out
    }

    pub fn catalog_is_empty(&self) -> bool {
        self.catalog
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }

    /// Persist a freshly downloaded catalog and start resolving against
    /// it. Returns the entry count.
    pub fn install_catalog(&self, catalog: AssetCatalog) -> Result<usize, CoreError> {
        self.catalog_store.save(&catalog)?;
        let count = catalog.len();
        *self.catalog.lock().unwrap_or_else(|e| e.into_inner()) = catalog;
        info!("installed asset catalog with {count} entries");
        Ok(count)
    }

    /// Resolve `tickers` (already normalized) to provider ids.
    ///
    /// Cached answers win outright. A single catalog match is accepted
    /// as is. Multiple matches need exactly one of them on the fixed
    /// list, otherwise the ticker stays unresolved. New answers are
    /// remembered and the cache is written back immediately.
    pub fn resolve(&self, tickers: &[String]) -> Result<ResolutionOutcome, CoreError> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        let catalog = self.catalog.lock().unwrap_or_else(|e| e.into_inner());

        let mut outcome = ResolutionOutcome::default();
        let mut dirty = false;

        for ticker in tickers {
            if let Some(id) = cache.resolved(ticker) {
                outcome.resolved.insert(ticker.clone(), id.to_string());
                continue;
            }

            let candidates = catalog.ids_for(ticker);
            let accepted = match candidates.len() {
                0 => {
                    warn!("no catalog match for ticker {ticker}");
                    None
                }
                1 => Some(candidates[0].to_string()),
                _ => {
                    let fixed: Vec<&&str> =
                        candidates.iter().filter(|id| cache.is_fixed(id)).collect();
                    if fixed.len() == 1 {
                        Some(fixed[0].to_string())
                    } else {
                        warn!(
                            "ambiguous ticker {ticker} matches {candidates:?}, \
                             add one to the fixed list"
                        );
                        None
                    }
                }
            };

            match accepted {
                Some(id) => {
                    cache.remember(ticker.clone(), id.clone());
                    outcome.resolved.insert(ticker.clone(), id);
                    dirty = true;
                }
                None => {
                    outcome.unresolved.insert(ticker.clone());
                }
            }
        }

        if dirty {
            self.cache_store.save(&cache)?;
        }
        Ok(outcome)
    }
}
