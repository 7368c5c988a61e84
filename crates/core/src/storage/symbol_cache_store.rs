use std::path::PathBuf;

use tracing::debug;

use crate::errors::CoreError;
use crate::models::symbol_cache::SymbolCache;

/// Persistence seam for the symbol cache, so resolution logic can be
/// tested against an in-memory store.
pub trait SymbolCacheStore: Send + Sync {
    fn load(&self) -> Result<SymbolCache, CoreError>;
    fn save(&self, cache: &SymbolCache) -> Result<(), CoreError>;
}

/// Symbol cache persisted as a JSON file next to the other data files.
pub struct JsonSymbolCacheStore {
    path: PathBuf,
}

impl JsonSymbolCacheStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SymbolCacheStore for JsonSymbolCacheStore {
    fn load(&self) -> Result<SymbolCache, CoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            // First run: no cache yet.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SymbolCache::default());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, cache: &SymbolCache) -> Result<(), CoreError> {
        // Pretty-printed so users can hand-edit the fixed list.
        let raw = serde_json::to_string_pretty(cache)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        std::fs::write(&self.path, raw)?;
        debug!("saved symbol cache to {}", self.path.display());
        Ok(())
    }
}
