use std::path::PathBuf;

use tracing::debug;

use crate::errors::CoreError;
use crate::models::catalog::AssetCatalog;

/// Persistence seam for the provider catalog.
pub trait CatalogStore: Send + Sync {
    /// `Ok(None)` means no catalog has been downloaded yet.
    fn load(&self) -> Result<Option<AssetCatalog>, CoreError>;
    fn save(&self, catalog: &AssetCatalog) -> Result<(), CoreError>;
}

/// Catalog persisted as a JSON file in the data directory.
pub struct JsonCatalogStore {
    path: PathBuf,
}

impl JsonCatalogStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CatalogStore for JsonCatalogStore {
    fn load(&self) -> Result<Option<AssetCatalog>, CoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, catalog: &AssetCatalog) -> Result<(), CoreError> {
        // Catalogs run to tens of thousands of entries, keep them compact.
        let raw = serde_json::to_string(catalog)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        std::fs::write(&self.path, raw)?;
        debug!(
            "saved catalog with {} entries to {}",
            catalog.len(),
            self.path.display()
        );
        Ok(())
    }
}
