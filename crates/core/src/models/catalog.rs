use serde::{Deserialize, Serialize};

/// One asset known to a price provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Provider-internal, unambiguous asset identifier.
    pub id: String,
    /// Human ticker, not unique (many providers list several "ONE"s).
    pub symbol: String,
    pub name: String,
}

/// Local snapshot of a provider's full asset catalog, persisted as one
/// JSON array. Read-only during resolution; refreshed on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetCatalog {
    entries: Vec<CatalogEntry>,
}

impl AssetCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Every provider id whose listed symbol matches the ticker,
    /// case-insensitively, in catalog order.
    pub fn ids_for(&self, ticker: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.symbol.eq_ignore_ascii_case(ticker))
            .map(|e| e.id.as_str())
            .collect()
    }
}
