use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Persistent ticker-resolution state, one per provider.
///
/// `fixed` is the manually curated disambiguation list: when a ticker
/// matches several catalog ids, the single candidate present here wins.
/// `used` memoizes every resolution already made so catalog scans happen
/// at most once per ticker. Both grow monotonically; nothing is evicted
/// automatically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolCache {
    #[serde(default)]
    pub fixed: BTreeSet<String>,
    #[serde(default)]
    pub used: BTreeMap<String, String>,
}

impl SymbolCache {
    /// Memoized provider id for a ticker, if one was ever resolved.
    pub fn resolved(&self, ticker: &str) -> Option<&str> {
        self.used.get(ticker).map(String::as_str)
    }

    pub fn remember(&mut self, ticker: impl Into<String>, id: impl Into<String>) {
        self.used.insert(ticker.into(), id.into());
    }

    pub fn is_fixed(&self, id: &str) -> bool {
        self.fixed.contains(id)
    }
}
