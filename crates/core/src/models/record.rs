use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Wire format of record timestamps, e.g. "21/03/2024 18:30:05".
pub const RECORD_DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// One `[symbol, quantity, value]` triple inside a persisted record.
/// Serialized as a plain JSON array to keep log lines compact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetEntry(pub String, pub f64, pub f64);

impl AssetEntry {
    pub fn new(symbol: impl Into<String>, quantity: f64, value: f64) -> Self {
        Self(symbol.into(), quantity, value)
    }

    pub fn symbol(&self) -> &str {
        &self.0
    }

    pub fn quantity(&self) -> f64 {
        self.1
    }

    pub fn value(&self) -> f64 {
        self.2
    }
}

/// One dated valuation snapshot — one JSON object per log line.
///
/// This is the only persisted history the system has: written by the
/// record log's upsert, read back for replay and for gap-filled series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRecord {
    #[serde(with = "record_date")]
    pub date: NaiveDateTime,
    pub total_value: f64,
    pub total_crypto_stable: f64,
    pub total_invested: f64,
    /// Fiat ticker the values are quoted in, uppercased (e.g. "EUR").
    pub currency: String,
    /// Name of the spot provider that priced this snapshot.
    pub price_provider: String,
    pub assets: Vec<AssetEntry>,
}

impl TimeSeriesRecord {
    /// The recorded entry for one asset, matched case-insensitively.
    pub fn asset(&self, symbol: &str) -> Option<&AssetEntry> {
        self.assets
            .iter()
            .find(|a| a.symbol().eq_ignore_ascii_case(symbol))
    }
}

/// Serde adapter for the dd/mm/yyyy HH:MM:SS timestamps used by the
/// record log.
mod record_date {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::RECORD_DATE_FORMAT;

    pub fn serialize<S>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(RECORD_DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, RECORD_DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}
