use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One point of a continuous balance series.
/// Gap periods repeat the last known value, so consecutive points are
/// always exactly one period apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDateTime,
    pub value: f64,
}

/// One point of a single-asset series: how much was held and what it was
/// worth at that date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSeriesPoint {
    pub date: NaiveDateTime,
    pub amount: f64,
    pub value: f64,
}

/// One slice of an allocation breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub label: String,
    pub value: f64,
}

/// Consolidated category view of one snapshot, ready for pie rendering.
/// The core computes all the numbers; the frontend only draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationView {
    pub date: NaiveDateTime,
    pub currency: String,
    /// Crypto view: the crypto+stable total. Total view: everything.
    pub total: f64,
    pub total_invested: f64,
    /// Stablecoin share of `total`, in percent. -1 when `total` is zero.
    pub stablecoin_pct: f64,
    pub slices: Vec<AllocationSlice>,
}

impl AllocationView {
    /// Value of a named slice, if present.
    pub fn slice(&self, label: &str) -> Option<f64> {
        self.slices
            .iter()
            .find(|s| s.label.eq_ignore_ascii_case(label))
            .map(|s| s.value)
    }
}
