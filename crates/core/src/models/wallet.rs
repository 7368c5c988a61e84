use chrono::NaiveDateTime;
use std::collections::BTreeMap;

use super::asset::AssetCategory;
use super::record::{AssetEntry, TimeSeriesRecord};

/// One already-parsed row of the holdings input file.
///
/// The third column is carried for compatibility with older input files
/// and is ignored during live valuation.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRow {
    pub symbol: String,
    /// Raw quantity text; validated (finite, non-negative) by check_input.
    pub quantity: String,
    pub label: Option<String>,
}

impl InputRow {
    pub fn new(symbol: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: quantity.into(),
            label: None,
        }
    }

    pub fn with_label(
        symbol: impl Into<String>,
        quantity: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: quantity.into(),
            label: Some(label.into()),
        }
    }
}

/// A fully valued wallet, the in-memory result of one valuation run.
/// Persisted as a `TimeSeriesRecord`; never stored directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    /// Uppercased symbol -> valued position.
    pub assets: BTreeMap<String, WalletAsset>,
    pub total_invested: f64,
    pub currency: String,
    pub date: NaiveDateTime,
    /// Sum over every category.
    pub total_value: f64,
    /// Crypto + stablecoins only; drives crypto-view reports and
    /// percentage-of-portfolio figures.
    pub total_crypto_stable: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalletAsset {
    pub quantity: f64,
    pub value: f64,
    pub category: AssetCategory,
}

impl Wallet {
    pub fn new(currency: impl Into<String>, date: NaiveDateTime) -> Self {
        Self {
            assets: BTreeMap::new(),
            total_invested: 0.0,
            currency: currency.into(),
            date,
            total_value: 0.0,
            total_crypto_stable: 0.0,
        }
    }

    /// The snapshot form written to the record log.
    pub fn to_record(&self, price_provider: &str) -> TimeSeriesRecord {
        TimeSeriesRecord {
            date: self.date,
            total_value: self.total_value,
            total_crypto_stable: self.total_crypto_stable,
            total_invested: self.total_invested,
            currency: self.currency.clone(),
            price_provider: price_provider.to_string(),
            assets: self
                .assets
                .iter()
                .map(|(symbol, asset)| AssetEntry::new(symbol.clone(), asset.quantity, asset.value))
                .collect(),
        }
    }
}

/// A soft, per-symbol failure collected during a run and surfaced once at
/// the end. Never aborts the batch on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolIssue {
    pub symbol: String,
    pub reason: IssueReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueReason {
    /// Quantity column did not parse as a finite, non-negative number.
    BadQuantity,
    /// No usable catalog match: unknown ticker, or ambiguous with no
    /// single fixed override.
    Unresolved,
    /// Resolved id came back without a usable price.
    PriceMissing,
    /// Forex lookup for a fiat holding failed.
    FxFailed,
}

impl std::fmt::Display for SymbolIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reason {
            IssueReason::BadQuantity => write!(f, "{}: quantity is not a number", self.symbol),
            IssueReason::Unresolved => write!(f, "{}: could not be resolved to a provider id", self.symbol),
            IssueReason::PriceMissing => write!(f, "{}: provider returned no price", self.symbol),
            IssueReason::FxFailed => write!(f, "{}: forex conversion failed", self.symbol),
        }
    }
}
