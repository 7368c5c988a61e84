use serde::{Deserialize, Serialize};

/// The category of a held asset.
/// Decides how it is priced (spot provider vs forex) and which report
/// bucket it lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetCategory {
    /// Cryptocurrencies (BTC, ETH, ...) — priced via the spot provider
    Crypto,
    /// Stablecoins (USDT, USDC, DAI) — priced like crypto, reported as fiat
    Stable,
    /// Fiat currencies (EUR, USD) — valued 1:1 or via a forex pair
    Fiat,
}

impl std::fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetCategory::Crypto => write!(f, "Crypto"),
            AssetCategory::Stable => write!(f, "Stable"),
            AssetCategory::Fiat => write!(f, "Fiat"),
        }
    }
}

/// One validated, merged holding.
///
/// `symbol` stays lowercase while moving through the pipeline; the report
/// output uppercases it. Duplicate input rows have already been summed
/// into a single `Holding` by the time one of these exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub quantity: f64,
    pub category: AssetCategory,
}

impl Holding {
    pub fn new(symbol: impl Into<String>, quantity: f64, category: AssetCategory) -> Self {
        Self {
            symbol: symbol.into().to_lowercase(),
            quantity,
            category,
        }
    }
}
