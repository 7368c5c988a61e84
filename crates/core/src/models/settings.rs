use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::CoreError;
use super::asset::AssetCategory;

/// Which spot-price provider backs a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    /// Free and keyless, but rate-limited and full of ticker collisions.
    CoinGecko,
    /// Key-gated, batched pricing on a monthly quota.
    CoinMarketCap,
}

impl PriceSource {
    /// Stable file-name prefix for this provider's cache files.
    pub fn slug(&self) -> &'static str {
        match self {
            PriceSource::CoinGecko => "coingecko",
            PriceSource::CoinMarketCap => "coinmarketcap",
        }
    }
}

impl std::fmt::Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceSource::CoinGecko => write!(f, "CoinGecko"),
            PriceSource::CoinMarketCap => write!(f, "CoinMarketCap"),
        }
    }
}

/// Which wallet view a run computes, and which log file it lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportView {
    /// Crypto + stablecoins only; fiat rows are skipped on input.
    Crypto,
    /// Everything, bucketed into Crypto vs Fiat for display.
    Total,
}

/// Date-key resolution of the record log and of gap-filled series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotGranularity {
    Daily,
    Hourly,
}

impl SnapshotGranularity {
    /// Truncate a timestamp to this granularity's date key.
    pub fn truncate(&self, ts: NaiveDateTime) -> NaiveDateTime {
        match self {
            SnapshotGranularity::Daily => ts.date().and_hms_opt(0, 0, 0).unwrap(),
            SnapshotGranularity::Hourly => ts.date().and_hms_opt(ts.hour(), 0, 0).unwrap(),
        }
    }

    /// One report period at this granularity.
    pub fn step(&self) -> chrono::Duration {
        match self {
            SnapshotGranularity::Daily => chrono::Duration::days(1),
            SnapshotGranularity::Hourly => chrono::Duration::hours(1),
        }
    }
}

/// User-configurable settings, loaded from a JSON file by the frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Currency all values are quoted in. Must be one of `supported_fiat`.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Spot-price provider for crypto and stablecoins.
    #[serde(default = "default_price_source")]
    pub price_source: PriceSource,

    /// CoinMarketCap API key, required when `price_source` is
    /// coinmarketcap. Real keys are UUID strings.
    #[serde(default)]
    pub cmc_api_key: Option<String>,

    /// Directory holding the cache files and record logs.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Fiat tickers accepted as holdings and as record currencies.
    #[serde(default = "default_supported_fiat")]
    pub supported_fiat: Vec<String>,

    /// Tickers priced like crypto but bucketed as fiat in reports.
    #[serde(default = "default_supported_stablecoins")]
    pub supported_stablecoins: Vec<String>,

    /// Allocation slices at or below this share of the total are folded
    /// into the "other" slice.
    #[serde(default = "default_min_slice_fraction")]
    pub min_slice_fraction: f64,

    /// One record per day, or per hour.
    #[serde(default = "default_granularity")]
    pub granularity: SnapshotGranularity,

    /// Re-download the provider catalog on connect.
    #[serde(default)]
    pub refresh_catalog: bool,

    /// Upper bound for provider retries. `None` retries until the
    /// provider answers, which is what unattended runs want.
    #[serde(default)]
    pub max_retry_attempts: Option<u32>,
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_price_source() -> PriceSource {
    PriceSource::CoinGecko
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_supported_fiat() -> Vec<String> {
    vec!["eur".to_string(), "usd".to_string()]
}

fn default_supported_stablecoins() -> Vec<String> {
    vec!["usdt".to_string(), "usdc".to_string(), "dai".to_string()]
}

fn default_min_slice_fraction() -> f64 {
    0.02
}

fn default_granularity() -> SnapshotGranularity {
    SnapshotGranularity::Daily
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            price_source: default_price_source(),
            cmc_api_key: None,
            data_dir: default_data_dir(),
            supported_fiat: default_supported_fiat(),
            supported_stablecoins: default_supported_stablecoins(),
            min_slice_fraction: default_min_slice_fraction(),
            granularity: default_granularity(),
            refresh_catalog: false,
            max_retry_attempts: None,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file. Missing fields fall back to their
    /// defaults, so a partial file is fine.
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.is_supported_fiat(&self.currency) {
            return Err(CoreError::Config(format!(
                "currency {} is not in the supported fiat list",
                self.currency
            )));
        }
        if !(0.0..=1.0).contains(&self.min_slice_fraction) {
            return Err(CoreError::Config(
                "min_slice_fraction must be between 0 and 1".to_string(),
            ));
        }
        if self.price_source == PriceSource::CoinMarketCap
            && self.cmc_api_key.as_deref().map_or(true, str::is_empty)
        {
            return Err(CoreError::ApiKeyMalformed {
                provider: "CoinMarketCap".to_string(),
            });
        }
        Ok(())
    }

    pub fn is_supported_fiat(&self, symbol: &str) -> bool {
        self.supported_fiat
            .iter()
            .any(|f| f.eq_ignore_ascii_case(symbol))
    }

    pub fn is_stablecoin(&self, symbol: &str) -> bool {
        self.supported_stablecoins
            .iter()
            .any(|s| s.eq_ignore_ascii_case(symbol))
    }

    /// Category of a holding under these membership lists.
    pub fn classify(&self, symbol: &str) -> AssetCategory {
        if self.is_supported_fiat(symbol) {
            AssetCategory::Fiat
        } else if self.is_stablecoin(symbol) {
            AssetCategory::Stable
        } else {
            AssetCategory::Crypto
        }
    }

    // ── Data paths ──────────────────────────────────────────────────

    pub fn symbol_cache_path(&self, source: PriceSource) -> PathBuf {
        self.data_dir.join(format!("{}_symbols.json", source.slug()))
    }

    pub fn catalog_path(&self, source: PriceSource) -> PathBuf {
        self.data_dir.join(format!("{}_catalog.json", source.slug()))
    }

    pub fn record_log_path(&self, view: ReportView) -> PathBuf {
        match view {
            ReportView::Crypto => self.data_dir.join("wallet_value.jsonl"),
            ReportView::Total => self.data_dir.join("wallet_overview.jsonl"),
        }
    }
}
