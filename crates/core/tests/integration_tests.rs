// ═══════════════════════════════════════════════════════════════════
// Integration Tests — the WalletTracker facade over mock providers and
// a temporary data directory
// ═══════════════════════════════════════════════════════════════════

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::{tempdir, TempDir};

use wallet_tracker_core::errors::CoreError;
use wallet_tracker_core::models::record::{AssetEntry, TimeSeriesRecord};
use wallet_tracker_core::models::settings::{ReportView, Settings};
use wallet_tracker_core::models::wallet::InputRow;
use wallet_tracker_core::providers::registry::ProviderRegistry;
use wallet_tracker_core::providers::traits::{
    PairPriceSource, PriceBatch, ResolutionOutcome, SpotPriceProvider,
};
use wallet_tracker_core::storage::record_log::RecordLog;
use wallet_tracker_core::WalletTracker;

// ═══════════════════════════════════════════════════════════════════
// Mock providers
// ═══════════════════════════════════════════════════════════════════

struct MockSpotProvider {
    prices: HashMap<String, f64>,
}

impl MockSpotProvider {
    fn with_prices(pairs: &[(&str, f64)]) -> Self {
        Self {
            prices: pairs.iter().map(|(s, p)| (s.to_string(), *p)).collect(),
        }
    }
}

#[async_trait]
impl SpotPriceProvider for MockSpotProvider {
    fn name(&self) -> &str {
        "MockSpot"
    }

    async fn resolve(&self, tickers: &[String]) -> Result<ResolutionOutcome, CoreError> {
        let mut outcome = ResolutionOutcome::default();
        for ticker in tickers {
            outcome.resolved.insert(ticker.clone(), format!("{ticker}-id"));
        }
        Ok(outcome)
    }

    async fn fetch_prices(
        &self,
        tickers: &[String],
        _currency: &str,
    ) -> Result<PriceBatch, CoreError> {
        let mut batch = PriceBatch::default();
        for ticker in tickers {
            match self.prices.get(ticker) {
                Some(price) => {
                    batch.prices.insert(ticker.clone(), *price);
                }
                None => {
                    batch.missing.insert(ticker.clone());
                }
            }
        }
        Ok(batch)
    }

    async fn refresh_catalog(&self) -> Result<usize, CoreError> {
        Ok(0)
    }
}

struct MockPairSource {
    rates: HashMap<String, f64>,
}

impl MockPairSource {
    fn with_rates(pairs: &[(&str, f64)]) -> Self {
        Self {
            rates: pairs.iter().map(|(s, r)| (s.to_string(), *r)).collect(),
        }
    }
}

#[async_trait]
impl PairPriceSource for MockPairSource {
    fn name(&self) -> &str {
        "MockPairs"
    }

    async fn latest_price(&self, symbol: &str) -> Result<f64, CoreError> {
        self.rates.get(symbol).copied().ok_or_else(|| CoreError::Api {
            provider: "MockPairs".to_string(),
            message: format!("no rate for {symbol}"),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════

fn tracker(dir: &TempDir, prices: &[(&str, f64)]) -> WalletTracker {
    let settings = Settings {
        data_dir: dir.path().to_path_buf(),
        ..Settings::default()
    };
    let registry = ProviderRegistry::with_providers(
        Box::new(MockSpotProvider::with_prices(prices)),
        Box::new(MockPairSource::with_rates(&[("EURUSD=X", 2.0)])),
    );
    WalletTracker::with_registry(settings, registry).unwrap()
}

fn standard_rows() -> Vec<InputRow> {
    vec![
        InputRow::new("BTC", "1"),
        InputRow::new("USDC", "1000"),
        InputRow::new("EUR", "500"),
        InputRow::new("total_invested", "15000"),
    ]
}

fn standard_prices() -> Vec<(&'static str, f64)> {
    vec![("btc", 20000.0), ("usdc", 1.0)]
}

fn dt(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn history_record(
    currency: &str,
    date: NaiveDateTime,
    total: f64,
    assets: Vec<AssetEntry>,
) -> TimeSeriesRecord {
    TimeSeriesRecord {
        date,
        total_value: total,
        total_crypto_stable: total,
        total_invested: 0.0,
        currency: currency.to_string(),
        price_provider: "MockSpot".to_string(),
        assets,
    }
}

// ═══════════════════════════════════════════════════════════════════
// Valuation runs
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_calculate_values_and_persists_a_snapshot() {
    let dir = tempdir().unwrap();
    let tracker = tracker(&dir, &standard_prices());

    let run = tracker
        .calculate(&standard_rows(), ReportView::Total)
        .await
        .unwrap();

    assert_eq!(run.record.total_value, 21500.0);
    assert_eq!(run.record.total_crypto_stable, 21000.0);
    assert_eq!(run.record.total_invested, 15000.0);
    assert_eq!(run.record.price_provider, "MockSpot");
    assert!(run.issues.is_empty());

    // The total view splits into exactly two buckets.
    assert_eq!(run.allocation.slice("Crypto"), Some(20000.0));
    assert_eq!(run.allocation.slice("Fiat"), Some(1500.0));

    let raw = std::fs::read_to_string(dir.path().join("wallet_overview.jsonl")).unwrap();
    assert_eq!(raw.lines().count(), 1);
}

#[tokio::test]
async fn test_same_day_rerun_replaces_the_snapshot() {
    let dir = tempdir().unwrap();
    let tracker = tracker(&dir, &standard_prices());

    tracker
        .calculate(&standard_rows(), ReportView::Total)
        .await
        .unwrap();
    tracker
        .calculate(&[InputRow::new("btc", "2")], ReportView::Total)
        .await
        .unwrap();

    let snapshots = tracker.snapshots(ReportView::Total).unwrap();
    assert_eq!(snapshots.len(), 1);

    let run = tracker.replay(ReportView::Total, 0).unwrap();
    assert_eq!(run.record.total_value, 40000.0);
}

#[tokio::test]
async fn test_views_keep_separate_logs() {
    let dir = tempdir().unwrap();
    let tracker = tracker(&dir, &standard_prices());

    let crypto = tracker
        .calculate(&standard_rows(), ReportView::Crypto)
        .await
        .unwrap();
    let total = tracker
        .calculate(&standard_rows(), ReportView::Total)
        .await
        .unwrap();

    // The crypto view never sees the fiat row.
    assert_eq!(crypto.record.total_value, 21000.0);
    assert_eq!(total.record.total_value, 21500.0);

    assert!(dir.path().join("wallet_value.jsonl").exists());
    assert!(dir.path().join("wallet_overview.jsonl").exists());
    assert_eq!(tracker.snapshots(ReportView::Crypto).unwrap().len(), 1);
    assert_eq!(tracker.snapshots(ReportView::Total).unwrap().len(), 1);
}

#[tokio::test]
async fn test_soft_issues_do_not_fail_the_run() {
    let dir = tempdir().unwrap();
    let tracker = tracker(&dir, &standard_prices());

    let run = tracker
        .calculate(
            &[InputRow::new("btc", "1"), InputRow::new("xyz", "5")],
            ReportView::Crypto,
        )
        .await
        .unwrap();

    assert_eq!(run.record.total_value, 20000.0);
    assert!(run.record.asset("xyz").is_none());
    assert_eq!(run.issues.len(), 1);
}

// ═══════════════════════════════════════════════════════════════════
// Replay
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_replay_rebuilds_the_view_from_the_log() {
    let dir = tempdir().unwrap();
    let tracker = tracker(&dir, &standard_prices());

    let live = tracker
        .calculate(&standard_rows(), ReportView::Total)
        .await
        .unwrap();
    let replayed = tracker.replay(ReportView::Total, 0).unwrap();

    assert_eq!(replayed.record, live.record);
    assert_eq!(replayed.allocation.total, live.allocation.total);
    assert_eq!(replayed.allocation.slices, live.allocation.slices);
    assert!(replayed.issues.is_empty());
}

#[test]
fn test_replay_of_a_missing_snapshot_fails() {
    let dir = tempdir().unwrap();
    let tracker = tracker(&dir, &standard_prices());

    match tracker.replay(ReportView::Crypto, 0).unwrap_err() {
        CoreError::SnapshotNotFound(index) => assert_eq!(index, 0),
        other => panic!("Expected SnapshotNotFound, got {other:?}"),
    }
}

// ═══════════════════════════════════════════════════════════════════
// Reports over stored history
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_balance_series_converts_and_gap_fills() {
    let dir = tempdir().unwrap();
    let tracker = tracker(&dir, &standard_prices());

    let log = RecordLog::new(tracker.settings().record_log_path(ReportView::Total));
    let btc = |value| vec![AssetEntry::new("BTC", 1.0, value)];
    log.upsert(
        &history_record("EUR", dt(2024, 3, 1, 10), 100.0, btc(100.0)),
        tracker.settings().granularity,
    )
    .unwrap();
    log.upsert(
        &history_record("USD", dt(2024, 3, 3, 10), 300.0, btc(300.0)),
        tracker.settings().granularity,
    )
    .unwrap();

    let points = tracker.balance_series(ReportView::Total).await.unwrap();
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    // The USD day converts at the mocked 2.0 rate; the day between
    // carries the last known value.
    assert_eq!(values, vec![100.0, 100.0, 150.0]);
}

#[test]
fn test_asset_series_and_recorded_assets_read_the_crypto_log() {
    let dir = tempdir().unwrap();
    let tracker = tracker(&dir, &standard_prices());

    let log = RecordLog::new(tracker.settings().record_log_path(ReportView::Crypto));
    log.upsert(
        &history_record(
            "EUR",
            dt(2024, 3, 2, 10),
            100.0,
            vec![AssetEntry::new("BTC", 1.0, 100.0)],
        ),
        tracker.settings().granularity,
    )
    .unwrap();
    log.upsert(
        &history_record(
            "EUR",
            dt(2024, 3, 3, 10),
            210.0,
            vec![
                AssetEntry::new("BTC", 1.5, 150.0),
                AssetEntry::new("ETH", 2.0, 60.0),
            ],
        ),
        tracker.settings().granularity,
    )
    .unwrap();

    let points = tracker.asset_series("btc").unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(points[0].amount, 0.0);
    assert_eq!(points[2].value, 150.0);

    assert_eq!(tracker.recorded_assets().unwrap(), vec!["BTC", "ETH"]);
}

// ═══════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_unsupported_currency_is_rejected_up_front() {
    let dir = tempdir().unwrap();
    let settings = Settings {
        currency: "GBP".to_string(),
        data_dir: dir.path().to_path_buf(),
        ..Settings::default()
    };
    let registry = ProviderRegistry::with_providers(
        Box::new(MockSpotProvider::with_prices(&[])),
        Box::new(MockPairSource::with_rates(&[])),
    );

    match WalletTracker::with_registry(settings, registry).unwrap_err() {
        CoreError::Config(message) => assert!(message.contains("GBP")),
        other => panic!("Expected Config, got {other:?}"),
    }
}
