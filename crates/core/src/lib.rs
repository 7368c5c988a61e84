pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::NaiveDateTime;
use tracing::warn;

use models::chart::{AllocationView, AssetSeriesPoint, SeriesPoint};
use models::record::TimeSeriesRecord;
use models::settings::{ReportView, Settings};
use models::wallet::{InputRow, SymbolIssue};
use providers::registry::ProviderRegistry;
use services::{
    allocation_service::AllocationService, price_service::PriceService,
    report_service::ReportService, valuation_service::ValuationService,
};
use storage::record_log::RecordLog;

use errors::CoreError;

/// The result of one valuation run: the snapshot written to the log, its
/// chart-ready view, and every soft failure met along the way.
#[derive(Debug, Clone)]
pub struct ValuationRun {
    pub record: TimeSeriesRecord,
    pub allocation: AllocationView,
    pub issues: Vec<SymbolIssue>,
}

/// Main entry point for the Wallet Tracker core library.
/// Holds the settings and all services needed to value a wallet and
/// report on its history.
#[must_use]
pub struct WalletTracker {
    settings: Settings,
    price_service: PriceService,
    valuation_service: ValuationService,
    allocation_service: AllocationService,
    report_service: ReportService,
}

impl std::fmt::Debug for WalletTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletTracker")
            .field("currency", &self.settings.currency)
            .field("price_source", &self.settings.price_source)
            .field("data_dir", &self.settings.data_dir)
            .finish()
    }
}

impl WalletTracker {
    /// Validate settings, build the configured providers (including key
    /// validation and first catalog download) and ready the data dir.
    pub async fn connect(settings: Settings) -> Result<Self, CoreError> {
        settings.validate()?;
        std::fs::create_dir_all(&settings.data_dir)?;
        let registry = ProviderRegistry::from_settings(&settings).await?;
        let tracker = Self::build(settings, registry);
        if tracker.settings.refresh_catalog {
            tracker.price_service.refresh_catalog().await?;
        }
        Ok(tracker)
    }

    /// Assemble a tracker around pre-built providers. No network calls
    /// happen here; use this to swap in custom implementations.
    pub fn with_registry(settings: Settings, registry: ProviderRegistry) -> Result<Self, CoreError> {
        settings.validate()?;
        std::fs::create_dir_all(&settings.data_dir)?;
        Ok(Self::build(settings, registry))
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ── Valuation ───────────────────────────────────────────────────

    /// Value the wallet described by `rows` at current prices, persist
    /// the snapshot into the view's record log, and return the run.
    ///
    /// Re-running within the same day (or hour, at hourly granularity)
    /// overwrites that period's snapshot instead of appending.
    pub async fn calculate(
        &self,
        rows: &[InputRow],
        view: ReportView,
    ) -> Result<ValuationRun, CoreError> {
        let checked = self
            .valuation_service
            .check_input(rows, view, &self.settings)?;
        let outcome = self
            .valuation_service
            .calc_value(checked, &self.settings, &self.price_service)
            .await?;

        let record = outcome.wallet.to_record(self.price_service.provider_name());
        let log = RecordLog::new(self.settings.record_log_path(view));
        log.upsert(&record, self.settings.granularity)?;

        let allocation = self
            .allocation_service
            .consolidate(&record, view, &self.settings);

        for issue in &outcome.issues {
            warn!("{issue}");
        }
        Ok(ValuationRun {
            record,
            allocation,
            issues: outcome.issues,
        })
    }

    // ── Snapshots ───────────────────────────────────────────────────

    /// Timestamps of every stored snapshot for a view, in file order.
    pub fn snapshots(&self, view: ReportView) -> Result<Vec<NaiveDateTime>, CoreError> {
        let records = RecordLog::new(self.settings.record_log_path(view)).load()?;
        Ok(records.into_iter().map(|r| r.date).collect())
    }

    /// Rebuild the chart view of a stored snapshot without touching the
    /// network. Persisted quantities and values are trusted verbatim.
    pub fn replay(&self, view: ReportView, index: usize) -> Result<ValuationRun, CoreError> {
        let records = RecordLog::new(self.settings.record_log_path(view)).load()?;
        let record = records
            .into_iter()
            .nth(index)
            .ok_or(CoreError::SnapshotNotFound(index))?;
        let allocation = self
            .allocation_service
            .consolidate(&record, view, &self.settings);
        Ok(ValuationRun {
            record,
            allocation,
            issues: Vec::new(),
        })
    }

    // ── Reports ─────────────────────────────────────────────────────

    /// Total balance over time for a view, one point per period with
    /// gaps filled by the last known value.
    pub async fn balance_series(&self, view: ReportView) -> Result<Vec<SeriesPoint>, CoreError> {
        let records = RecordLog::new(self.settings.record_log_path(view)).load()?;
        self.report_service
            .balance_series(
                &records,
                &self.settings,
                self.settings.granularity,
                &self.price_service,
            )
            .await
    }

    /// Quantity and value history of one asset, from the crypto log.
    pub fn asset_series(&self, symbol: &str) -> Result<Vec<AssetSeriesPoint>, CoreError> {
        let records =
            RecordLog::new(self.settings.record_log_path(ReportView::Crypto)).load()?;
        self.report_service
            .asset_series(&records, symbol, self.settings.granularity)
    }

    /// Every asset that ever appeared in the crypto log, sorted.
    pub fn recorded_assets(&self) -> Result<Vec<String>, CoreError> {
        let records =
            RecordLog::new(self.settings.record_log_path(ReportView::Crypto)).load()?;
        Ok(self.report_service.recorded_assets(&records))
    }

    // ── Catalog ─────────────────────────────────────────────────────

    /// Force a provider catalog re-download. Returns the entry count.
    pub async fn refresh_catalog(&self) -> Result<usize, CoreError> {
        self.price_service.refresh_catalog().await
    }

    // ── Internal ────────────────────────────────────────────────────

    fn build(settings: Settings, registry: ProviderRegistry) -> Self {
        Self {
            settings,
            price_service: PriceService::new(registry),
            valuation_service: ValuationService::new(),
            allocation_service: AllocationService::new(),
            report_service: ReportService::new(),
        }
    }
}
