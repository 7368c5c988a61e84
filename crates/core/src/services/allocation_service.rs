use crate::models::chart::{AllocationSlice, AllocationView};
use crate::models::record::TimeSeriesRecord;
use crate::models::settings::{ReportView, Settings};

/// Label of the synthetic slice that absorbs positions too small to get
/// their own slice. Always first in the slice list when present.
pub const OTHER_LABEL: &str = "other";

/// Builds the pie-chart view of a snapshot: per-asset slices with small
/// positions folded into "other" for the crypto view, a fixed
/// Crypto/Fiat split for the total view.
///
/// Works purely on persisted records, so replayed history renders
/// exactly like a live run.
#[derive(Debug, Default)]
pub struct AllocationService;

impl AllocationService {
    pub fn new() -> Self {
        Self
    }

    pub fn consolidate(
        &self,
        record: &TimeSeriesRecord,
        view: ReportView,
        settings: &Settings,
    ) -> AllocationView {
        let (total, slices) = match view {
            ReportView::Crypto => (
                record.total_crypto_stable,
                self.crypto_slices(record, settings),
            ),
            ReportView::Total => (record.total_value, self.total_slices(record, settings)),
        };
        AllocationView {
            date: record.date,
            currency: record.currency.clone(),
            total,
            total_invested: record.total_invested,
            stablecoin_pct: self.stablecoin_percentage(record, view, settings),
            slices,
        }
    }

    /// Stablecoin share of the view's total, as a percentage. A zero or
    /// negative total reports the -1 sentinel instead of dividing.
    pub fn stablecoin_percentage(
        &self,
        record: &TimeSeriesRecord,
        view: ReportView,
        settings: &Settings,
    ) -> f64 {
        let denominator = match view {
            ReportView::Crypto => record.total_crypto_stable,
            ReportView::Total => record.total_value,
        };
        if denominator <= 0.0 {
            return -1.0;
        }
        let stable: f64 = record
            .assets
            .iter()
            .filter(|e| settings.is_stablecoin(e.symbol()))
            .map(|e| e.value())
            .sum();
        stable / denominator * 100.0
    }

    /// Per-asset slices with everything at or below the minimum slice
    /// fraction of totalCryptoStable folded into "other". An "other"
    /// entry already present in the record keeps its value without being
    /// thresholded again.
    fn crypto_slices(&self, record: &TimeSeriesRecord, settings: &Settings) -> Vec<AllocationSlice> {
        let total = record.total_crypto_stable;
        let mut slices = Vec::new();
        let mut other = 0.0;
        let mut any_other = false;

        for entry in &record.assets {
            let symbol = entry.symbol();
            if settings.is_supported_fiat(symbol) {
                continue;
            }
            if symbol.eq_ignore_ascii_case(OTHER_LABEL) {
                other += entry.value();
                any_other = true;
                continue;
            }
            // A zero total means nothing can be compared against it,
            // every asset keeps its own slice.
            if total > 0.0 && entry.value() / total <= settings.min_slice_fraction {
                other += entry.value();
                any_other = true;
            } else {
                slices.push(AllocationSlice {
                    label: symbol.to_string(),
                    value: entry.value(),
                });
            }
        }

        if any_other {
            slices.insert(
                0,
                AllocationSlice {
                    label: OTHER_LABEL.to_string(),
                    value: other,
                },
            );
        }
        slices
    }

    /// Exactly two buckets: Crypto, and Fiat. Stablecoins count as fiat
    /// here since they hold fiat value.
    fn total_slices(&self, record: &TimeSeriesRecord, settings: &Settings) -> Vec<AllocationSlice> {
        let mut crypto = 0.0;
        let mut fiat = 0.0;
        for entry in &record.assets {
            let symbol = entry.symbol();
            if settings.is_supported_fiat(symbol) || settings.is_stablecoin(symbol) {
                fiat += entry.value();
            } else {
                crypto += entry.value();
            }
        }
        vec![
            AllocationSlice {
                label: "Crypto".to_string(),
                value: crypto,
            },
            AllocationSlice {
                label: "Fiat".to_string(),
                value: fiat,
            },
        ]
    }
}
