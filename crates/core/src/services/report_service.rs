use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDateTime;
use tracing::warn;

use crate::errors::CoreError;
use crate::models::chart::{AssetSeriesPoint, SeriesPoint};
use crate::models::record::TimeSeriesRecord;
use crate::models::settings::{Settings, SnapshotGranularity};

use super::allocation_service::OTHER_LABEL;
use super::price_service::PriceService;

/// Replays the record log into continuous, chart-ready series.
///
/// The log may skip days (nobody ran the tool) and may mix currencies
/// (the configured currency changed at some point). Gaps are filled by
/// carrying the last known value forward; foreign-currency records are
/// normalized into the configured currency first.
#[derive(Debug, Default)]
pub struct ReportService;

impl ReportService {
    pub fn new() -> Self {
        Self
    }

    /// Total balance over time, one point per period, gaps filled.
    ///
    /// Records in another supported fiat currency are converted at
    /// today's rate (one lookup per currency for the whole series).
    /// Records in an unsupported currency fail the report.
    pub async fn balance_series(
        &self,
        records: &[TimeSeriesRecord],
        settings: &Settings,
        granularity: SnapshotGranularity,
        prices: &PriceService,
    ) -> Result<Vec<SeriesPoint>, CoreError> {
        let report_currency = settings.currency.to_uppercase();
        let mut rates: HashMap<String, f64> = HashMap::new();
        let mut series: Vec<(NaiveDateTime, f64)> = Vec::new();

        for record in records {
            let mut value = record.total_value;
            let record_currency = record.currency.to_uppercase();

            if record_currency != report_currency {
                if !settings.is_supported_fiat(&record_currency) {
                    return Err(CoreError::UnsupportedCurrencyPair {
                        base: report_currency,
                        quote: record_currency,
                    });
                }
                let rate = match rates.get(&record_currency) {
                    Some(rate) => *rate,
                    None => {
                        let rate = prices.fx_rate(&report_currency, &record_currency).await?;
                        rates.insert(record_currency.clone(), rate);
                        rate
                    }
                };
                if rate <= 0.0 {
                    return Err(CoreError::UnsupportedCurrencyPair {
                        base: report_currency,
                        quote: record_currency,
                    });
                }
                value /= rate;
            }

            let key = granularity.truncate(record.date);
            advance(&mut series, key, value, granularity);
        }

        Ok(series
            .into_iter()
            .map(|(date, value)| SeriesPoint { date, value })
            .collect())
    }

    /// Quantity and value of one asset over time, gaps filled, with a
    /// zero point one period before its first appearance so charts rise
    /// from zero.
    pub fn asset_series(
        &self,
        records: &[TimeSeriesRecord],
        symbol: &str,
        granularity: SnapshotGranularity,
    ) -> Result<Vec<AssetSeriesPoint>, CoreError> {
        let mut series: Vec<(NaiveDateTime, (f64, f64))> = Vec::new();

        for record in records {
            let Some(entry) = record.asset(symbol) else {
                continue;
            };
            let key = granularity.truncate(record.date);
            advance(&mut series, key, (entry.quantity(), entry.value()), granularity);
        }

        if series.is_empty() {
            return Err(CoreError::ValidationError(format!(
                "asset {symbol} does not appear in the record log"
            )));
        }

        let seed_date = series[0].0 - granularity.step();
        let mut points = Vec::with_capacity(series.len() + 1);
        points.push(AssetSeriesPoint {
            date: seed_date,
            amount: 0.0,
            value: 0.0,
        });
        points.extend(series.into_iter().map(|(date, (amount, value))| {
            AssetSeriesPoint {
                date,
                amount,
                value,
            }
        }));
        Ok(points)
    }

    /// Every asset that ever appeared in the log, uppercased and sorted.
    /// The synthetic "other" slice is not an asset.
    pub fn recorded_assets(&self, records: &[TimeSeriesRecord]) -> Vec<String> {
        let mut symbols = BTreeSet::new();
        for record in records {
            for entry in &record.assets {
                if entry.symbol().eq_ignore_ascii_case(OTHER_LABEL) {
                    continue;
                }
                symbols.insert(entry.symbol().to_uppercase());
            }
        }
        symbols.into_iter().collect()
    }
}

/// Append one (date, payload) point, filling any gap since the previous
/// point by repeating its payload, one entry per period.
///
/// Out-of-order keys are skipped with a warning; a repeated key keeps
/// the later payload.
fn advance<T: Copy>(
    series: &mut Vec<(NaiveDateTime, T)>,
    key: NaiveDateTime,
    payload: T,
    granularity: SnapshotGranularity,
) {
    match series.last().copied() {
        None => series.push((key, payload)),
        Some((last_key, last_payload)) => {
            if key < last_key {
                warn!("out-of-order record at {key} skipped");
            } else if key == last_key {
                if let Some(slot) = series.last_mut() {
                    slot.1 = payload;
                }
            } else {
                let mut expected = last_key + granularity.step();
                while expected < key {
                    series.push((expected, last_payload));
                    expected += granularity.step();
                }
                series.push((key, payload));
            }
        }
    }
}
