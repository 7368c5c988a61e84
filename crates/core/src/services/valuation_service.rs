use std::collections::BTreeMap;

use chrono::Timelike;
use tracing::{info, warn};

use crate::errors::CoreError;
use crate::models::asset::{AssetCategory, Holding};
use crate::models::settings::{ReportView, Settings};
use crate::models::wallet::{InputRow, IssueReason, SymbolIssue, Wallet, WalletAsset};
use crate::providers::traits::PriceBatch;

use super::price_service::PriceService;

/// Input rows under this symbol carry the amount of money put in, not a
/// holding. Intercepted during validation and stored on the wallet.
pub const TOTAL_INVESTED_SYMBOL: &str = "total_invested";

/// Validated, merged input ready to be priced.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CheckedInput {
    /// Lowercased symbol -> merged holding.
    pub holdings: BTreeMap<String, Holding>,
    pub total_invested: f64,
    pub issues: Vec<SymbolIssue>,
}

/// A valued wallet plus every soft failure met along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationOutcome {
    pub wallet: Wallet,
    pub issues: Vec<SymbolIssue>,
}

/// Turns raw input rows into a fully valued wallet.
///
/// Validation and pricing are split so the pure part stays testable
/// without providers.
#[derive(Debug, Default)]
pub struct ValuationService;

impl ValuationService {
    pub fn new() -> Self {
        Self
    }

    /// Validate and merge input rows.
    ///
    /// Rows with unparseable quantities are reported and dropped, never
    /// fatal. Duplicate symbols sum their quantities. An input with zero
    /// valid holdings is fatal.
    pub fn check_input(
        &self,
        rows: &[InputRow],
        view: ReportView,
        settings: &Settings,
    ) -> Result<CheckedInput, CoreError> {
        let mut checked = CheckedInput::default();

        for row in rows {
            let symbol = row.symbol.trim().to_lowercase();
            if symbol.is_empty() {
                continue;
            }

            // The same input file serves both views; the crypto view
            // does not want fiat rows.
            if view == ReportView::Crypto && settings.is_supported_fiat(&symbol) {
                continue;
            }

            let quantity = match row.quantity.trim().parse::<f64>() {
                Ok(q) if q.is_finite() && q >= 0.0 => q,
                _ => {
                    warn!("cannot parse quantity {:?} for {symbol}", row.quantity);
                    checked.issues.push(SymbolIssue {
                        symbol,
                        reason: IssueReason::BadQuantity,
                    });
                    continue;
                }
            };

            if symbol == TOTAL_INVESTED_SYMBOL {
                checked.total_invested = quantity;
                continue;
            }

            let category = settings.classify(&symbol);
            checked
                .holdings
                .entry(symbol.clone())
                .and_modify(|h| h.quantity += quantity)
                .or_insert_with(|| Holding::new(symbol, quantity, category));
        }

        if checked.holdings.is_empty() {
            return Err(CoreError::EmptyHoldings);
        }
        Ok(checked)
    }

    /// Price every holding and build the wallet.
    ///
    /// Crypto and stablecoins go through the spot provider; fiat equal to
    /// the report currency passes through 1:1; other fiat is converted
    /// via a forex pair. Holdings that cannot be priced are reported and
    /// skipped. A wallet where nothing priced is fatal.
    pub async fn calc_value(
        &self,
        checked: CheckedInput,
        settings: &Settings,
        prices: &PriceService,
    ) -> Result<ValuationOutcome, CoreError> {
        let CheckedInput {
            holdings,
            total_invested,
            mut issues,
        } = checked;

        let currency = settings.currency.to_uppercase();

        let to_price: Vec<String> = holdings
            .values()
            .filter(|h| h.category != AssetCategory::Fiat)
            .map(|h| h.symbol.clone())
            .collect();
        let batch = if to_price.is_empty() {
            PriceBatch::default()
        } else {
            prices.spot_prices(&to_price, &currency).await?
        };

        for symbol in &batch.unresolved {
            issues.push(SymbolIssue {
                symbol: symbol.clone(),
                reason: IssueReason::Unresolved,
            });
        }
        for symbol in &batch.missing {
            issues.push(SymbolIssue {
                symbol: symbol.clone(),
                reason: IssueReason::PriceMissing,
            });
        }

        // Whole seconds: the log's date format has no sub-second
        // precision, and replayed records must compare equal.
        let now = chrono::Local::now().naive_local();
        let mut wallet = Wallet::new(currency.clone(), now.with_nanosecond(0).unwrap_or(now));
        wallet.total_invested = total_invested;

        for holding in holdings.values() {
            let value = match holding.category {
                AssetCategory::Crypto | AssetCategory::Stable => {
                    match batch.prices.get(&holding.symbol) {
                        Some(price) => round_cents(price * holding.quantity),
                        // Already reported via unresolved/missing.
                        None => continue,
                    }
                }
                AssetCategory::Fiat => {
                    if holding.symbol.eq_ignore_ascii_case(&currency) {
                        round_cents(holding.quantity)
                    } else {
                        match prices.fx_rate(&currency, &holding.symbol).await {
                            Ok(rate) if rate > 0.0 => round_cents(holding.quantity / rate),
                            Ok(rate) => {
                                warn!(
                                    "unusable exchange rate {rate} for {currency}/{}",
                                    holding.symbol
                                );
                                issues.push(SymbolIssue {
                                    symbol: holding.symbol.clone(),
                                    reason: IssueReason::FxFailed,
                                });
                                continue;
                            }
                            Err(e) => {
                                warn!(
                                    "exchange rate lookup failed for {currency}/{} ({e})",
                                    holding.symbol
                                );
                                issues.push(SymbolIssue {
                                    symbol: holding.symbol.clone(),
                                    reason: IssueReason::FxFailed,
                                });
                                continue;
                            }
                        }
                    }
                }
            };

            wallet.total_value += value;
            if holding.category != AssetCategory::Fiat {
                wallet.total_crypto_stable += value;
            }
            wallet.assets.insert(
                holding.symbol.to_uppercase(),
                WalletAsset {
                    quantity: holding.quantity,
                    value,
                    category: holding.category,
                },
            );
        }

        if wallet.assets.is_empty() {
            return Err(CoreError::NoPrices);
        }
        wallet.total_value = round_cents(wallet.total_value);
        wallet.total_crypto_stable = round_cents(wallet.total_crypto_stable);

        info!(
            "valued {} assets at {} {}",
            wallet.assets.len(),
            wallet.total_value,
            wallet.currency
        );
        Ok(ValuationOutcome { wallet, issues })
    }
}

/// Wallet arithmetic keeps two decimals, like any statement would.
fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
