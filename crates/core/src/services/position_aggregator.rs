use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::models::asset_class::ClassCatalog;
use crate::models::holding::{
    ClassPerformance, HoldingPosition, HoldingSummary, PositionSummary,
};
use crate::models::movement::{normalize_ticker, Movement};
use crate::services::lot_matcher::LotMatcher;

/// Drift below this is float noise, not a real mismatch.
const DRIFT_EPSILON: f64 = 1e-9;

/// Combines the caller's holdings snapshot with FIFO cost basis into
/// per-holding and per-class valuations.
pub struct PositionAggregator {
    lot_matcher: LotMatcher,
    unknown_class_label: String,
}

impl PositionAggregator {
    pub fn new(unknown_class_label: impl Into<String>) -> Self {
        Self {
            lot_matcher: LotMatcher::new(),
            unknown_class_label: unknown_class_label.into(),
        }
    }

    /// Build the position summary.
    ///
    /// `movements_by_ticker` may use any ticker casing; lookups are done on
    /// the trimmed, uppercased symbol. Holdings without movements get no
    /// average price and zero invested. Snapshot rows sharing a ticker are
    /// merged into one holding: quantities add up, the first row's class
    /// and price are kept.
    pub fn summarize(
        &self,
        holdings: &[HoldingPosition],
        movements_by_ticker: &HashMap<String, Vec<Movement>>,
    ) -> PositionSummary {
        // Keys differing only in casing share one history
        let mut movements: HashMap<String, Vec<Movement>> = HashMap::new();
        let mut sources: Vec<(&String, &Vec<Movement>)> = movements_by_ticker.iter().collect();
        sources.sort_by(|a, b| a.0.cmp(b.0));
        for (ticker, list) in sources {
            movements
                .entry(normalize_ticker(ticker))
                .or_default()
                .extend(list.iter().cloned());
        }

        let holdings = merge_duplicate_tickers(holdings);

        let mut catalog = ClassCatalog::new(self.unknown_class_label.clone());
        let mut per_holding = Vec::with_capacity(holdings.len());
        let mut per_class: BTreeMap<String, f64> = BTreeMap::new();
        let mut performance: BTreeMap<String, (f64, f64)> = BTreeMap::new();
        let mut portfolio_total = 0.0;

        // 1. Per-holding valuation
        for holding in &holdings {
            let ticker = normalize_ticker(&holding.ticker);
            let asset_class = catalog.resolve(holding.asset_class.as_deref());
            let total_value = holding.total_value();
            portfolio_total += total_value;
            *per_class.entry(asset_class.clone()).or_insert(0.0) += total_value;

            let basis = movements
                .get(&ticker)
                .map(|list| self.lot_matcher.compute_cost_basis(list))
                .unwrap_or_default();

            let (unrealized_gain_abs, unrealized_gain_pct) = match basis.average_unit_price {
                Some(avg) if basis.remaining_quantity > 0.0 && avg > 0.0 => {
                    let delta = holding.current_price - avg;
                    (
                        finite(delta * basis.remaining_quantity),
                        finite(delta / avg * 100.0),
                    )
                }
                Some(avg) if basis.remaining_quantity > 0.0 => {
                    // Zero-cost lots: absolute gain is defined, percentage is not
                    (finite((holding.current_price - avg) * basis.remaining_quantity), None)
                }
                _ => (None, None),
            };

            let quantity = finite(holding.quantity).unwrap_or(0.0);
            let current_price = finite(holding.current_price).unwrap_or(0.0);
            let quantity_drift = finite(holding.quantity - basis.remaining_quantity).unwrap_or(0.0);
            if quantity_drift.abs() > DRIFT_EPSILON && basis.remaining_quantity > 0.0 {
                debug!(
                    ticker = %ticker,
                    snapshot = holding.quantity,
                    fifo = basis.remaining_quantity,
                    "snapshot quantity differs from movement history"
                );
            }

            let entry = performance
                .entry(asset_class.clone())
                .or_insert((0.0, 0.0));
            // Only finitely priced holdings count towards the class return
            let invested = basis.average_unit_price.and_then(|avg| finite(avg * holding.quantity));
            let current = finite(holding.current_price * holding.quantity);
            if let (Some(invested), Some(current)) = (invested, current) {
                entry.0 += invested;
                entry.1 += current;
            }

            per_holding.push(HoldingSummary {
                ticker,
                asset_class,
                quantity,
                current_price,
                total_value,
                allocation_pct: 0.0, // filled below
                remaining_quantity: basis.remaining_quantity,
                average_unit_price: basis.average_unit_price,
                total_invested: basis.total_invested,
                realized_gain: basis.realized_gain,
                unrealized_gain_abs,
                unrealized_gain_pct,
                quantity_drift,
            });
        }

        // 2. Allocation against the final total
        for summary in &mut per_holding {
            summary.allocation_pct = percent_of(summary.total_value, portfolio_total);
        }

        // 3. Per-class return
        let class_performance = performance
            .into_iter()
            .map(|(asset_class, (invested, current))| ClassPerformance {
                asset_class,
                invested: finite(invested).unwrap_or(0.0),
                current: finite(current).unwrap_or(0.0),
                return_pct: if invested > 0.0 {
                    finite((current - invested) / invested * 100.0)
                } else {
                    None
                },
            })
            .collect();

        PositionSummary {
            per_holding,
            per_class,
            class_performance,
            portfolio_total,
        }
    }
}

impl Default for PositionAggregator {
    fn default() -> Self {
        Self::new("Unknown")
    }
}

/// Collapse snapshot rows that share a normalized ticker, keeping the
/// order in which tickers first appear.
fn merge_duplicate_tickers(holdings: &[HoldingPosition]) -> Vec<HoldingPosition> {
    let mut merged: Vec<HoldingPosition> = Vec::with_capacity(holdings.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    for holding in holdings {
        let ticker = normalize_ticker(&holding.ticker);
        match index.get(&ticker) {
            Some(&i) => {
                debug!(ticker = %ticker, "merging duplicate snapshot row");
                merged[i].quantity += holding.quantity;
            }
            None => {
                index.insert(ticker.clone(), merged.len());
                merged.push(HoldingPosition {
                    ticker,
                    ..holding.clone()
                });
            }
        }
    }
    merged
}

/// `part / whole × 100`, 0 when the whole is not positive.
pub(crate) fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        let pct = part / whole * 100.0;
        if pct.is_finite() {
            pct
        } else {
            0.0
        }
    } else {
        0.0
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}
