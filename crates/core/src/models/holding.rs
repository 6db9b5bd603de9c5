use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::movement::{normalize_ticker, Lot};

/// Current snapshot of one ticker, supplied by the caller as the truth
/// about what is held today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingPosition {
    /// Ticker symbol, uppercased
    pub ticker: String,

    /// Free-form asset-class label (e.g. "Ações", "FIIs", "Renda Fixa").
    /// Missing labels are bucketed under the unknown class.
    #[serde(default)]
    pub asset_class: Option<String>,

    /// Units currently held
    pub quantity: f64,

    /// Latest market price per unit
    pub current_price: f64,
}

impl HoldingPosition {
    pub fn new(
        ticker: impl Into<String>,
        asset_class: impl Into<String>,
        quantity: f64,
        current_price: f64,
    ) -> Self {
        Self {
            ticker: normalize_ticker(&ticker.into()),
            asset_class: Some(asset_class.into()),
            quantity,
            current_price,
        }
    }

    /// `quantity * current_price`, or 0 when either side is not finite.
    pub fn total_value(&self) -> f64 {
        let value = self.quantity * self.current_price;
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}

/// FIFO cost basis of one ticker.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CostBasisResult {
    /// Units left after every sell consumed the oldest lots
    pub remaining_quantity: f64,

    /// `total_invested / remaining_quantity`, `None` when nothing is held
    pub average_unit_price: Option<f64>,

    /// Cost of the remaining lots (Σ quantity × unit price)
    pub total_invested: f64,

    /// Profit locked in by sells: Σ (sell price − lot price) × consumed units
    pub realized_gain: f64,

    /// Sell quantity that found no open lot and was ignored
    pub discarded_sell_quantity: f64,

    /// Remaining open lots, oldest first
    pub open_lots: Vec<Lot>,
}

/// Valuation of a single holding, combining the snapshot with its FIFO
/// cost basis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingSummary {
    pub ticker: String,

    /// Canonical display label of the holding's asset class
    pub asset_class: String,

    /// Units held according to the snapshot
    pub quantity: f64,

    pub current_price: f64,

    /// `quantity * current_price`
    pub total_value: f64,

    /// Share of the portfolio total, in percent
    pub allocation_pct: f64,

    /// Units left according to the FIFO reconstruction
    pub remaining_quantity: f64,

    pub average_unit_price: Option<f64>,

    pub total_invested: f64,

    pub realized_gain: f64,

    /// `(current_price − average) × remaining_quantity`
    pub unrealized_gain_abs: Option<f64>,

    /// `(current_price − average) / average × 100`
    pub unrealized_gain_pct: Option<f64>,

    /// Snapshot quantity minus FIFO remaining quantity
    pub quantity_drift: f64,
}

/// Invested vs current value of one asset class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassPerformance {
    pub asset_class: String,

    /// Σ average price × snapshot quantity over holdings with a known average
    pub invested: f64,

    /// Σ current price × snapshot quantity over the same holdings
    pub current: f64,

    /// `(current − invested) / invested × 100`, `None` when nothing is invested
    pub return_pct: Option<f64>,
}

/// Output of the position aggregator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionSummary {
    /// One entry per holding, in input order
    pub per_holding: Vec<HoldingSummary>,

    /// Total value per asset class
    pub per_class: BTreeMap<String, f64>,

    /// Return per asset class
    pub class_performance: Vec<ClassPerformance>,

    /// Σ of all holdings' total value
    pub portfolio_total: f64,
}
