use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::holding::{HoldingPosition, PositionSummary};
use super::movement::Movement;
use super::projection::{DividendEvent, ProjectionParams, ProjectionReport, SeriesPoint};
use super::rebalance::{RebalanceReport, RebalanceTargetConfig};

/// Everything one dashboard refresh feeds into the engine, already typed.
///
/// JSON requests arrive as `RawDashboardInput` and are converted by the
/// ingest service, which drops malformed ledger and dividend rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardInput {
    /// Date the analysis is made for (usually today)
    pub as_of: NaiveDate,

    /// Current holdings snapshot
    pub holdings: Vec<HoldingPosition>,

    /// Movements of every ticker, in any order
    #[serde(default)]
    pub movements: Vec<Movement>,

    #[serde(default)]
    pub targets: RebalanceTargetConfig,

    /// Month-end portfolio values, oldest first
    #[serde(default)]
    pub monthly_series: Vec<SeriesPoint>,

    #[serde(default)]
    pub dividend_events: Vec<DividendEvent>,

    #[serde(default)]
    pub projection: ProjectionParams,
}

/// View-models produced from one [`DashboardInput`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub as_of: NaiveDate,
    pub positions: PositionSummary,
    pub rebalance: RebalanceReport,
    pub projection: ProjectionReport,
}
