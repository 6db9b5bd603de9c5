use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::CoreError;
use crate::models::dashboard::DashboardInput;
use crate::models::holding::HoldingPosition;
use crate::models::movement::{normalize_ticker, parse_date, Movement, RawMovement};
use crate::models::projection::{DividendEvent, ProjectionParams, RawDividendEvent, SeriesPoint};
use crate::models::rebalance::{RebalancePeriod, RebalanceTargetConfig};

/// Target configuration exactly as it is stored by the settings
/// collaborator: period as a label, last rebalance as a timestamp string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTargetConfig {
    #[serde(default)]
    pub period: Option<String>,

    #[serde(default)]
    pub targets: BTreeMap<String, f64>,

    #[serde(default)]
    pub last_rebalance_date: Option<String>,
}

/// A dashboard request as it arrives over JSON.
///
/// Ledger and dividend rows are kept as untyped JSON values so that one
/// unreadable row is dropped on its own instead of failing the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDashboardInput {
    pub as_of: NaiveDate,

    pub holdings: Vec<HoldingPosition>,

    #[serde(default)]
    pub movements: Vec<Value>,

    #[serde(default)]
    pub targets: RawTargetConfig,

    #[serde(default)]
    pub monthly_series: Vec<SeriesPoint>,

    #[serde(default)]
    pub dividend_events: Vec<Value>,

    #[serde(default)]
    pub projection: ProjectionParams,
}

/// Turns collaborator payloads into the engine's typed inputs.
///
/// Bad rows are dropped, never reported as errors; the only failure is an
/// unknown rebalance period label.
pub struct IngestService;

impl IngestService {
    pub fn new() -> Self {
        Self
    }

    /// Validate raw movements, dropping malformed rows.
    /// Surviving movements keep their input order.
    pub fn ingest_movements(&self, raw: Vec<RawMovement>) -> Vec<Movement> {
        let received = raw.len();
        let movements: Vec<Movement> = raw.into_iter().filter_map(RawMovement::into_movement).collect();
        if movements.len() < received {
            debug!(
                received,
                kept = movements.len(),
                "dropped malformed movements at ingestion"
            );
        }
        movements
    }

    /// Validate untyped ledger rows. Rows that do not even have the shape
    /// of a movement (e.g. a quantity given as text) are dropped too.
    pub fn ingest_movement_rows(&self, rows: Vec<Value>) -> Vec<Movement> {
        self.ingest_movements(read_rows("movement", rows))
    }

    /// Validate untyped dividend rows, dropping unreadable ones.
    pub fn ingest_dividend_rows(&self, rows: Vec<Value>) -> Vec<DividendEvent> {
        let received = rows.len();
        let events: Vec<DividendEvent> = read_rows::<RawDividendEvent>("dividend", rows)
            .into_iter()
            .filter_map(RawDividendEvent::into_event)
            .collect();
        if events.len() < received {
            debug!(
                received,
                kept = events.len(),
                "dropped malformed dividend events at ingestion"
            );
        }
        events
    }

    /// Convert a JSON dashboard request into typed engine input.
    /// Only an unknown rebalance period label is an error.
    pub fn ingest_dashboard(&self, raw: RawDashboardInput) -> Result<DashboardInput, CoreError> {
        Ok(DashboardInput {
            as_of: raw.as_of,
            holdings: raw.holdings,
            movements: self.ingest_movement_rows(raw.movements),
            targets: self.ingest_targets(raw.targets)?,
            monthly_series: raw.monthly_series,
            dividend_events: self.ingest_dividend_rows(raw.dividend_events),
            projection: raw.projection,
        })
    }

    /// Group movements by their normalized ticker, keeping input order.
    pub fn group_by_ticker(&self, movements: Vec<Movement>) -> HashMap<String, Vec<Movement>> {
        let mut grouped: HashMap<String, Vec<Movement>> = HashMap::new();
        for movement in movements {
            grouped
                .entry(normalize_ticker(&movement.ticker))
                .or_default()
                .push(movement);
        }
        grouped
    }

    /// Convert a stored target configuration.
    ///
    /// A missing period defaults to monthly; an unparseable last-rebalance
    /// date is treated as absent (the portfolio is then immediately due).
    pub fn ingest_targets(&self, raw: RawTargetConfig) -> Result<RebalanceTargetConfig, CoreError> {
        let period = match raw.period.as_deref() {
            Some(label) if !label.trim().is_empty() => RebalancePeriod::parse(label)?,
            _ => RebalancePeriod::default(),
        };

        let last_rebalance_date = raw.last_rebalance_date.as_deref().and_then(|s| {
            let parsed = parse_date(s);
            if parsed.is_none() {
                debug!(value = s, "ignoring unparseable last rebalance date");
            }
            parsed
        });

        let targets = raw
            .targets
            .into_iter()
            .filter(|(label, weight)| !label.trim().is_empty() && weight.is_finite())
            .collect();

        Ok(RebalanceTargetConfig {
            period,
            targets,
            last_rebalance_date,
        })
    }
}

impl Default for IngestService {
    fn default() -> Self {
        Self::new()
    }
}

fn read_rows<T: DeserializeOwned>(what: &'static str, rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!(kind = what, error = %e, "skipping unreadable row");
                None
            }
        })
        .collect()
}
