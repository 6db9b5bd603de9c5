use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::movement::parse_date;

/// One month-end value of the historical portfolio series.
///
/// `value` is optional because the history collaborator leaves gaps for
/// months it could not price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Month label, e.g. "2024-03"
    pub label: String,

    #[serde(default)]
    pub value: Option<f64>,
}

impl SeriesPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value: Some(value),
        }
    }

    pub fn gap(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: None,
        }
    }

    /// The value, if it is finite and strictly positive.
    pub fn valid_value(&self) -> Option<f64> {
        self.value.filter(|v| v.is_finite() && *v > 0.0)
    }
}

/// A dated value (e.g. a daily close) before monthly resampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedValue {
    pub date: NaiveDate,
    pub value: f64,
}

/// One dividend payment received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendEvent {
    pub date: NaiveDate,
    pub amount: f64,
}

impl DividendEvent {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }
}

/// A dividend payment as the history collaborator delivers it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDividendEvent {
    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub amount: Option<f64>,
}

impl RawDividendEvent {
    /// `None` when the date does not parse or the amount is missing or
    /// not finite.
    pub fn into_event(self) -> Option<DividendEvent> {
        let date = parse_date(self.date.as_deref()?)?;
        let amount = self.amount.filter(|a| a.is_finite())?;
        Some(DividendEvent::new(date, amount))
    }
}

/// Knobs of a projection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionParams {
    /// Projection horizon in years
    pub years: u32,

    /// Starting value; the current portfolio total is used when absent
    #[serde(default)]
    pub starting_value: Option<f64>,

    /// Whether the dividend run-rate is added to the second value track
    #[serde(default = "default_include_dividends")]
    pub include_dividends: bool,

    /// Amount added to both tracks at the end of every month
    #[serde(default)]
    pub monthly_contribution: Option<f64>,
}

fn default_include_dividends() -> bool {
    true
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            years: 5,
            starting_value: None,
            include_dividends: true,
            monthly_contribution: None,
        }
    }
}

/// One simulated month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    /// Month number, 0 being the starting point
    pub month_index: u32,

    pub value_no_dividends: f64,

    pub value_with_dividends: f64,

    pub cumulative_dividends: f64,
}

/// How the annual growth rate was derived from history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthEstimate {
    /// Growth used by the simulation (after clamping and flooring)
    pub annual_growth: f64,

    /// Arithmetic mean of month-over-month returns (0 without history)
    pub mean_monthly_return: f64,

    /// Number of finite, strictly positive points in the series
    pub valid_points: usize,

    /// Fewer than two valid points; the caller should warn the user
    pub insufficient_history: bool,
}

/// Year-end row of the projection table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionYearRow {
    /// 1-based year number
    pub year: u32,

    pub value_no_dividends: f64,

    pub value_with_dividends: f64,

    pub cumulative_dividends: f64,

    /// `value_with_dividends − value_no_dividends`
    pub dividend_difference: f64,
}

/// Full output of the projection engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionReport {
    pub growth: GrowthEstimate,

    /// Average monthly dividend amount derived from history
    pub dividend_run_rate: f64,

    /// Value the simulation started from
    pub starting_value: f64,

    /// `years * 12 + 1` points, index 0 being the starting point
    pub points: Vec<ProjectionPoint>,

    /// One row per projected year
    pub yearly: Vec<ProjectionYearRow>,
}

impl ProjectionReport {
    pub fn final_point(&self) -> Option<&ProjectionPoint> {
        self.points.last()
    }

    pub fn final_value_no_dividends(&self) -> f64 {
        self.final_point().map_or(0.0, |p| p.value_no_dividends)
    }

    pub fn final_value_with_dividends(&self) -> f64 {
        self.final_point().map_or(0.0, |p| p.value_with_dividends)
    }

    pub fn total_dividends(&self) -> f64 {
        self.final_point().map_or(0.0, |p| p.cumulative_dividends)
    }
}
