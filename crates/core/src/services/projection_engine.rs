use tracing::debug;

use crate::models::projection::{
    DividendEvent, GrowthEstimate, ProjectionParams, ProjectionPoint, ProjectionReport,
    ProjectionYearRow, SeriesPoint,
};
use crate::models::settings::EngineSettings;

/// Longest horizon the simulation will run, in years.
pub const MAX_PROJECTION_YEARS: u32 = 100;

/// Average length of a calendar month in days.
const DAYS_PER_MONTH: f64 = 365.25 / 12.0;

/// Projects portfolio value forward month by month.
///
/// Growth is estimated from historical month-end values, dividends from
/// the payments received, and both are compounded over the horizon.
pub struct ProjectionEngine {
    min_annual_growth: f64,
    max_annual_growth: f64,
    growth_floor: f64,
    fallback_annual_growth: f64,
}

impl ProjectionEngine {
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            min_annual_growth: settings.min_annual_growth,
            max_annual_growth: settings.max_annual_growth,
            growth_floor: settings.growth_floor,
            fallback_annual_growth: settings.fallback_annual_growth,
        }
    }

    /// Run a projection.
    ///
    /// `current_total` is the starting value whenever `params` carries no
    /// usable one (absent, non-finite or not positive).
    pub fn project(
        &self,
        monthly_series: &[SeriesPoint],
        dividend_events: &[DividendEvent],
        params: &ProjectionParams,
        current_total: f64,
    ) -> ProjectionReport {
        let growth = self.estimate_growth(monthly_series);
        let dividend_run_rate = Self::dividend_run_rate(dividend_events);

        let starting_value = params
            .starting_value
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(if current_total.is_finite() { current_total } else { 0.0 });

        let years = params.years.min(MAX_PROJECTION_YEARS);
        let points = Self::simulate(
            starting_value,
            growth.annual_growth,
            dividend_run_rate,
            params.include_dividends,
            params.monthly_contribution.unwrap_or(0.0),
            years * 12,
        );
        let yearly = Self::yearly_rows(&points, years);

        ProjectionReport {
            growth,
            dividend_run_rate,
            starting_value,
            points,
            yearly,
        }
    }

    /// Estimate annual growth from month-end values.
    ///
    /// Only finite, strictly positive values count; gaps are skipped, not
    /// interpolated. Returns between consecutive valid points are averaged
    /// arithmetically and annualized as `(1 + mean)^12 − 1`, then clamped
    /// and floored.
    pub fn estimate_growth(&self, monthly_series: &[SeriesPoint]) -> GrowthEstimate {
        let values: Vec<f64> = monthly_series.iter().filter_map(SeriesPoint::valid_value).collect();
        if values.len() < monthly_series.len() {
            debug!(
                skipped = monthly_series.len() - values.len(),
                "ignoring gaps and non-positive points in monthly series"
            );
        }

        let returns: Vec<f64> = values
            .windows(2)
            .map(|pair| (pair[1] - pair[0]) / pair[0])
            .filter(|r| r.is_finite())
            .collect();

        if values.len() < 2 || returns.is_empty() {
            debug!(valid_points = values.len(), "insufficient history for growth estimate");
            return GrowthEstimate {
                annual_growth: self.fallback_annual_growth,
                mean_monthly_return: 0.0,
                valid_points: values.len(),
                insufficient_history: true,
            };
        }

        let mean_monthly_return = returns.iter().sum::<f64>() / returns.len() as f64;
        let annualized = (1.0 + mean_monthly_return).powi(12) - 1.0;
        let annual_growth = if annualized.is_finite() {
            annualized
                .max(self.min_annual_growth)
                .min(self.max_annual_growth)
                .max(self.growth_floor)
        } else {
            self.fallback_annual_growth
        };

        GrowthEstimate {
            annual_growth,
            mean_monthly_return,
            valid_points: values.len(),
            insufficient_history: false,
        }
    }

    /// Average monthly dividend amount over the span of the payments.
    ///
    /// `total / max(1, round(months between first and last) + 1)`.
    pub fn dividend_run_rate(dividend_events: &[DividendEvent]) -> f64 {
        let valid: Vec<&DividendEvent> = dividend_events
            .iter()
            .filter(|e| e.amount.is_finite())
            .collect();

        let (Some(first), Some(last)) = (
            valid.iter().map(|e| e.date).min(),
            valid.iter().map(|e| e.date).max(),
        ) else {
            return 0.0;
        };

        let total: f64 = valid.iter().map(|e| e.amount).sum();
        let months_between = (last - first).num_days() as f64 / DAYS_PER_MONTH;
        let months_spanned = (months_between.round() + 1.0).max(1.0);
        total / months_spanned
    }

    fn simulate(
        starting_value: f64,
        annual_growth: f64,
        dividend_run_rate: f64,
        include_dividends: bool,
        monthly_contribution: f64,
        months: u32,
    ) -> Vec<ProjectionPoint> {
        let monthly_rate = annual_growth / 12.0;
        let monthly_rate = if monthly_rate.is_finite() { monthly_rate } else { 0.0 };
        let dividend = if dividend_run_rate.is_finite() { dividend_run_rate } else { 0.0 };
        let contribution = if monthly_contribution.is_finite() && monthly_contribution > 0.0 {
            monthly_contribution
        } else {
            0.0
        };

        let mut value_no_dividends = starting_value;
        let mut value_with_dividends = starting_value;
        let mut cumulative_dividends = 0.0;
        let mut points = Vec::with_capacity(months as usize + 1);

        for month_index in 0..=months {
            points.push(ProjectionPoint {
                month_index,
                value_no_dividends,
                value_with_dividends,
                cumulative_dividends,
            });

            if month_index == months {
                break;
            }

            let growth = value_no_dividends * monthly_rate;
            let growth = if growth.is_finite() { growth } else { 0.0 };
            value_no_dividends = last_finite(value_no_dividends + growth, value_no_dividends);

            if include_dividends {
                cumulative_dividends = last_finite(cumulative_dividends + dividend, cumulative_dividends);
                value_with_dividends =
                    last_finite(value_with_dividends + growth + dividend, value_with_dividends);
            } else {
                value_with_dividends = value_no_dividends;
            }

            // Contributions land after this month's growth
            if contribution > 0.0 {
                value_no_dividends = last_finite(value_no_dividends + contribution, value_no_dividends);
                value_with_dividends =
                    last_finite(value_with_dividends + contribution, value_with_dividends);
            }
        }

        points
    }

    fn yearly_rows(points: &[ProjectionPoint], years: u32) -> Vec<ProjectionYearRow> {
        (1..=years)
            .filter_map(|year| {
                let point = points.get((year * 12) as usize)?;
                Some(ProjectionYearRow {
                    year,
                    value_no_dividends: point.value_no_dividends,
                    value_with_dividends: point.value_with_dividends,
                    cumulative_dividends: point.cumulative_dividends,
                    dividend_difference: point.value_with_dividends - point.value_no_dividends,
                })
            })
            .collect()
    }
}

impl Default for ProjectionEngine {
    fn default() -> Self {
        Self::new(&EngineSettings::default())
    }
}

fn last_finite(candidate: f64, previous: f64) -> f64 {
    if candidate.is_finite() {
        candidate
    } else {
        previous
    }
}
