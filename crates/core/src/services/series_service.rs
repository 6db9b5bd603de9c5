use std::collections::BTreeMap;

use chrono::Datelike;

use crate::models::projection::{DatedValue, SeriesPoint};

/// Helpers that prepare historical series for comparison charts and for
/// the projection engine.
pub struct SeriesService;

impl SeriesService {
    pub fn new() -> Self {
        Self
    }

    /// Rebase a series so its first valid point equals 100.
    ///
    /// Gaps and non-positive values become `None`. If the series has no
    /// valid point every value becomes `None`.
    pub fn rebase_100(&self, series: &[SeriesPoint]) -> Vec<SeriesPoint> {
        let base = series.iter().find_map(SeriesPoint::valid_value);
        series
            .iter()
            .map(|point| SeriesPoint {
                label: point.label.clone(),
                value: base.and_then(|b| point.valid_value().map(|v| v / b * 100.0)),
            })
            .collect()
    }

    /// Keep the last value of every calendar month, labelled `YYYY-MM`,
    /// in ascending month order. Non-finite values are skipped.
    pub fn monthly_last_values(&self, points: &[DatedValue]) -> Vec<SeriesPoint> {
        let mut ordered: Vec<&DatedValue> = points.iter().filter(|p| p.value.is_finite()).collect();
        ordered.sort_by_key(|p| p.date);

        let mut by_month: BTreeMap<(i32, u32), f64> = BTreeMap::new();
        for point in ordered {
            by_month.insert((point.date.year(), point.date.month()), point.value);
        }

        by_month
            .into_iter()
            .map(|((year, month), value)| SeriesPoint::new(format!("{year:04}-{month:02}"), value))
            .collect()
    }

    /// Growth from the first to the last valid value, in percent.
    /// Returns 0 when fewer than two valid values exist.
    pub fn total_growth_pct(&self, series: &[SeriesPoint]) -> f64 {
        let mut valid = series.iter().filter_map(SeriesPoint::valid_value);
        let Some(first) = valid.next() else {
            return 0.0;
        };
        match valid.last() {
            Some(last) => (last - first) / first * 100.0,
            None => 0.0,
        }
    }
}

impl Default for SeriesService {
    fn default() -> Self {
        Self::new()
    }
}
