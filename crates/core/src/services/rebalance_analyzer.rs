use chrono::NaiveDate;
use std::collections::BTreeMap;

use tracing::debug;

use crate::models::asset_class::canonical_key;
use crate::models::rebalance::{
    ClassSummary, RebalanceReport, RebalanceTargetConfig, SuggestedAction,
};
use crate::services::position_aggregator::percent_of;

/// Tolerance when checking that the target weights add up to 100.
const TARGET_SUM_TOLERANCE: f64 = 0.01;

/// Compares the current per-class allocation with the user's target
/// weights and works out what to buy or sell, and when.
pub struct RebalanceAnalyzer {
    noise_threshold_pct: f64,
}

/// One row of the merged class set while it is being assembled.
struct ClassRow {
    label: String,
    current_value: f64,
    target_weight_pct: f64,
}

impl RebalanceAnalyzer {
    pub fn new(noise_threshold_pct: f64) -> Self {
        Self { noise_threshold_pct }
    }

    /// Analyze the allocation as of `as_of`.
    ///
    /// The class set is the union of `per_class` and the target keys,
    /// matched through their canonical key; the holdings' label wins for
    /// display. Classes held but not targeted get a 0% target.
    pub fn analyze(
        &self,
        per_class: &BTreeMap<String, f64>,
        portfolio_total: f64,
        targets: &RebalanceTargetConfig,
        as_of: NaiveDate,
    ) -> RebalanceReport {
        let total = if portfolio_total.is_finite() { portfolio_total } else { 0.0 };
        let rows = Self::merge_classes(per_class, &targets.targets);
        let has_targets = !targets.targets.is_empty();

        let summaries: Vec<ClassSummary> = rows
            .into_values()
            .map(|row| self.summarize_class(row, total, has_targets))
            .collect();

        let suggestions: Vec<ClassSummary> = summaries
            .iter()
            .filter(|s| s.suggested_action != SuggestedAction::Hold)
            .cloned()
            .collect();

        let next_due_date = match targets.last_rebalance_date {
            Some(last) => targets.period.advance(last),
            None => as_of,
        };
        let is_due = has_targets && as_of >= next_due_date;
        if !has_targets {
            debug!("no rebalance targets configured, nothing is due");
        }

        let targets_total_pct = targets.total_pct();

        RebalanceReport {
            summaries,
            is_due,
            next_due_date,
            days_until_next: (next_due_date - as_of).num_days(),
            suggestions,
            targets_total_pct,
            targets_sum_ok: (targets_total_pct - 100.0).abs() <= TARGET_SUM_TOLERANCE,
        }
    }

    fn summarize_class(&self, row: ClassRow, total: f64, has_targets: bool) -> ClassSummary {
        let current_weight_pct = percent_of(row.current_value, total);
        let deviation_pct = row.target_weight_pct - current_weight_pct;
        let suggested_amount = deviation_pct / 100.0 * total;

        let suggested_action = if !has_targets || deviation_pct.abs() < self.noise_threshold_pct {
            SuggestedAction::Hold
        } else if deviation_pct > 0.0 {
            SuggestedAction::Buy
        } else {
            SuggestedAction::Sell
        };

        ClassSummary {
            asset_class: row.label,
            current_value: row.current_value,
            current_weight_pct,
            target_weight_pct: row.target_weight_pct,
            deviation_pct,
            suggested_action,
            suggested_amount: if suggested_amount.is_finite() { suggested_amount } else { 0.0 },
        }
    }

    /// Union of held and targeted classes, keyed by canonical key.
    fn merge_classes(
        per_class: &BTreeMap<String, f64>,
        targets: &BTreeMap<String, f64>,
    ) -> BTreeMap<String, ClassRow> {
        let mut rows: BTreeMap<String, ClassRow> = BTreeMap::new();

        for (label, value) in per_class {
            let value = if value.is_finite() { *value } else { 0.0 };
            rows.entry(canonical_key(label))
                .or_insert_with(|| ClassRow {
                    label: label.trim().to_string(),
                    current_value: 0.0,
                    target_weight_pct: 0.0,
                })
                .current_value += value;
        }

        for (label, weight) in targets {
            if label.trim().is_empty() {
                continue;
            }
            let weight = if weight.is_finite() { *weight } else { 0.0 };
            rows.entry(canonical_key(label))
                .or_insert_with(|| ClassRow {
                    label: label.trim().to_string(),
                    current_value: 0.0,
                    target_weight_pct: 0.0,
                })
                .target_weight_pct += weight;
        }

        rows
    }
}

impl Default for RebalanceAnalyzer {
    fn default() -> Self {
        Self::new(0.1)
    }
}
