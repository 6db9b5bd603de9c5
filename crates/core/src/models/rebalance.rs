use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::CoreError;

/// How often the user intends to rebalance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebalancePeriod {
    #[default]
    Monthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl RebalancePeriod {
    /// Calendar months between two rebalances.
    pub fn months(&self) -> u32 {
        match self {
            RebalancePeriod::Monthly => 1,
            RebalancePeriod::Quarterly => 3,
            RebalancePeriod::Semiannual => 6,
            RebalancePeriod::Annual => 12,
        }
    }

    /// `from` shifted forward by one period. Day-of-month is clamped to the
    /// end of shorter months (Jan 31 + 1 month = Feb 28/29).
    pub fn advance(&self, from: NaiveDate) -> NaiveDate {
        from.checked_add_months(Months::new(self.months()))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Parse a period label (English or Portuguese, case-insensitive).
    pub fn parse(label: &str) -> Result<Self, CoreError> {
        match label.trim().to_lowercase().as_str() {
            "monthly" | "mensal" => Ok(RebalancePeriod::Monthly),
            "quarterly" | "trimestral" => Ok(RebalancePeriod::Quarterly),
            "semiannual" | "semestral" => Ok(RebalancePeriod::Semiannual),
            "annual" | "anual" => Ok(RebalancePeriod::Annual),
            _ => Err(CoreError::InvalidPeriod(label.to_string())),
        }
    }
}

impl std::fmt::Display for RebalancePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RebalancePeriod::Monthly => write!(f, "monthly"),
            RebalancePeriod::Quarterly => write!(f, "quarterly"),
            RebalancePeriod::Semiannual => write!(f, "semiannual"),
            RebalancePeriod::Annual => write!(f, "annual"),
        }
    }
}

impl std::str::FromStr for RebalancePeriod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// User-owned target allocation. Persisted elsewhere; read-only here.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RebalanceTargetConfig {
    #[serde(default)]
    pub period: RebalancePeriod,

    /// Asset class → target weight in percent. Expected to sum to 100,
    /// not enforced.
    #[serde(default)]
    pub targets: BTreeMap<String, f64>,

    #[serde(default)]
    pub last_rebalance_date: Option<NaiveDate>,
}

impl RebalanceTargetConfig {
    pub fn new(period: RebalancePeriod) -> Self {
        Self {
            period,
            targets: BTreeMap::new(),
            last_rebalance_date: None,
        }
    }

    /// Builder-style helper to add one target weight.
    pub fn with_target(mut self, asset_class: impl Into<String>, weight_pct: f64) -> Self {
        self.targets.insert(asset_class.into(), weight_pct);
        self
    }

    pub fn with_last_rebalance(mut self, date: NaiveDate) -> Self {
        self.last_rebalance_date = Some(date);
        self
    }

    /// Σ of all finite target weights.
    pub fn total_pct(&self) -> f64 {
        self.targets.values().filter(|w| w.is_finite()).sum()
    }
}

/// What the analyzer suggests doing with an asset class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestedAction {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestedAction::Buy => write!(f, "Buy"),
            SuggestedAction::Sell => write!(f, "Sell"),
            SuggestedAction::Hold => write!(f, "Hold"),
        }
    }
}

/// Current vs target position of one asset class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub asset_class: String,

    pub current_value: f64,

    /// `current_value / portfolio_total × 100`, 0 for an empty portfolio
    pub current_weight_pct: f64,

    pub target_weight_pct: f64,

    /// `target_weight_pct − current_weight_pct`, in percentage points
    pub deviation_pct: f64,

    pub suggested_action: SuggestedAction,

    /// `deviation_pct / 100 × portfolio_total`; positive buys, negative sells
    pub suggested_amount: f64,
}

/// Output of the rebalance analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceReport {
    /// Every class from holdings and targets, ordered by canonical key
    pub summaries: Vec<ClassSummary>,

    /// Whether a rebalance is due as of the analysis date
    pub is_due: bool,

    pub next_due_date: NaiveDate,

    /// Days from the analysis date to `next_due_date` (negative when overdue)
    pub days_until_next: i64,

    /// Summaries whose deviation is above the noise threshold
    pub suggestions: Vec<ClassSummary>,

    /// Σ of all target weights
    pub targets_total_pct: f64,

    /// `true` when the target weights sum to 100 (±0.01)
    pub targets_sum_ok: bool,
}

impl RebalanceReport {
    /// No actionable deviation left.
    pub fn is_balanced(&self) -> bool {
        self.suggestions.is_empty()
    }

    /// Σ of suggested buy amounts.
    pub fn buy_total(&self) -> f64 {
        self.suggestions
            .iter()
            .filter(|s| s.suggested_action == SuggestedAction::Buy)
            .map(|s| s.suggested_amount)
            .sum()
    }

    /// Σ of suggested sell amounts, as a positive magnitude.
    pub fn sell_total(&self) -> f64 {
        self.suggestions
            .iter()
            .filter(|s| s.suggested_action == SuggestedAction::Sell)
            .map(|s| -s.suggested_amount)
            .sum()
    }
}
