use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Tunable engine settings, owned and stored by the caller.
///
/// Every field has a default, so a partial JSON object (or `{}`) is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Deviations (in percentage points) below this are treated as noise.
    pub noise_threshold_pct: f64,

    /// Lower clamp applied to the annualized growth estimate.
    pub min_annual_growth: f64,

    /// Upper clamp applied to the annualized growth estimate.
    pub max_annual_growth: f64,

    /// Floor applied after clamping. 0 projects declining portfolios as flat.
    pub growth_floor: f64,

    /// Growth used when the history has fewer than two valid points.
    pub fallback_annual_growth: f64,

    /// Bucket for holdings without an asset class.
    pub unknown_class_label: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            noise_threshold_pct: 0.1,
            min_annual_growth: -0.9,
            max_annual_growth: 2.0,
            growth_floor: 0.0,
            fallback_annual_growth: 0.0,
            unknown_class_label: "Unknown".to_string(),
        }
    }
}

impl EngineSettings {
    /// Parse settings from JSON and validate them.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: EngineSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the engine cannot honour.
    pub fn validate(&self) -> Result<(), CoreError> {
        let numbers = [
            ("noise_threshold_pct", self.noise_threshold_pct),
            ("min_annual_growth", self.min_annual_growth),
            ("max_annual_growth", self.max_annual_growth),
            ("growth_floor", self.growth_floor),
            ("fallback_annual_growth", self.fallback_annual_growth),
        ];
        if let Some((name, _)) = numbers.iter().find(|(_, v)| !v.is_finite()) {
            return Err(CoreError::InvalidSettings(format!("{name} must be a finite number")));
        }
        if self.noise_threshold_pct < 0.0 {
            return Err(CoreError::InvalidSettings(
                "noise_threshold_pct must not be negative".into(),
            ));
        }
        if self.min_annual_growth > self.max_annual_growth {
            return Err(CoreError::InvalidSettings(format!(
                "min_annual_growth ({}) exceeds max_annual_growth ({})",
                self.min_annual_growth, self.max_annual_growth
            )));
        }
        if self.min_annual_growth <= -1.0 {
            return Err(CoreError::InvalidSettings(
                "min_annual_growth must be above -1 (a total loss per year)".into(),
            ));
        }
        if self.unknown_class_label.trim().is_empty() {
            return Err(CoreError::InvalidSettings(
                "unknown_class_label must not be empty".into(),
            ));
        }
        Ok(())
    }
}
