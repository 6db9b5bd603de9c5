pub mod errors;
pub mod models;
pub mod services;

use chrono::NaiveDate;
use models::{
    dashboard::{DashboardInput, DashboardSnapshot},
    holding::{CostBasisResult, HoldingPosition, PositionSummary},
    movement::Movement,
    projection::{DatedValue, DividendEvent, ProjectionParams, ProjectionReport, SeriesPoint},
    rebalance::{RebalanceReport, RebalanceTargetConfig},
    settings::EngineSettings,
};
use services::{
    ingest_service::{IngestService, RawDashboardInput, RawTargetConfig},
    lot_matcher::LotMatcher,
    position_aggregator::PositionAggregator,
    projection_engine::{ProjectionEngine, MAX_PROJECTION_YEARS},
    rebalance_analyzer::RebalanceAnalyzer,
    series_service::SeriesService,
};
use std::collections::{BTreeMap, HashMap};

use errors::CoreError;

/// Main entry point for the portfolio engine.
///
/// Holds the engine settings and the services built from them. Every
/// operation is a pure function of its arguments, so one engine can be
/// shared freely between threads and UI refresh cycles.
#[must_use]
pub struct PortfolioEngine {
    settings: EngineSettings,
    ingest_service: IngestService,
    lot_matcher: LotMatcher,
    position_aggregator: PositionAggregator,
    rebalance_analyzer: RebalanceAnalyzer,
    projection_engine: ProjectionEngine,
    series_service: SeriesService,
}

impl std::fmt::Debug for PortfolioEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioEngine")
            .field("settings", &self.settings)
            .finish()
    }
}

impl PortfolioEngine {
    /// Create an engine with default settings.
    pub fn new() -> Self {
        Self::build(EngineSettings::default())
    }

    /// Create an engine with custom settings. Settings are validated first.
    pub fn with_settings(settings: EngineSettings) -> Result<Self, CoreError> {
        settings.validate()?;
        Ok(Self::build(settings))
    }

    /// Create an engine from a JSON settings document.
    pub fn from_settings_json(json: &str) -> Result<Self, CoreError> {
        let settings = EngineSettings::from_json(json)?;
        Ok(Self::build(settings))
    }

    /// Get current settings.
    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    // ── Cost Basis & Positions ──────────────────────────────────────

    /// FIFO cost basis of one ticker's movements.
    #[must_use]
    pub fn cost_basis(&self, movements: &[Movement]) -> CostBasisResult {
        self.lot_matcher.compute_cost_basis(movements)
    }

    /// Per-holding and per-class valuation of the current holdings.
    #[must_use]
    pub fn summarize(
        &self,
        holdings: &[HoldingPosition],
        movements_by_ticker: &HashMap<String, Vec<Movement>>,
    ) -> PositionSummary {
        self.position_aggregator.summarize(holdings, movements_by_ticker)
    }

    // ── Rebalancing ─────────────────────────────────────────────────

    /// Compare the per-class allocation with the target weights.
    #[must_use]
    pub fn analyze_rebalance(
        &self,
        per_class: &BTreeMap<String, f64>,
        portfolio_total: f64,
        targets: &RebalanceTargetConfig,
        as_of: NaiveDate,
    ) -> RebalanceReport {
        self.rebalance_analyzer
            .analyze(per_class, portfolio_total, targets, as_of)
    }

    // ── Projection ──────────────────────────────────────────────────

    /// Project the portfolio forward.
    /// The horizon must not exceed 100 years.
    pub fn project(
        &self,
        monthly_series: &[SeriesPoint],
        dividend_events: &[DividendEvent],
        params: &ProjectionParams,
        current_total: f64,
    ) -> Result<ProjectionReport, CoreError> {
        if params.years > MAX_PROJECTION_YEARS {
            return Err(CoreError::ValidationError(format!(
                "Projection horizon of {} years exceeds maximum of {MAX_PROJECTION_YEARS} years",
                params.years
            )));
        }
        Ok(self
            .projection_engine
            .project(monthly_series, dividend_events, params, current_total))
    }

    // ── Series ──────────────────────────────────────────────────────

    /// Rebase a series so its first valid value equals 100.
    #[must_use]
    pub fn rebase_100(&self, series: &[SeriesPoint]) -> Vec<SeriesPoint> {
        self.series_service.rebase_100(series)
    }

    /// Resample dated values to the last value of each month.
    #[must_use]
    pub fn monthly_series(&self, points: &[DatedValue]) -> Vec<SeriesPoint> {
        self.series_service.monthly_last_values(points)
    }

    /// Growth from the first to the last valid value of a series, in percent.
    #[must_use]
    pub fn total_growth_pct(&self, series: &[SeriesPoint]) -> f64 {
        self.series_service.total_growth_pct(series)
    }

    // ── Full Dashboard ──────────────────────────────────────────────

    /// Run the whole pipeline for one dashboard refresh:
    /// positions → rebalance, and projection starting from the positions'
    /// portfolio total.
    pub fn evaluate(&self, input: &DashboardInput) -> Result<DashboardSnapshot, CoreError> {
        let movements_by_ticker = self.ingest_service.group_by_ticker(input.movements.clone());
        let positions = self.summarize(&input.holdings, &movements_by_ticker);

        let rebalance = self.analyze_rebalance(
            &positions.per_class,
            positions.portfolio_total,
            &input.targets,
            input.as_of,
        );

        let projection = self.project(
            &input.monthly_series,
            &input.dividend_events,
            &input.projection,
            positions.portfolio_total,
        )?;

        Ok(DashboardSnapshot {
            as_of: input.as_of,
            positions,
            rebalance,
            projection,
        })
    }

    // ── Import / Export ─────────────────────────────────────────────

    /// Parse a JSON array of ledger rows into movements.
    /// Malformed rows are dropped; only invalid JSON is an error.
    pub fn import_movements_from_json(&self, json: &str) -> Result<Vec<Movement>, CoreError> {
        let rows: Vec<serde_json::Value> = serde_json::from_str(json)?;
        Ok(self.ingest_service.ingest_movement_rows(rows))
    }

    /// Parse a JSON array of ledger rows and group the movements by ticker.
    pub fn import_movements_by_ticker(
        &self,
        json: &str,
    ) -> Result<HashMap<String, Vec<Movement>>, CoreError> {
        let movements = self.import_movements_from_json(json)?;
        Ok(self.ingest_service.group_by_ticker(movements))
    }

    /// Parse a stored target configuration.
    pub fn import_targets_from_json(&self, json: &str) -> Result<RebalanceTargetConfig, CoreError> {
        let raw: RawTargetConfig = serde_json::from_str(json)?;
        self.ingest_service.ingest_targets(raw)
    }

    /// Parse a JSON dashboard request and evaluate it.
    ///
    /// Ledger and dividend rows go through the same lenient ingestion as
    /// [`Self::import_movements_from_json`]: bad rows are dropped, and only a
    /// malformed envelope or an unknown period label fails.
    pub fn evaluate_json(&self, json: &str) -> Result<DashboardSnapshot, CoreError> {
        let raw: RawDashboardInput = serde_json::from_str(json)?;
        let input = self.ingest_service.ingest_dashboard(raw)?;
        self.evaluate(&input)
    }

    /// Serialize a snapshot for the presentation layer.
    pub fn snapshot_to_json(&self, snapshot: &DashboardSnapshot) -> Result<String, CoreError> {
        serde_json::to_string_pretty(snapshot)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize snapshot to JSON: {e}")))
    }

    // ── Internal ────────────────────────────────────────────────────

    fn build(settings: EngineSettings) -> Self {
        let ingest_service = IngestService::new();
        let lot_matcher = LotMatcher::new();
        let position_aggregator = PositionAggregator::new(settings.unknown_class_label.clone());
        let rebalance_analyzer = RebalanceAnalyzer::new(settings.noise_threshold_pct);
        let projection_engine = ProjectionEngine::new(&settings);
        let series_service = SeriesService::new();

        Self {
            settings,
            ingest_service,
            lot_matcher,
            position_aggregator,
            rebalance_analyzer,
            projection_engine,
            series_service,
        }
    }
}

impl Default for PortfolioEngine {
    fn default() -> Self {
        Self::new()
    }
}
