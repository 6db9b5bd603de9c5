use thiserror::Error;

/// Unified error type for the portfolio-engine-core library.
///
/// The computations themselves never fail; errors only surface at the
/// boundary where payloads are parsed or the engine is configured.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Payloads ────────────────────────────────────────────────────
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Configuration ───────────────────────────────────────────────
    #[error("Unknown rebalance period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid engine settings: {0}")]
    InvalidSettings(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}
