use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Direction of a portfolio movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKind {
    /// Acquiring units, opens a new lot
    Buy,
    /// Disposing of units, consumes the oldest open lots
    Sell,
}

impl MovementKind {
    /// Parse a kind label as it arrives from the ledger.
    /// Accepts English and Portuguese spellings, case-insensitively.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "buy" | "compra" => Some(MovementKind::Buy),
            "sell" | "venda" => Some(MovementKind::Sell),
            _ => None,
        }
    }
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovementKind::Buy => write!(f, "Buy"),
            MovementKind::Sell => write!(f, "Sell"),
        }
    }
}

/// One buy or sell event for a holding.
///
/// Movements are immutable historical facts. The engine only reads them;
/// lots are rebuilt from the full list on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    /// Ticker symbol, uppercased
    pub ticker: String,

    /// Buy or Sell
    pub kind: MovementKind,

    /// Number of units (expected positive)
    pub quantity: f64,

    /// Price per unit at the time of the movement (expected non-negative)
    pub unit_price: f64,

    /// Trade date (daily granularity)
    pub date: NaiveDate,
}

impl Movement {
    pub fn new(
        ticker: impl Into<String>,
        kind: MovementKind,
        quantity: f64,
        unit_price: f64,
        date: NaiveDate,
    ) -> Self {
        Self {
            ticker: normalize_ticker(&ticker.into()),
            kind,
            quantity,
            unit_price,
            date,
        }
    }

    pub fn buy(ticker: impl Into<String>, quantity: f64, unit_price: f64, date: NaiveDate) -> Self {
        Self::new(ticker, MovementKind::Buy, quantity, unit_price, date)
    }

    pub fn sell(ticker: impl Into<String>, quantity: f64, unit_price: f64, date: NaiveDate) -> Self {
        Self::new(ticker, MovementKind::Sell, quantity, unit_price, date)
    }

    /// A movement is usable when its quantity is finite and positive and its
    /// price is finite and non-negative.
    pub fn is_well_formed(&self) -> bool {
        self.quantity.is_finite()
            && self.quantity > 0.0
            && self.unit_price.is_finite()
            && self.unit_price >= 0.0
    }
}

/// A movement exactly as the ledger delivers it, before validation.
///
/// Every field is optional or textual so that one bad row never fails the
/// whole payload; [`RawMovement::into_movement`] decides what survives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMovement {
    #[serde(default)]
    pub ticker: Option<String>,

    #[serde(default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub quantity: Option<f64>,

    #[serde(default)]
    pub unit_price: Option<f64>,

    #[serde(default)]
    pub date: Option<String>,
}

impl RawMovement {
    /// Convert into a typed [`Movement`], or `None` if any field is missing
    /// or malformed.
    pub fn into_movement(self) -> Option<Movement> {
        let ticker = self.ticker.filter(|t| !t.trim().is_empty())?;
        let kind = MovementKind::parse(self.kind.as_deref()?)?;
        let date = parse_date(self.date.as_deref()?)?;
        let movement = Movement::new(ticker, kind, self.quantity?, self.unit_price.unwrap_or(0.0), date);
        movement.is_well_formed().then_some(movement)
    }
}

/// An open tranche created by a Buy and consumed oldest-first by Sells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    /// Units still open in this tranche
    pub quantity: f64,

    /// Acquisition price per unit
    pub unit_price: f64,

    /// Acquisition date
    pub date: NaiveDate,
}

impl Lot {
    /// Cost of the units still open in this lot.
    pub fn cost(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

/// Trim and uppercase a ticker symbol.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Parse a calendar date, accepting `YYYY-MM-DD` optionally followed by a
/// time component (`YYYY-MM-DD HH:MM:SS` or ISO `T` separator).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }
    // Fall back to the leading date part of longer timestamps (e.g. with offsets)
    trimmed
        .get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
}
