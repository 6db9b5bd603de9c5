use std::collections::VecDeque;

use tracing::debug;

use crate::models::holding::CostBasisResult;
use crate::models::movement::{Lot, Movement, MovementKind};

/// Rebuilds the open lots of one ticker from its movement history and
/// derives the FIFO cost basis.
///
/// Pure business logic: no I/O and no state kept between calls.
pub struct LotMatcher;

impl LotMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Compute the FIFO cost basis of a single ticker's movements.
    ///
    /// Movements are re-sorted by date (stable, so same-day movements keep
    /// their insertion order). Malformed movements are dropped. A sell that
    /// exceeds the open quantity consumes everything that is open and the
    /// excess is ignored: short positions are not modeled.
    pub fn compute_cost_basis(&self, movements: &[Movement]) -> CostBasisResult {
        let mut ordered: Vec<&Movement> = movements
            .iter()
            .filter(|m| {
                let ok = m.is_well_formed();
                if !ok {
                    debug!(
                        ticker = %m.ticker,
                        quantity = m.quantity,
                        unit_price = m.unit_price,
                        "skipping malformed movement"
                    );
                }
                ok
            })
            .collect();
        ordered.sort_by_key(|m| m.date);

        let mut lots: VecDeque<Lot> = VecDeque::new();
        let mut realized_gain = 0.0;
        let mut discarded = 0.0;

        for movement in ordered {
            match movement.kind {
                MovementKind::Buy => lots.push_back(Lot {
                    quantity: movement.quantity,
                    unit_price: movement.unit_price,
                    date: movement.date,
                }),
                MovementKind::Sell => {
                    let mut remaining = movement.quantity;
                    while remaining > 0.0 {
                        let Some(front) = lots.front_mut() else {
                            break;
                        };
                        let consumed = front.quantity.min(remaining);
                        realized_gain += (movement.unit_price - front.unit_price) * consumed;
                        front.quantity -= consumed;
                        remaining -= consumed;
                        if front.quantity <= 0.0 {
                            lots.pop_front();
                        }
                    }
                    if remaining > 0.0 {
                        debug!(
                            ticker = %movement.ticker,
                            date = %movement.date,
                            discarded = remaining,
                            "sell exceeds open lots, ignoring excess"
                        );
                        discarded += remaining;
                    }
                }
            }
        }

        let remaining_quantity: f64 = lots.iter().map(|l| l.quantity).sum();
        let total_invested: f64 = lots.iter().map(Lot::cost).sum();
        let average_unit_price = if remaining_quantity > 0.0 {
            Some(total_invested / remaining_quantity).filter(|p| p.is_finite())
        } else {
            None
        };

        CostBasisResult {
            remaining_quantity,
            average_unit_price,
            total_invested,
            realized_gain,
            discarded_sell_quantity: discarded,
            open_lots: lots.into_iter().collect(),
        }
    }
}

impl Default for LotMatcher {
    fn default() -> Self {
        Self::new()
    }
}
