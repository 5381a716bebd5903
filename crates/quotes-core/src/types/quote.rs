//! Point-in-time quote snapshot and price derivation.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Bid/offer snapshot for a single instrument.
///
/// Fetched fresh per request, never cached across calls. Either side may be
/// absent outside market hours or for one-sided books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Vendor instrument code.
    pub epic: String,
    /// Best bid, if quoted.
    pub bid: Option<Decimal>,
    /// Best offer, if quoted.
    pub offer: Option<Decimal>,
}

impl Quote {
    /// Create a new quote.
    pub fn new(epic: impl Into<String>, bid: Option<Decimal>, offer: Option<Decimal>) -> Self {
        Self {
            epic: epic.into(),
            bid,
            offer,
        }
    }

    /// The single price this quote resolves to, rounded to two decimals:
    /// mid price when both sides are quoted, the bid alone otherwise,
    /// `None` when not even a bid is present.
    pub fn price(&self) -> Option<Decimal> {
        match (self.bid, self.offer) {
            (Some(bid), Some(offer)) => Some(round_price((bid + offer) / Decimal::TWO)),
            (Some(bid), None) => Some(round_price(bid)),
            _ => None,
        }
    }
}

/// Round to two decimal places, ties away from zero (100.005 -> 100.01).
pub fn round_price(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
