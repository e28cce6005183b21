//! Trigger comparison and per-tick observation.

use rust_decimal::Decimal;
use strum::{Display, EnumString};

use crate::orderbook::{best_bid, BestLevel, OrderBook};

/// Comparison applied as `best_bid <op> trigger`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
pub enum TriggerOp {
    #[default]
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = "<")]
    Lt,
}

impl TriggerOp {
    /// Evaluate `value <op> trigger`.
    pub fn check(self, value: Decimal, trigger: Decimal) -> bool {
        match self {
            TriggerOp::Ge => value >= trigger,
            TriggerOp::Gt => value > trigger,
            TriggerOp::Le => value <= trigger,
            TriggerOp::Lt => value < trigger,
        }
    }
}

/// Watch tick status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum WatchStatus {
    /// No bid level.
    #[strum(serialize = "NA")]
    Na,
    /// Bid present, condition not met.
    #[strum(serialize = "OK")]
    Ok,
    /// Condition met.
    #[strum(serialize = "TRIGGERED")]
    Triggered,
}

/// What one watch tick saw.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchObservation {
    /// Outcome of the trigger comparison.
    pub status: WatchStatus,
    /// Best bid price.
    pub price: Option<Decimal>,
    /// Aggregated size at the best bid.
    pub size: Option<Decimal>,
    /// `price - trigger`; absent on overflow.
    pub diff: Option<Decimal>,
    /// `price × size`; absent on overflow.
    pub notional: Option<Decimal>,
}

impl WatchObservation {
    /// Observation for a book with no bids.
    pub fn unavailable() -> Self {
        Self {
            status: WatchStatus::Na,
            price: None,
            size: None,
            diff: None,
            notional: None,
        }
    }

    /// Compare the best bid of `book` against the trigger.
    pub fn from_book(book: &OrderBook, op: TriggerOp, trigger: Decimal) -> Self {
        match best_bid(book) {
            Some(level) => Self::from_level(&level, op, trigger),
            None => Self::unavailable(),
        }
    }

    fn from_level(level: &BestLevel, op: TriggerOp, trigger: Decimal) -> Self {
        let status = if op.check(level.price, trigger) {
            WatchStatus::Triggered
        } else {
            WatchStatus::Ok
        };
        Self {
            status,
            price: Some(level.price),
            size: Some(level.size),
            diff: level.price.checked_sub(trigger),
            notional: level.notional(),
        }
    }

    /// True when the trigger condition held.
    pub fn triggered(&self) -> bool {
        self.status == WatchStatus::Triggered
    }
}
