//! Sum-of-asks metrics for a binary market.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use strum::Display;
use time::OffsetDateTime;

use crate::market::Market;
use crate::orderbook::{best_ask, BestLevel, OrderBook};

/// Sums above this are labeled `GT1`.
pub const SUM_UPPER_BAND: Decimal = dec!(1.0001);
/// Sums below this are labeled `LT1`.
pub const SUM_LOWER_BAND: Decimal = dec!(0.9999);

/// Where a sum of asks sits relative to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SumClass {
    /// Above 1.0001.
    #[strum(serialize = "GT1")]
    Gt1,
    /// Within [0.9999, 1.0001].
    #[strum(serialize = "EQ1")]
    Eq1,
    /// Below 0.9999: both legs together cost less than the payout.
    #[strum(serialize = "LT1")]
    Lt1,
}

/// Classify a sum with an epsilon band around 1.0.
pub fn classify_sum(sum: Decimal) -> SumClass {
    if sum > SUM_UPPER_BAND {
        SumClass::Gt1
    } else if sum < SUM_LOWER_BAND {
        SumClass::Lt1
    } else {
        SumClass::Eq1
    }
}

/// Size fillable on both legs at once, in dollars.
///
/// This is the one place an unknown leg counts as zero: if either notional is
/// missing, nothing is executable.
pub fn executable_notional(yes_notional: Option<Decimal>, no_notional: Option<Decimal>) -> Decimal {
    match (yes_notional, no_notional) {
        (Some(yes), Some(no)) => yes.min(no),
        _ => Decimal::ZERO,
    }
}

/// Per-market metrics for one poll cycle. Absent values stay absent.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketMetrics {
    /// Event title.
    pub title: String,
    /// Public event page.
    pub url: String,
    /// Market slug.
    pub market_slug: String,
    /// Yes leg label.
    pub yes_outcome: String,
    /// No leg label.
    pub no_outcome: String,
    /// Best ask on the yes book.
    pub yes_ask: Option<Decimal>,
    /// Best ask on the no book.
    pub no_ask: Option<Decimal>,
    /// Aggregated size at the yes best ask.
    pub yes_size: Option<Decimal>,
    /// Aggregated size at the no best ask.
    pub no_size: Option<Decimal>,
    /// Yes ask × size.
    pub yes_ask_notional: Option<Decimal>,
    /// No ask × size.
    pub no_ask_notional: Option<Decimal>,
    /// yes_ask + no_ask.
    pub sum_flag: Option<Decimal>,
    /// yes notional + no notional.
    pub both_ask_notional: Option<Decimal>,
    /// Raw yes entries at the best ask.
    pub yes_raw_entries: Vec<Value>,
    /// Raw no entries at the best ask.
    pub no_raw_entries: Vec<Value>,
    /// When the metrics were computed.
    pub timestamp: OffsetDateTime,
}

impl MarketMetrics {
    /// Classification of `sum_flag`, if defined.
    pub fn sum_class(&self) -> Option<SumClass> {
        self.sum_flag.map(classify_sum)
    }

    /// See [`executable_notional`].
    pub fn executable_notional(&self) -> Decimal {
        executable_notional(self.yes_ask_notional, self.no_ask_notional)
    }
}

/// Combine the yes and no books of `market` into metrics.
pub fn calculate_metrics(market: &Market, yes_book: &OrderBook, no_book: &OrderBook) -> MarketMetrics {
    let yes = best_ask(yes_book);
    let no = best_ask(no_book);

    // Values that overflow are reported as absent.
    let yes_ask_notional = yes.as_ref().and_then(BestLevel::notional);
    let no_ask_notional = no.as_ref().and_then(BestLevel::notional);

    let sum_flag = match (&yes, &no) {
        (Some(y), Some(n)) => y.price.checked_add(n.price),
        _ => None,
    };
    let both_ask_notional = match (yes_ask_notional, no_ask_notional) {
        (Some(y), Some(n)) => y.checked_add(n),
        _ => None,
    };

    MarketMetrics {
        title: market.title.clone(),
        url: market.url.clone(),
        market_slug: market.market_slug.clone(),
        yes_outcome: market.yes_outcome.clone(),
        no_outcome: market.no_outcome.clone(),
        yes_ask: yes.as_ref().map(|l| l.price),
        no_ask: no.as_ref().map(|l| l.price),
        yes_size: yes.as_ref().map(|l| l.size),
        no_size: no.as_ref().map(|l| l.size),
        yes_ask_notional,
        no_ask_notional,
        sum_flag,
        both_ask_notional,
        yes_raw_entries: yes.map(|l| l.entries).unwrap_or_default(),
        no_raw_entries: no.map(|l| l.entries).unwrap_or_default(),
        timestamp: OffsetDateTime::now_utc(),
    }
}
