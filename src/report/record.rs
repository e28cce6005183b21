//! JSON line records written for every cycle.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::arbitrage::{BestOpportunity, MarketMetrics};

/// One line per processed market. Absent numbers serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketRecord {
    pub title: String,
    pub url: String,
    pub market_slug: String,
    pub yes_outcome: String,
    pub no_outcome: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub yes_ask: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub no_ask: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub sum_flag: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub yes_ask_notional_usd: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub no_ask_notional_usd: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub both_ask_notional_usd: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub yes_debug_size: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub no_debug_size: Option<Decimal>,
    pub yes_raw_entries: Vec<Value>,
    pub no_raw_entries: Vec<Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl From<&MarketMetrics> for MarketRecord {
    fn from(m: &MarketMetrics) -> Self {
        Self {
            title: m.title.clone(),
            url: m.url.clone(),
            market_slug: m.market_slug.clone(),
            yes_outcome: m.yes_outcome.clone(),
            no_outcome: m.no_outcome.clone(),
            yes_ask: m.yes_ask,
            no_ask: m.no_ask,
            sum_flag: m.sum_flag,
            yes_ask_notional_usd: m.yes_ask_notional,
            no_ask_notional_usd: m.no_ask_notional,
            both_ask_notional_usd: m.both_ask_notional,
            yes_debug_size: m.yes_size,
            no_debug_size: m.no_size,
            yes_raw_entries: m.yes_raw_entries.clone(),
            no_raw_entries: m.no_raw_entries.clone(),
            timestamp: m.timestamp,
        }
    }
}

/// Summary line for the cycle's best market, tagged `"type": "best_market"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestMarketRecord {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub market_slug: String,
    pub url: String,
    pub label_yes: String,
    pub label_no: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub yes_ask: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub no_ask: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub sum: Decimal,
    /// Classification label (`GT1`, `LT1`, `EQ1`).
    pub sum_flag: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub yes_ask_notional_usd: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub no_ask_notional_usd: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub executable_notional_usd: Decimal,
}

/// Fallback label when an outcome name is empty.
pub fn label_or<'a>(label: &'a str, fallback: &'a str) -> &'a str {
    if label.is_empty() {
        fallback
    } else {
        label
    }
}

impl From<&BestOpportunity> for BestMarketRecord {
    fn from(best: &BestOpportunity) -> Self {
        let m = &best.metrics;
        Self {
            kind: "best_market",
            market_slug: m.market_slug.clone(),
            url: m.url.clone(),
            label_yes: label_or(&m.yes_outcome, "Yes").to_string(),
            label_no: label_or(&m.no_outcome, "No").to_string(),
            yes_ask: m.yes_ask,
            no_ask: m.no_ask,
            sum: best.sum,
            sum_flag: best.class.to_string(),
            yes_ask_notional_usd: m.yes_ask_notional,
            no_ask_notional_usd: m.no_ask_notional,
            executable_notional_usd: best.executable_notional,
        }
    }
}
