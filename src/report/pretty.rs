//! Human-readable terminal output.

use std::fmt::Write;

use rust_decimal::{Decimal, RoundingStrategy};

use super::record::label_or;
use crate::arbitrage::BestOpportunity;
use crate::market::Market;
use crate::watch::{WatchObservation, WatchStatus};

const RED: &str = "\x1b[91m";
const GREEN: &str = "\x1b[92m";
const RESET: &str = "\x1b[0m";

/// Titles longer than this are cut in the market list.
pub const LIST_TITLE_WIDTH: usize = 48;

/// Format a decimal with exactly `dp` places, rounding half away from zero.
pub fn fmt_dp(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    let width = dp as usize;
    format!("{rounded:.width$}")
}

/// Like [`fmt_dp`] with an explicit sign.
pub fn fmt_signed(value: Decimal, dp: u32) -> String {
    let text = fmt_dp(value, dp);
    if text.starts_with('-') {
        text
    } else {
        format!("+{text}")
    }
}

/// Format an optional decimal with `dp` places, or `N/A`.
pub fn fmt_opt(value: Option<Decimal>, dp: u32) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| fmt_dp(v, dp))
}

/// The "Best Opportunity" block printed after each cycle.
pub fn best_opportunity(best: &BestOpportunity) -> String {
    let m = &best.metrics;
    let mut out = String::new();

    let _ = writeln!(out, "\n---------------- Best Opportunity ----------------");
    let _ = writeln!(out, "Market: {}", m.market_slug);
    let _ = writeln!(out, "URL: {}", m.url);
    let _ = writeln!(
        out,
        "Yes: {} @ {} | ${}",
        label_or(&m.yes_outcome, "Yes"),
        fmt_opt(m.yes_ask, 4),
        fmt_opt(m.yes_ask_notional, 2)
    );
    let _ = writeln!(
        out,
        "No:  {}  @ {}  | ${}",
        label_or(&m.no_outcome, "No"),
        fmt_opt(m.no_ask, 4),
        fmt_opt(m.no_ask_notional, 2)
    );
    let _ = writeln!(out, "Sum: {} ({})", fmt_dp(best.sum, 4), best.class);
    let _ = writeln!(out, "Executable USD: ${}", fmt_dp(best.executable_notional, 2));
    let _ = writeln!(out, "--------------------------------------------------");

    out
}

/// Indexed market table: `IDX | TITLE | SLUG`.
pub fn market_list(markets: &[Market]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "\nDiscovered {} markets:\n", markets.len());
    let _ = writeln!(out, "{:<5} | {:<50} | SLUG", "IDX", "TITLE");
    let _ = writeln!(out, "{}", "-".repeat(100));
    for (idx, market) in markets.iter().enumerate() {
        let title: String = market.title.chars().take(LIST_TITLE_WIDTH).collect();
        let _ = writeln!(out, "{idx:<5} | {title:<50} | {}", market.market_slug);
    }

    out
}

/// One colored watch row: `[HH:MM:SS] STATUS | Price | Diff | Notional`.
pub fn watch_row(clock: &str, obs: &WatchObservation) -> String {
    let color = if obs.status == WatchStatus::Triggered {
        RED
    } else {
        GREEN
    };
    format!(
        "[{clock}] {color}{:<10}{RESET} | Price: {} | Diff: {} | Notional: ${}",
        obs.status.to_string(),
        fmt_opt(obs.price, 4),
        obs.diff.map_or_else(|| "N/A".to_string(), |d| fmt_signed(d, 4)),
        fmt_opt(obs.notional, 2)
    )
}
