//! Telegram message bodies (Markdown).

use rust_decimal::Decimal;

use crate::arbitrage::BestOpportunity;
use crate::market::{Market, Outcome};
use crate::report::pretty::{fmt_dp, fmt_opt};
use crate::report::record::label_or;
use crate::watch::TriggerOp;

/// Body of `--test-telegram`.
pub const TEST_MESSAGE: &str = "ProbableBook Telegram test message";

/// Alert for a cycle whose best sum fell under the threshold.
pub fn scan_alert(best: &BestOpportunity) -> String {
    let m = &best.metrics;
    format!(
        "🚨 *Probable Market Alert*\n\
         Market: {slug}\n\
         Sum: {sum} ({class})\n\
         Executable USD: ${exec}\n\n\
         Yes: {yes_label} @ {yes_ask} | ${yes_notional}\n\
         No:  {no_label}  @ {no_ask}  | ${no_notional}\n\n\
         URL:\n{url}",
        slug = m.market_slug,
        sum = fmt_dp(best.sum, 4),
        class = best.class,
        exec = fmt_dp(best.executable_notional, 2),
        yes_label = label_or(&m.yes_outcome, "Yes"),
        yes_ask = fmt_opt(m.yes_ask, 4),
        yes_notional = fmt_opt(m.yes_ask_notional, 2),
        no_label = label_or(&m.no_outcome, "No"),
        no_ask = fmt_opt(m.no_ask, 4),
        no_notional = fmt_opt(m.no_ask_notional, 2),
        url = m.url,
    )
}

/// Alert for a triggered watch.
pub fn watch_alert(
    market: &Market,
    side: Outcome,
    price: Decimal,
    op: TriggerOp,
    trigger: Decimal,
    notional: Decimal,
) -> String {
    format!(
        "🚨 *Probable Market Watch*\n\
         Market: {}\n\
         Side: {side}\n\
         Trigger: {} {op} {trigger}\n\
         Notional: ${}\n\
         URL: {}",
        market.title,
        fmt_dp(price, 4),
        fmt_dp(notional, 2),
        market.url,
    )
}
