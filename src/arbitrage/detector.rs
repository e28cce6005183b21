//! Best-market selection and the alert threshold check.

use rust_decimal::Decimal;
use tracing::{debug, instrument};

use super::calculator::{classify_sum, MarketMetrics, SumClass};

/// The market with the lowest defined sum in a cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct BestOpportunity {
    /// Metrics of the selected market.
    pub metrics: MarketMetrics,
    /// Its sum of asks, always defined.
    pub sum: Decimal,
    /// Classification of `sum`.
    pub class: SumClass,
    /// min(yes notional, no notional), zero when a leg is missing.
    pub executable_notional: Decimal,
}

/// Pick the result with the lowest `sum_flag`.
///
/// Results without a sum never win. On ties the earliest result is kept, so
/// the caller's market order decides.
#[instrument(skip_all, fields(results = results.len()))]
pub fn select_best(results: &[MarketMetrics]) -> Option<BestOpportunity> {
    let mut best: Option<(&MarketMetrics, Decimal)> = None;

    for metrics in results {
        let Some(sum) = metrics.sum_flag else {
            continue;
        };
        if best.map_or(true, |(_, current)| sum < current) {
            best = Some((metrics, sum));
        }
    }

    let (metrics, sum) = best?;
    let opportunity = BestOpportunity {
        metrics: metrics.clone(),
        sum,
        class: classify_sum(sum),
        executable_notional: metrics.executable_notional(),
    };

    debug!(
        market = %opportunity.metrics.market_slug,
        sum = %opportunity.sum,
        class = %opportunity.class,
        "Selected best market"
    );

    Some(opportunity)
}

/// True when the best sum is strictly below `threshold`.
pub fn should_alert(best: &BestOpportunity, threshold: Decimal) -> bool {
    best.sum < threshold
}
