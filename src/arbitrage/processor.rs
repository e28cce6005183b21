//! Per-market processing and batched cycle fan-out.

use futures::future::join_all;
use tracing::{debug, info, instrument};

use super::calculator::{calculate_metrics, MarketMetrics};
use super::detector::{select_best, BestOpportunity};
use crate::market::{BookSource, Market};
use crate::metrics;

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// Metrics in market input order; markets without both tokens are absent.
    pub results: Vec<MarketMetrics>,
    /// Lowest defined sum, if any.
    pub best: Option<BestOpportunity>,
    /// Markets skipped for a missing token id.
    pub skipped: usize,
}

/// Fetches both books of each market and computes metrics.
#[derive(Debug, Clone)]
pub struct MarketProcessor<S> {
    source: S,
    batch_size: usize,
}

impl<S: BookSource> MarketProcessor<S> {
    /// Create a processor. A zero batch size is treated as one.
    pub fn new(source: S, batch_size: usize) -> Self {
        Self {
            source,
            batch_size: batch_size.max(1),
        }
    }

    /// Process one market. Absent when either token id is missing.
    #[instrument(skip(self, market), fields(market = %market.market_slug))]
    pub async fn process(&self, market: &Market) -> Option<MarketMetrics> {
        let Some((yes_token, no_token)) = market.token_pair() else {
            debug!("Skipping market with a missing token id");
            return None;
        };

        let (yes_book, no_book) = tokio::join!(
            self.source.fetch_book(yes_token),
            self.source.fetch_book(no_token)
        );

        Some(calculate_metrics(market, &yes_book, &no_book))
    }

    /// Process every market in concurrent batches and pick the best.
    pub async fn run_cycle(&self, markets: &[Market]) -> CycleReport {
        let mut results = Vec::with_capacity(markets.len());
        let mut skipped = 0;

        for batch in markets.chunks(self.batch_size) {
            let outcomes = join_all(batch.iter().map(|m| self.process(m))).await;
            for outcome in outcomes {
                match outcome {
                    Some(metrics) => results.push(metrics),
                    None => skipped += 1,
                }
            }
        }

        metrics::add_markets_processed(results.len());

        let best = select_best(&results);
        info!(
            processed = results.len(),
            skipped,
            with_sum = results.iter().filter(|m| m.sum_flag.is_some()).count(),
            "Cycle processed"
        );

        CycleReport {
            results,
            best,
            skipped,
        }
    }
}
