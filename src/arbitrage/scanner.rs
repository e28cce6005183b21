//! One scan cycle end to end: process, report, alert.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use super::detector::should_alert;
use super::processor::{CycleReport, MarketProcessor};
use crate::alert::{message, TelegramNotifier};
use crate::market::{BookSource, Market};
use crate::metrics;
use crate::report::{pretty, JsonlWriter};

/// Result of a scan cycle.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Per-market results and the best market.
    pub report: CycleReport,
    /// A Telegram alert was delivered this cycle.
    pub alerted: bool,
}

/// Runs scan cycles over a fixed market list.
pub struct Scanner<S> {
    processor: MarketProcessor<S>,
    writer: Option<JsonlWriter>,
    notifier: TelegramNotifier,
    threshold: Option<Decimal>,
    pretty: bool,
}

impl<S: BookSource> Scanner<S> {
    /// Create a scanner. Without a threshold no scan alert is ever sent.
    pub fn new(processor: MarketProcessor<S>, notifier: TelegramNotifier) -> Self {
        Self {
            processor,
            writer: None,
            notifier,
            threshold: None,
            pretty: false,
        }
    }

    /// Append records to a JSON lines file every cycle.
    pub fn with_output(mut self, writer: JsonlWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Alert when the best sum is strictly below `threshold`.
    pub fn with_threshold(mut self, threshold: Option<Decimal>) -> Self {
        self.threshold = threshold;
        self
    }

    /// Print the best opportunity block to stdout.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Run one cycle. Output and alert failures are logged, never returned.
    pub async fn run_cycle(&self, markets: &[Market]) -> ScanOutcome {
        let _timer = metrics::timer_cycle();
        let report = self.processor.run_cycle(markets).await;

        if let Some(best) = &report.best {
            if let Some(sum) = best.sum.to_f64() {
                metrics::set_best_sum(sum);
            }
            if self.pretty {
                println!("{}", pretty::best_opportunity(best));
            }
        } else {
            info!("No market with both asks this cycle");
        }

        if let Some(writer) = &self.writer {
            if let Err(e) = writer.append_cycle(&report.results, report.best.as_ref()).await {
                error!(error = %e, path = %writer.path().display(), "Failed to write cycle records");
            }
        }

        let alerted = self.alert(&report).await;
        metrics::inc_cycles();

        ScanOutcome { report, alerted }
    }

    async fn alert(&self, report: &CycleReport) -> bool {
        let Some(threshold) = self.threshold else {
            return false;
        };
        let Some(best) = &report.best else {
            debug!("No best market, nothing to alert on");
            return false;
        };

        if !should_alert(best, threshold) {
            info!("Alert skipped (sum {} >= {threshold})", pretty::fmt_dp(best.sum, 4));
            metrics::inc_alerts_skipped("threshold");
            return false;
        }

        if !self.notifier.has_credentials() {
            warn!("Telegram alert threshold met, but TG_BOT_TOKEN or TG_CHAT_ID is missing. Skipping alert.");
            metrics::inc_alerts_skipped("missing_credentials");
            return false;
        }

        let sent = self.notifier.notify(&message::scan_alert(best)).await;
        if sent {
            info!("Alert sent (sum {} < {threshold})", pretty::fmt_dp(best.sum, 4));
        }
        sent
    }
}
