//! Prometheus metrics for scan cycles, fetches and alerts.
//!
//! This module provides metrics for:
//! - Scan cycle and discovery page latency
//! - Order book fetch latency, retries and exhaustion
//! - Alert delivery outcomes
//! - The best sum observed in the last cycle

use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Scan cycle latency metric name.
pub const METRIC_CYCLE_LATENCY: &str = "scan_cycle_latency_ms";
/// Discovery page latency metric name.
pub const METRIC_DISCOVERY_PAGE_LATENCY: &str = "discovery_page_latency_ms";
/// Order book fetch latency metric name.
pub const METRIC_ORDERBOOK_FETCH_LATENCY: &str = "orderbook_fetch_latency_ms";
/// Retried attempts counter metric name.
pub const METRIC_RETRIES: &str = "http_retries_total";
/// Fetches that returned an empty book after exhausting retries.
pub const METRIC_ORDERBOOK_EXHAUSTED: &str = "orderbook_fetch_exhausted_total";
/// Markets processed counter metric name.
pub const METRIC_MARKETS_PROCESSED: &str = "markets_processed_total";
/// Completed cycles counter metric name.
pub const METRIC_CYCLES: &str = "scan_cycles_total";
/// Alerts sent counter metric name.
pub const METRIC_ALERTS_SENT: &str = "alerts_sent_total";
/// Alerts failed counter metric name.
pub const METRIC_ALERTS_FAILED: &str = "alerts_failed_total";
/// Alerts skipped counter metric name.
pub const METRIC_ALERTS_SKIPPED: &str = "alerts_skipped_total";
/// Last best sum gauge metric name.
pub const METRIC_BEST_SUM: &str = "best_sum_of_asks";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(METRIC_CYCLE_LATENCY, "Scan cycle latency in milliseconds");
    describe_histogram!(
        METRIC_DISCOVERY_PAGE_LATENCY,
        "Discovery page fetch latency in milliseconds"
    );
    describe_histogram!(
        METRIC_ORDERBOOK_FETCH_LATENCY,
        "Order book fetch latency in milliseconds, retries included"
    );

    describe_counter!(METRIC_RETRIES, "Total number of retried HTTP attempts");
    describe_counter!(
        METRIC_ORDERBOOK_EXHAUSTED,
        "Order book fetches that gave up and returned no data"
    );
    describe_counter!(METRIC_MARKETS_PROCESSED, "Total number of markets processed");
    describe_counter!(METRIC_CYCLES, "Total number of completed scan cycles");
    describe_counter!(METRIC_ALERTS_SENT, "Total number of alerts delivered");
    describe_counter!(METRIC_ALERTS_FAILED, "Total number of alerts that failed to deliver");
    describe_counter!(
        METRIC_ALERTS_SKIPPED,
        "Alerts not sent because of threshold, cooldown or missing credentials"
    );

    describe_gauge!(METRIC_BEST_SUM, "Lowest sum of best asks in the last cycle");

    debug!("Metrics initialized");
}

/// Install the Prometheus recorder and describe all metrics.
pub fn install_prometheus() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Record discovery page latency.
pub fn record_discovery_page_latency(start: Instant) {
    histogram!(METRIC_DISCOVERY_PAGE_LATENCY).record(elapsed_ms(start));
}

/// Record order book fetch latency.
pub fn record_orderbook_fetch_latency(start: Instant) {
    histogram!(METRIC_ORDERBOOK_FETCH_LATENCY).record(elapsed_ms(start));
}

/// Increment the retry counter for an operation.
pub fn inc_retries(operation: &'static str) {
    counter!(METRIC_RETRIES, "operation" => operation).increment(1);
}

/// Increment the exhausted fetch counter.
pub fn inc_orderbook_exhausted() {
    counter!(METRIC_ORDERBOOK_EXHAUSTED).increment(1);
}

/// Add to the processed markets counter.
pub fn add_markets_processed(count: usize) {
    counter!(METRIC_MARKETS_PROCESSED).increment(count as u64);
}

/// Increment the completed cycles counter.
pub fn inc_cycles() {
    counter!(METRIC_CYCLES).increment(1);
}

/// Increment alerts sent counter.
pub fn inc_alerts_sent() {
    counter!(METRIC_ALERTS_SENT).increment(1);
}

/// Increment alerts failed counter.
pub fn inc_alerts_failed() {
    counter!(METRIC_ALERTS_FAILED).increment(1);
}

/// Increment alerts skipped counter.
pub fn inc_alerts_skipped(reason: &'static str) {
    counter!(METRIC_ALERTS_SKIPPED, "reason" => reason).increment(1);
}

/// Publish the best sum of the last cycle.
pub fn set_best_sum(sum: f64) {
    gauge!(METRIC_BEST_SUM).set(sum);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(elapsed_ms(self.start));
    }
}

/// Create a latency timer for a scan cycle.
pub fn timer_cycle() -> LatencyTimer {
    LatencyTimer::new(METRIC_CYCLE_LATENCY)
}
