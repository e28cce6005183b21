//! Sum-of-asks detection across binary markets.
//!
//! This module handles:
//! - Per-market metrics from the yes and no books
//! - Best-market selection and the alert threshold
//! - Batched cycle processing and the scan loop body

pub mod calculator;
pub mod detector;
pub mod processor;
pub mod scanner;

pub use calculator::{calculate_metrics, classify_sum, executable_notional, MarketMetrics, SumClass};
pub use detector::{select_best, should_alert, BestOpportunity};
pub use processor::{CycleReport, MarketProcessor};
pub use scanner::{ScanOutcome, Scanner};
