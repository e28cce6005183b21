//! Probable Markets order book scanner.
//!
//! Discovers open binary markets on Probable, fetches the yes and no order
//! books of each one, and reports the market whose best asks sum lowest.
//!
//! # Signal
//!
//! Exactly one leg of a binary market pays $1.00. When the best asks of both
//! legs sum below 1, buying both costs less than the payout:
//!
//! ```text
//! Yes best ask:  0.42 x 100
//! No  best ask:  0.55 x 50
//! ─────────────────────────
//! Sum:           0.97 (LT1)
//! Executable:    $27.50
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`market`]: Market discovery and the order book client
//! - [`orderbook`]: Raw books and best-level extraction
//! - [`arbitrage`]: Per-market metrics, best selection and the scan cycle
//! - [`report`]: JSON lines output and terminal rendering
//! - [`alert`]: Telegram delivery and message bodies
//! - [`watch`]: Single-token best bid watch mode
//! - [`api`]: HTTP API for health/metrics
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Shutdown handling and retry policy

pub mod alert;
pub mod api;
pub mod arbitrage;
pub mod config;
pub mod error;
pub mod market;
pub mod metrics;
pub mod orderbook;
pub mod report;
pub mod utils;
pub mod watch;

pub use config::Config;
pub use error::{AppError, Result};
