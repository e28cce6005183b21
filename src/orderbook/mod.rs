//! Order book module.
//!
//! This module handles:
//! - Raw order book snapshots and parsed price levels
//! - Best bid / best ask extraction with size aggregation

pub mod aggregator;
pub mod types;

pub use aggregator::{best_ask, best_bid, best_level, depth_at_price};
pub use types::{BestLevel, BookSide, OrderBook, PriceLevel};
