//! Market module for Probable prediction markets.
//!
//! This module handles:
//! - Market types and normalization
//! - Market discovery (paging the event listing)
//! - Order book HTTP client
//! - Mock book source for testing

pub mod client;
pub mod discovery;
pub mod mock;
pub mod types;

pub use client::{BookSource, OrderBookClient};
pub use discovery::DiscoveryService;
pub use mock::{MockBookSource, MockOrderBookBuilder};
pub use types::{sort_markets, Market, Outcome};
