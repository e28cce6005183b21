//! In-memory book source for tests.
//!
//! Serves canned order books by token id without touching the network and
//! records every request so tests can assert on fan-out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use super::client::BookSource;
use crate::orderbook::OrderBook;

/// Builder for canned order books.
#[derive(Debug, Clone, Default)]
pub struct MockOrderBookBuilder {
    bids: Option<Vec<Value>>,
    asks: Option<Vec<Value>>,
}

impl MockOrderBookBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bid entry.
    pub fn bid(mut self, price: Decimal, size: Decimal) -> Self {
        self.bids
            .get_or_insert_with(Vec::new)
            .push(json!({"price": price.to_string(), "size": size.to_string()}));
        self
    }

    /// Add an ask entry.
    pub fn ask(mut self, price: Decimal, size: Decimal) -> Self {
        self.asks
            .get_or_insert_with(Vec::new)
            .push(json!({"price": price.to_string(), "size": size.to_string()}));
        self
    }

    /// Build the order book.
    pub fn build(self) -> OrderBook {
        OrderBook {
            bids: self.bids,
            asks: self.asks,
        }
    }
}

/// Mock book source for testing.
#[derive(Debug, Clone, Default)]
pub struct MockBookSource {
    /// Books by token ID; unknown tokens get an empty book.
    books: Arc<Mutex<HashMap<String, OrderBook>>>,
    /// Every token requested, in request order.
    requests: Arc<Mutex<Vec<String>>>,
    /// Simulated latency per fetch.
    latency: Duration,
    /// Fetches currently awaiting a response.
    in_flight: Arc<AtomicUsize>,
    /// Highest `in_flight` seen.
    peak: Arc<AtomicUsize>,
}

impl MockBookSource {
    /// Create a new mock source with no books.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock source that sleeps before answering.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// Set the book served for a token.
    pub fn set_book(&self, token_id: impl Into<String>, book: OrderBook) {
        if let Ok(mut books) = self.books.lock() {
            books.insert(token_id.into(), book);
        }
    }

    /// Tokens requested so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Most fetches that were in flight at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BookSource for MockBookSource {
    async fn fetch_book(&self, token_id: &str) -> OrderBook {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(token_id.to_string());
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.books
            .lock()
            .ok()
            .and_then(|books| books.get(token_id).cloned())
            .unwrap_or_default()
    }
}
