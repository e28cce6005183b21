//! Order book HTTP client.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::{FetchError, MarketError};
use crate::metrics;
use crate::orderbook::OrderBook;
use crate::utils::RetryPolicy;

/// Anything that can produce an order book snapshot for a token.
///
/// Implementations never fail: when no data can be obtained they return
/// [`OrderBook::empty`].
#[async_trait]
pub trait BookSource: Send + Sync {
    /// Fetch the current book for `token_id`.
    async fn fetch_book(&self, token_id: &str) -> OrderBook;
}

/// Public order book endpoint client with jittered retry.
#[derive(Debug, Clone)]
pub struct OrderBookClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Order book endpoint.
    book_url: String,
    /// Retry schedule for each fetch.
    retry: RetryPolicy,
}

impl OrderBookClient {
    /// Create an order book client from config.
    pub fn new(config: &Config) -> Result<Self, MarketError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .connect_timeout(std::time::Duration::from_secs(5))
            .tcp_nodelay(true)
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http,
            book_url: config.orderbook_api_url.clone(),
            retry: config.fetch_retry_policy(),
        })
    }

    /// Get the order book endpoint.
    pub fn book_url(&self) -> &str {
        &self.book_url
    }

    /// Fetch a book, retrying transient failures; an empty book means "no data".
    #[instrument(skip(self), fields(token_id = %token_id))]
    pub async fn fetch(&self, token_id: &str) -> OrderBook {
        let start = Instant::now();
        let result = self.retry.run("orderbook", || self.try_fetch(token_id)).await;
        metrics::record_orderbook_fetch_latency(start);

        match result {
            Ok(book) => book,
            Err(e) => {
                warn!(error = %e, "Giving up on order book, treating as empty");
                metrics::inc_orderbook_exhausted();
                OrderBook::empty()
            }
        }
    }

    /// One attempt, no retry.
    async fn try_fetch(&self, token_id: &str) -> Result<OrderBook, FetchError> {
        let response = self
            .http
            .get(&self.book_url)
            .query(&[("token_id", token_id)])
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::TOO_MANY_REQUESTS => {
                warn!(token_id, "Rate limit hit");
                return Err(FetchError::RateLimited);
            }
            status => {
                warn!(token_id, status = status.as_u16(), "Error fetching order book");
                return Err(FetchError::Status(status.as_u16()));
            }
        }

        let body = response.bytes().await?;
        let book: OrderBook =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        debug!(
            bids = book.bids.as_ref().map_or(0, Vec::len),
            asks = book.asks.as_ref().map_or(0, Vec::len),
            "Fetched order book"
        );

        Ok(book)
    }
}

#[async_trait]
impl BookSource for OrderBookClient {
    async fn fetch_book(&self, token_id: &str) -> OrderBook {
        self.fetch(token_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OrderBookClient {
        let config = Config {
            orderbook_api_url: format!("{}/book", server.uri()),
            fetch_base_delay_ms: 1,
            fetch_jitter_min_ms: 0,
            fetch_jitter_max_ms: 0,
            ..Config::default()
        };
        OrderBookClient::new(&config).unwrap()
    }

    #[test]
    fn client_creation_works() {
        let client = OrderBookClient::new(&Config::default()).unwrap();
        assert_eq!(client.book_url(), "https://api.probable.markets/public/api/v1/book");
    }

    #[tokio::test]
    async fn returns_book_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/book"))
            .and(query_param("token_id", "tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "asks": [{"price": "0.42", "size": "100"}],
                "bids": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let book = client(&server).fetch("tok-1").await;

        assert_eq!(book.asks.unwrap().len(), 1);
        assert_eq!(book.bids.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn retries_after_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/book"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/book"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"asks": []})))
            .expect(1)
            .mount(&server)
            .await;

        let book = client(&server).fetch("tok").await;

        assert_eq!(book.asks, Some(vec![]));
    }

    #[tokio::test]
    async fn exhaustion_yields_empty_book() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/book"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let book = client(&server).fetch("tok").await;

        assert!(book.is_empty());
    }

    #[tokio::test]
    async fn undecodable_body_counts_as_failed_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/book"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .expect(3)
            .mount(&server)
            .await;

        assert!(client(&server).fetch("tok").await.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_yields_empty_book() {
        let config = Config {
            orderbook_api_url: "http://127.0.0.1:9/book".to_string(),
            fetch_max_attempts: 2,
            fetch_base_delay_ms: 1,
            fetch_jitter_min_ms: 0,
            fetch_jitter_max_ms: 0,
            http_timeout_ms: 500,
            ..Config::default()
        };
        let client = OrderBookClient::new(&config).unwrap();

        assert!(client.fetch_book("tok").await.is_empty());
    }
}
