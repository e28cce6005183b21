//! Unified error types for the order book scanner.

use thiserror::Error;

/// Unified error type for the scanner.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Market discovery error.
    #[error("market error: {0}")]
    Market(#[from] MarketError),

    /// Alert delivery error.
    #[error("alert error: {0}")]
    Alert(#[from] AlertError),

    /// Watch mode setup error.
    #[error("watch error: {0}")]
    Watch(#[from] WatchError),

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Market discovery errors.
#[derive(Error, Debug)]
pub enum MarketError {
    /// Discovery returned nothing usable.
    #[error("no markets discovered")]
    NoMarketsFound,

    /// A listing page could not be fetched.
    #[error("failed to fetch events at offset {offset}: {reason}")]
    FetchFailed {
        /// Page offset that failed.
        offset: usize,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to parse market data.
    #[error("failed to parse market data: {0}")]
    ParseError(String),

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Failure of a single order book fetch attempt.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The API asked us to slow down (HTTP 429).
    #[error("rate limited")]
    RateLimited,

    /// Non-success HTTP status.
    #[error("unexpected status {0}")]
    Status(u16),

    /// Connection, timeout or body read failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Body was not a valid order book.
    #[error("failed to decode order book: {0}")]
    Decode(String),
}

/// Telegram alert delivery errors.
#[derive(Error, Debug)]
pub enum AlertError {
    /// Bot token or chat id not configured.
    #[error("telegram token or chat_id missing")]
    MissingCredentials,

    /// Telegram answered with a non-200 status.
    #[error("telegram rejected message: status={status} response={body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Transport failure.
    #[error("telegram request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Watch mode validation errors.
#[derive(Error, Debug)]
pub enum WatchError {
    /// Index outside the discovered market list.
    #[error("invalid index {index}, valid range: 0-{max}")]
    InvalidIndex {
        /// Requested index.
        index: usize,
        /// Largest valid index.
        max: usize,
    },

    /// Required watch flag was not given.
    #[error("--{0} is required for watch mode")]
    MissingArgument(&'static str),

    /// Selected market has no token for the watched side.
    #[error("market {slug} has no token id for side {side}")]
    MissingToken {
        /// Market slug.
        slug: String,
        /// Watched side.
        side: String,
    },
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
