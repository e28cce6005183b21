//! Application configuration loaded from environment variables.

use std::time::Duration;

use serde::Deserialize;

use crate::utils::retry::RetryPolicy;

/// Application configuration loaded from environment variables.
///
/// Built once at startup and passed by reference into every component
/// constructor. Nothing reads the environment after this point.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Endpoints ===
    /// Event listing endpoint used by market discovery.
    #[serde(default = "default_discovery_url")]
    pub discovery_api_url: String,

    /// Order book endpoint (`?token_id=` is appended).
    #[serde(default = "default_orderbook_url")]
    pub orderbook_api_url: String,

    /// Public event page base; the event slug is joined onto it.
    #[serde(default = "default_event_base_url")]
    pub event_base_url: String,

    /// Telegram Bot API base URL.
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,

    // === Telegram Credentials ===
    /// Telegram bot token.
    #[serde(default)]
    pub tg_bot_token: Option<String>,

    /// Telegram chat id to post alerts into.
    #[serde(default)]
    pub tg_chat_id: Option<String>,

    // === HTTP ===
    /// Per-request timeout for discovery and order book calls.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_ms: u64,

    /// Timeout for a Telegram delivery.
    #[serde(default = "default_alert_timeout")]
    pub alert_timeout_ms: u64,

    // === Order Book Retry ===
    /// Attempts per order book fetch.
    #[serde(default = "default_max_attempts")]
    pub fetch_max_attempts: u32,

    /// First backoff delay; doubles after every failed attempt.
    #[serde(default = "default_base_delay")]
    pub fetch_base_delay_ms: u64,

    /// Lower bound of the pre-request jitter.
    #[serde(default = "default_jitter_min")]
    pub fetch_jitter_min_ms: u64,

    /// Upper bound of the pre-request jitter.
    #[serde(default = "default_jitter_max")]
    pub fetch_jitter_max_ms: u64,

    // === Scanning ===
    /// Markets processed concurrently per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

fn default_discovery_url() -> String {
    "https://market-api.probable.markets/public/api/v1/events".to_string()
}

fn default_orderbook_url() -> String {
    "https://api.probable.markets/public/api/v1/book".to_string()
}

fn default_event_base_url() -> String {
    "https://probable.markets/event/".to_string()
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_http_timeout() -> u64 {
    10_000
}

fn default_alert_timeout() -> u64 {
    30_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    500
}

fn default_jitter_min() -> u64 {
    50
}

fn default_jitter_max() -> u64 {
    150
}

fn default_batch_size() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discovery_api_url: default_discovery_url(),
            orderbook_api_url: default_orderbook_url(),
            event_base_url: default_event_base_url(),
            telegram_api_url: default_telegram_api_url(),
            tg_bot_token: None,
            tg_chat_id: None,
            http_timeout_ms: default_http_timeout(),
            alert_timeout_ms: default_alert_timeout(),
            fetch_max_attempts: default_max_attempts(),
            fetch_base_delay_ms: default_base_delay(),
            fetch_jitter_min_ms: default_jitter_min(),
            fetch_jitter_max_ms: default_jitter_max(),
            batch_size: default_batch_size(),
            rust_log: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("DISCOVERY_API_URL", &self.discovery_api_url),
            ("ORDERBOOK_API_URL", &self.orderbook_api_url),
            ("EVENT_BASE_URL", &self.event_base_url),
            ("TELEGRAM_API_URL", &self.telegram_api_url),
        ] {
            if url::Url::parse(value).is_err() {
                return Err(format!("{name} must be an absolute URL, got {value:?}"));
            }
        }

        if self.fetch_max_attempts == 0 {
            return Err("FETCH_MAX_ATTEMPTS must be at least 1".to_string());
        }

        if self.fetch_jitter_min_ms > self.fetch_jitter_max_ms {
            return Err("FETCH_JITTER_MIN_MS must not exceed FETCH_JITTER_MAX_MS".to_string());
        }

        if self.batch_size == 0 {
            return Err("BATCH_SIZE must be at least 1".to_string());
        }

        Ok(())
    }

    /// Apply CLI-provided Telegram credentials. CLI wins over env and `.env`.
    pub fn with_telegram_overrides(mut self, token: Option<String>, chat_id: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.tg_bot_token = Some(token);
        }
        if let Some(chat_id) = chat_id.filter(|c| !c.is_empty()) {
            self.tg_chat_id = Some(chat_id);
        }
        self
    }

    /// Both Telegram credentials, if present and non-empty.
    pub fn telegram_credentials(&self) -> Option<(&str, &str)> {
        let token = self.tg_bot_token.as_deref().filter(|t| !t.is_empty())?;
        let chat_id = self.tg_chat_id.as_deref().filter(|c| !c.is_empty())?;
        Some((token, chat_id))
    }

    /// Per-request HTTP timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// Telegram delivery timeout.
    pub fn alert_timeout(&self) -> Duration {
        Duration::from_millis(self.alert_timeout_ms)
    }

    /// Retry policy for order book fetches.
    pub fn fetch_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.fetch_max_attempts,
            Duration::from_millis(self.fetch_base_delay_ms),
            Duration::from_millis(self.fetch_jitter_min_ms),
            Duration::from_millis(self.fetch_jitter_max_ms),
        )
    }
}
