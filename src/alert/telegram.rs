//! Telegram Bot API delivery.

use std::net::{IpAddr, Ipv4Addr};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::AlertError;
use crate::metrics;

/// Proxy variables reqwest picks up from the environment.
const PROXY_VARS: [&str; 4] = ["HTTPS_PROXY", "https_proxy", "HTTP_PROXY", "http_proxy"];

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

/// Sends Markdown messages to one Telegram chat.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
    chat_id: Option<String>,
}

impl TelegramNotifier {
    /// Create a notifier. Missing credentials are allowed; sends then fail with
    /// [`AlertError::MissingCredentials`].
    pub fn new(config: &Config) -> Result<Self, AlertError> {
        // IPv4 only.
        let http = reqwest::Client::builder()
            .timeout(config.alert_timeout())
            .local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
            .build()?;

        let (token, chat_id) = match config.telegram_credentials() {
            Some((token, chat_id)) => (Some(token.to_string()), Some(chat_id.to_string())),
            None => (None, None),
        };

        Ok(Self {
            http,
            api_url: config.telegram_api_url.trim_end_matches('/').to_string(),
            token,
            chat_id,
        })
    }

    /// True when both token and chat id are set.
    pub fn has_credentials(&self) -> bool {
        self.token.is_some() && self.chat_id.is_some()
    }

    /// Send one message. Not retried.
    #[instrument(skip_all)]
    pub async fn send(&self, text: &str) -> Result<(), AlertError> {
        let (Some(token), Some(chat_id)) = (&self.token, &self.chat_id) else {
            return Err(AlertError::MissingCredentials);
        };

        let proxy = detect_proxy();
        info!("Telegram proxy detected: {}", proxy.is_some());
        if let Some(proxy) = &proxy {
            debug!(proxy = %proxy, "Using proxy");
        }

        let url = format!("{}/bot{token}/sendMessage", self.api_url);
        let response = self
            .http
            .post(&url)
            .json(&SendMessage {
                chat_id,
                text,
                parse_mode: "Markdown",
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AlertError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Telegram message delivered");
        Ok(())
    }

    /// Send and log the outcome. Returns whether the message was delivered.
    pub async fn notify(&self, text: &str) -> bool {
        match self.send(text).await {
            Ok(()) => {
                metrics::inc_alerts_sent();
                true
            }
            Err(AlertError::MissingCredentials) => {
                warn!("TG_BOT_TOKEN or TG_CHAT_ID is missing, skipping alert");
                metrics::inc_alerts_skipped("missing_credentials");
                false
            }
            Err(e) => {
                warn!(error = %e, "Failed to send Telegram alert");
                metrics::inc_alerts_failed();
                false
            }
        }
    }
}

/// First proxy URL set in the environment, if any.
pub fn detect_proxy() -> Option<String> {
    PROXY_VARS
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
}
