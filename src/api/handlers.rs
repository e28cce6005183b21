//! HTTP API handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::arbitrage::ScanOutcome;

/// Summary of the last completed scan cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleStatus {
    /// Cycles completed since startup.
    pub cycles: u64,
    /// Markets in the scan list.
    pub markets: usize,
    /// Markets with metrics this cycle.
    pub processed: usize,
    /// Markets skipped for a missing token id.
    pub skipped: usize,
    /// Slug of the market with the lowest sum.
    pub best_market: Option<String>,
    /// Best sum as a decimal string.
    pub best_sum: Option<String>,
    /// `GT1`, `EQ1` or `LT1` for the best sum.
    pub best_class: Option<String>,
    /// A scan alert was delivered.
    pub alerted: bool,
    /// When the cycle ended.
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
}

/// Application state shared with handlers.
#[derive(Clone, Default)]
pub struct AppState {
    /// Set once the first cycle has completed.
    pub ready: Arc<AtomicBool>,
    /// Last cycle summary.
    pub last_cycle: Arc<RwLock<Option<CycleStatus>>>,
    /// Prometheus renderer, when a recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the Prometheus handle served at `/metrics`.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Set ready state.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Record a finished cycle and mark the service ready.
    pub async fn record_cycle(&self, markets: usize, outcome: &ScanOutcome) {
        let mut last = self.last_cycle.write().await;
        let cycles = last.as_ref().map_or(0, |s| s.cycles) + 1;
        let best = outcome.report.best.as_ref();

        *last = Some(CycleStatus {
            cycles,
            markets,
            processed: outcome.report.results.len(),
            skipped: outcome.report.skipped,
            best_market: best.map(|b| b.metrics.market_slug.clone()),
            best_sum: best.map(|b| b.sum.to_string()),
            best_class: best.map(|b| b.class.to_string()),
            alerted: outcome.alerted,
            finished_at: OffsetDateTime::now_utc(),
        });
        drop(last);

        self.set_ready(true);
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether a cycle has completed.
    pub ready: bool,
}

/// Status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// "starting" until the first cycle completes, then "running".
    pub status: &'static str,
    /// Last cycle summary.
    pub last_cycle: Option<CycleStatus>,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 if ready, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let is_ready = state.is_ready();
    let response = ReadyResponse { ready: is_ready };

    if is_ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Status handler - returns the last cycle summary.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let last_cycle = state.last_cycle.read().await.clone();
    let status = if state.is_ready() { "running" } else { "starting" };

    Json(StatusResponse { status, last_cycle })
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.prometheus {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}
