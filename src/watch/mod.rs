//! Watch mode: poll one token's best bid against a trigger.

pub mod trigger;

use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::alert::{message, AlertCooldown, TelegramNotifier};
use crate::error::WatchError;
use crate::market::{BookSource, Market, Outcome};
use crate::metrics;
use crate::report::pretty;
use crate::utils::sleep_or_shutdown;

pub use trigger::{TriggerOp, WatchObservation, WatchStatus};

/// The market side being watched.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchTarget {
    /// Market picked from the sorted list.
    pub market: Market,
    /// Watched leg.
    pub side: Outcome,
    /// Token of that leg.
    pub token_id: String,
}

/// Pick market `index` of the sorted list and resolve the token for `side`.
pub fn select_target(markets: &[Market], index: usize, side: Outcome) -> Result<WatchTarget, WatchError> {
    let market = markets.get(index).ok_or(WatchError::InvalidIndex {
        index,
        max: markets.len().saturating_sub(1),
    })?;

    let token_id = market.token_id(side).ok_or_else(|| WatchError::MissingToken {
        slug: market.market_slug.clone(),
        side: side.to_string(),
    })?;

    Ok(WatchTarget {
        token_id: token_id.to_string(),
        market: market.clone(),
        side,
    })
}

/// Watch loop settings.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    /// Price the best bid is compared against.
    pub trigger_price: Decimal,
    /// Comparison applied as `best_bid <op> trigger_price`.
    pub op: TriggerOp,
    /// Minimum spacing between alerts; zero always allows.
    pub cooldown: Duration,
    /// Time between tick starts.
    pub interval: Duration,
    /// Stop after the first tick.
    pub once: bool,
    /// Print colored rows instead of log lines.
    pub pretty: bool,
}

/// Polls the watched token and alerts on trigger.
pub struct Watcher<S> {
    source: S,
    target: WatchTarget,
    settings: WatchSettings,
    notifier: TelegramNotifier,
    cooldown: AlertCooldown,
}

impl<S: BookSource> Watcher<S> {
    /// Create a watcher.
    pub fn new(source: S, target: WatchTarget, settings: WatchSettings, notifier: TelegramNotifier) -> Self {
        let cooldown = AlertCooldown::new(settings.cooldown);
        Self {
            source,
            target,
            settings,
            notifier,
            cooldown,
        }
    }

    /// Log the watch parameters.
    pub fn announce(&self) {
        info!("WATCH MODE STARTED");
        info!("Market: {}", self.target.market.title);
        info!("ID:     {}", self.target.market.market_slug);
        info!(
            "Side:   {} ({})",
            self.target.side,
            self.target.market.outcome_label(self.target.side)
        );
        info!("Trigger: BUY1 {} {}", self.settings.op, self.settings.trigger_price);
    }

    /// Fetch once, report, and alert if triggered.
    pub async fn tick(&mut self) -> WatchObservation {
        let book = self.source.fetch_book(&self.target.token_id).await;
        let obs = WatchObservation::from_book(&book, self.settings.op, self.settings.trigger_price);

        let clock = chrono::Local::now().format("%H:%M:%S").to_string();
        if self.settings.pretty {
            println!("{}", pretty::watch_row(&clock, &obs));
        } else {
            info!(
                "[{clock}] Status={} Price={} Diff={} Notional=${}",
                obs.status,
                pretty::fmt_opt(obs.price, 4),
                obs.diff.map_or_else(|| "N/A".to_string(), |d| pretty::fmt_signed(d, 4)),
                pretty::fmt_opt(obs.notional, 2)
            );
        }

        if obs.triggered() {
            self.maybe_alert(&obs, Instant::now()).await;
        }

        obs
    }

    /// Send a watch alert unless the cooldown blocks it. Returns whether one was sent.
    ///
    /// Only an attempted delivery arms the cooldown.
    pub async fn maybe_alert(&mut self, obs: &WatchObservation, now: Instant) -> bool {
        let (Some(price), Some(notional)) = (obs.price, obs.notional) else {
            return false;
        };

        if !self.cooldown.ready(now) {
            debug!(remaining = ?self.cooldown.remaining(now), "Alert suppressed by cooldown");
            metrics::inc_alerts_skipped("cooldown");
            return false;
        }

        if !self.notifier.has_credentials() {
            warn!("Triggered but TG not configured.");
            metrics::inc_alerts_skipped("missing_credentials");
            return false;
        }

        let text = message::watch_alert(
            &self.target.market,
            self.target.side,
            price,
            self.settings.op,
            self.settings.trigger_price,
            notional,
        );

        info!("Sending Telegram Alert...");
        let delivered = self.notifier.notify(&text).await;
        self.cooldown.arm(now);
        delivered
    }

    /// Tick every interval until shutdown, or once with `once`.
    pub async fn run(&mut self, shutdown: &mut watch::Receiver<bool>) {
        self.announce();

        loop {
            let started = Instant::now();
            self.tick().await;

            if self.settings.once {
                break;
            }

            let sleep = self.settings.interval.saturating_sub(started.elapsed());
            if sleep_or_shutdown(sleep, shutdown).await {
                info!("Watch stopped");
                break;
            }
        }
    }
}
