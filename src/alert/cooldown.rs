//! Minimum spacing between watch alerts.

use std::time::{Duration, Instant};

/// Allows an alert at most once per window. A zero window always allows.
///
/// Only [`AlertCooldown::arm`] starts a window; checking readiness never does.
#[derive(Debug, Clone)]
pub struct AlertCooldown {
    window: Duration,
    last_fired: Option<Instant>,
}

impl AlertCooldown {
    /// Cooldown with the given window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired: None,
        }
    }

    /// Whether an alert may fire at `now`.
    pub fn ready(&self, now: Instant) -> bool {
        if self.window.is_zero() {
            return true;
        }
        self.last_fired
            .map_or(true, |last| now.saturating_duration_since(last) >= self.window)
    }

    /// Record an alert fired at `now`.
    pub fn arm(&mut self, now: Instant) {
        self.last_fired = Some(now);
    }

    /// Time left before the next alert may fire.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last_fired {
            Some(last) if !self.window.is_zero() => {
                self.window.saturating_sub(now.saturating_duration_since(last))
            }
            _ => Duration::ZERO,
        }
    }
}
