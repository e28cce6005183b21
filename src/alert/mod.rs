//! Telegram alerting.
//!
//! This module handles:
//! - Message delivery through the Bot API
//! - Scan and watch alert bodies
//! - Watch alert cooldown

pub mod cooldown;
pub mod message;
pub mod telegram;

pub use cooldown::AlertCooldown;
pub use telegram::TelegramNotifier;
