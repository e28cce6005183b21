//! Cycle output: JSON lines records and terminal rendering.

pub mod jsonl;
pub mod pretty;
pub mod record;

pub use jsonl::JsonlWriter;
pub use record::{BestMarketRecord, MarketRecord};
