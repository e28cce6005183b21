//! Order book types and data structures.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Which side of the book to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum BookSide {
    /// Buy orders; best is the highest price.
    Bids,
    /// Sell orders; best is the lowest price.
    Asks,
}

/// Order book snapshot as returned by the API.
///
/// Entries are kept as raw JSON so the exact payload at the best level can be
/// written back out, and so one malformed entry cannot fail the whole decode.
/// A book with neither side present means "no data".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    /// Bid entries (`{price, size}`), unordered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bids: Option<Vec<Value>>,
    /// Ask entries (`{price, size}`), unordered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asks: Option<Vec<Value>>,
}

impl OrderBook {
    /// Book with no sides at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether neither side was returned.
    pub fn is_empty(&self) -> bool {
        self.bids.is_none() && self.asks.is_none()
    }

    /// Entries for one side, if the side is present.
    pub fn side(&self, side: BookSide) -> Option<&[Value]> {
        match side {
            BookSide::Bids => self.bids.as_deref(),
            BookSide::Asks => self.asks.as_deref(),
        }
    }
}

/// Single parsed price level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceLevel {
    /// Price at this level.
    pub price: Decimal,
    /// Size available at this level.
    pub size: Decimal,
}

impl PriceLevel {
    /// Create a new price level.
    pub fn new(price: Decimal, size: Decimal) -> Self {
        Self { price, size }
    }

    /// Parse a raw `{price, size}` entry. Prices and sizes may be JSON strings or numbers.
    pub fn from_entry(entry: &Value) -> Option<Self> {
        let price = parse_decimal(entry.get("price")?)?;
        let size = parse_decimal(entry.get("size")?)?;
        Some(Self { price, size })
    }
}

/// Parse a decimal from a JSON string or number without going through `f64`.
pub fn parse_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Best price on one side of a book plus everything resting at exactly that price.
#[derive(Debug, Clone, PartialEq)]
pub struct BestLevel {
    /// Best price (lowest ask or highest bid).
    pub price: Decimal,
    /// Sum of sizes of every entry at exactly `price`.
    pub size: Decimal,
    /// Raw entries that make up the level, in book order.
    pub entries: Vec<Value>,
}

impl BestLevel {
    /// Dollar value available at this level (price × size). `None` on overflow.
    pub fn notional(&self) -> Option<Decimal> {
        self.price.checked_mul(self.size)
    }
}
