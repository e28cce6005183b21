//! Best price level extraction.

use rust_decimal::Decimal;
use tracing::debug;

use super::types::{BestLevel, BookSide, OrderBook, PriceLevel};

/// Best level on `side` of `book`, with size aggregated across exact price ties.
///
/// Returns `None` when the side is missing or empty, when any entry on the
/// side fails to parse, or when the aggregated size overflows. A partially
/// malformed side is never aggregated.
pub fn best_level(book: &OrderBook, side: BookSide) -> Option<BestLevel> {
    let entries = book.side(side)?;
    if entries.is_empty() {
        return None;
    }

    let levels: Vec<PriceLevel> = match entries.iter().map(PriceLevel::from_entry).collect() {
        Some(levels) => levels,
        None => {
            debug!(%side, "Malformed entry in order book side");
            return None;
        }
    };

    let prices = levels.iter().map(|l| l.price);
    let price = match side {
        BookSide::Asks => prices.min()?,
        BookSide::Bids => prices.max()?,
    };

    let Some(size) = depth_at_price(&levels, price) else {
        debug!(%side, %price, "Size at best level overflows");
        return None;
    };
    let entries = entries
        .iter()
        .zip(&levels)
        .filter(|(_, level)| level.price == price)
        .map(|(raw, _)| raw.clone())
        .collect();

    Some(BestLevel {
        price,
        size,
        entries,
    })
}

/// Lowest ask level.
pub fn best_ask(book: &OrderBook) -> Option<BestLevel> {
    best_level(book, BookSide::Asks)
}

/// Highest bid level.
pub fn best_bid(book: &OrderBook) -> Option<BestLevel> {
    best_level(book, BookSide::Bids)
}

/// Get depth at a specific price level. `None` if the total overflows.
pub fn depth_at_price(levels: &[PriceLevel], price: Decimal) -> Option<Decimal> {
    levels
        .iter()
        .filter(|l| l.price == price)
        .try_fold(Decimal::ZERO, |total, l| total.checked_add(l.size))
}
