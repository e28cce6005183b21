//! Market-related types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// One side of a binary market.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Outcome {
    /// The "yes" leg (or the first outcome of a generic market).
    #[default]
    Yes,
    /// The "no" leg (or the second outcome of a generic market).
    No,
}

/// Normalized tradable market.
///
/// Token ids are empty strings when unknown; [`Market::token_pair`] treats
/// that as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    /// Parent event title.
    pub title: String,
    /// Parent event slug.
    pub event_slug: String,
    /// Market slug. Not guaranteed unique.
    pub market_slug: String,
    /// Public event page.
    pub url: String,
    /// Token for the yes leg.
    pub yes_token_id: String,
    /// Token for the no leg.
    pub no_token_id: String,
    /// Raw outcome label of the yes leg.
    pub yes_outcome: String,
    /// Raw outcome label of the no leg.
    pub no_outcome: String,
}

impl Market {
    /// Get the token ID for a given outcome, if known.
    pub fn token_id(&self, outcome: Outcome) -> Option<&str> {
        let id = match outcome {
            Outcome::Yes => &self.yes_token_id,
            Outcome::No => &self.no_token_id,
        };
        Some(id.as_str()).filter(|id| !id.is_empty())
    }

    /// Both token ids, or `None` if either is missing.
    pub fn token_pair(&self) -> Option<(&str, &str)> {
        Some((self.token_id(Outcome::Yes)?, self.token_id(Outcome::No)?))
    }

    /// Outcome label for a leg.
    pub fn outcome_label(&self, outcome: Outcome) -> &str {
        match outcome {
            Outcome::Yes => &self.yes_outcome,
            Outcome::No => &self.no_outcome,
        }
    }
}

/// Sort markets by `(title, market_slug)` so list indices are stable across runs.
///
/// The sort is stable: duplicate keys keep discovery order.
pub fn sort_markets(markets: &mut [Market]) {
    markets.sort_by(|a, b| {
        a.title
            .cmp(&b.title)
            .then_with(|| a.market_slug.cmp(&b.market_slug))
    });
}

/// Event as returned by the listing API.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    /// Event title.
    #[serde(default)]
    pub title: Option<String>,
    /// Event slug.
    #[serde(default)]
    pub slug: Option<String>,
    /// Nested markets; kept raw so bad entries can be skipped one by one.
    #[serde(default)]
    pub markets: Option<Vec<Value>>,
}

/// Market entry nested in an event.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketData {
    /// Market slug.
    #[serde(default)]
    pub market_slug: Option<String>,
    /// JSON-encoded array of CLOB token IDs.
    #[serde(rename = "clobTokenIds", default)]
    pub clob_token_ids: Option<Value>,
    /// JSON-encoded array of outcome labels.
    #[serde(default)]
    pub outcomes: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn market(title: &str, slug: &str) -> Market {
        Market {
            title: title.to_string(),
            market_slug: slug.to_string(),
            ..Market::default()
        }
    }

    #[test]
    fn outcome_label_follows_leg() {
        let m = Market {
            yes_outcome: "Democrat".to_string(),
            no_outcome: "Republican".to_string(),
            ..Market::default()
        };
        assert_eq!(m.outcome_label(Outcome::Yes), "Democrat");
        assert_eq!(m.outcome_label(Outcome::No), "Republican");
    }

    #[test]
    fn outcome_from_string_is_case_insensitive() {
        assert_eq!(Outcome::from_str("yes").unwrap(), Outcome::Yes);
        assert_eq!(Outcome::from_str("NO").unwrap(), Outcome::No);
        assert_eq!(Outcome::Yes.to_string(), "YES");
        assert!(Outcome::from_str("maybe").is_err());
    }

    #[test]
    fn token_pair_requires_both_ids() {
        let mut m = Market {
            yes_token_id: "y".to_string(),
            no_token_id: "n".to_string(),
            ..Market::default()
        };
        assert_eq!(m.token_pair(), Some(("y", "n")));

        m.no_token_id.clear();
        assert_eq!(m.token_pair(), None);
        assert_eq!(m.token_id(Outcome::Yes), Some("y"));
        assert_eq!(m.token_id(Outcome::No), None);
    }

    #[test]
    fn sort_is_by_title_then_slug_and_stable() {
        let mut markets = vec![
            market("B", "b-1"),
            market("A", "a-2"),
            market("A", "a-1"),
            market("A", "a-1"),
        ];
        markets[2].url = "first".to_string();
        markets[3].url = "second".to_string();

        sort_markets(&mut markets);

        let keys: Vec<_> = markets
            .iter()
            .map(|m| (m.title.as_str(), m.market_slug.as_str(), m.url.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![("A", "a-1", "first"), ("A", "a-1", "second"), ("A", "a-2", ""), ("B", "b-1", "")]
        );
    }
}
