//! Market discovery: pages the event listing and normalizes binary markets.

use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use super::types::{EventData, Market, MarketData};
use crate::config::Config;
use crate::error::MarketError;
use crate::metrics;

/// Events requested per listing page.
pub const PAGE_SIZE: usize = 100;

/// The listing API rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.114 Safari/537.36";

/// Discovers tradable markets from the event listing endpoint.
#[derive(Debug, Clone)]
pub struct DiscoveryService {
    http: reqwest::Client,
    events_url: String,
    event_base_url: String,
}

impl DiscoveryService {
    /// Create a discovery service from config.
    pub fn new(config: &Config) -> Result<Self, MarketError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.http_timeout())
            .build()?;

        Ok(Self {
            http,
            events_url: config.discovery_api_url.clone(),
            event_base_url: config.event_base_url.clone(),
        })
    }

    /// Page through open events by descending volume and collect binary markets.
    ///
    /// `max_markets` caps the number of markets returned (`None` or `Some(0)`
    /// means unbounded). A failed page ends discovery early; whatever was
    /// collected so far is returned.
    #[instrument(skip(self))]
    pub async fn discover(&self, max_markets: Option<usize>) -> Vec<Market> {
        let limit = max_markets.filter(|&n| n > 0);
        let mut markets = Vec::new();
        let mut offset = 0;

        info!("Starting market discovery...");

        loop {
            if limit.is_some_and(|n| markets.len() >= n) {
                break;
            }

            let events = match self.fetch_page(offset).await {
                Ok(events) => events,
                Err(e) => {
                    error!(error = %e, "Discovery failed");
                    break;
                }
            };

            if events.is_empty() {
                info!("No more events returned");
                break;
            }

            if collect_page(&events, &self.event_base_url, limit, &mut markets) {
                break;
            }

            if events.len() < PAGE_SIZE {
                info!(returned = events.len(), "Reached end of list (returned count < limit)");
                break;
            }

            offset += PAGE_SIZE;
        }

        info!(count = markets.len(), "Discovered markets");
        markets
    }

    async fn fetch_page(&self, offset: usize) -> Result<Vec<Value>, MarketError> {
        info!(offset, limit = PAGE_SIZE, "Fetching events");

        let limit = PAGE_SIZE.to_string();
        let offset_param = offset.to_string();
        let start = Instant::now();

        let response = self
            .http
            .get(&self.events_url)
            .query(&[
                ("closed", "false"),
                ("related_tags", "true"),
                ("sort", "volume"),
                ("order", "desc"),
                ("limit", limit.as_str()),
                ("offset", offset_param.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MarketError::FetchFailed {
                offset,
                reason: format!("HTTP {}", response.status()),
            });
        }

        let events = response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| MarketError::ParseError(format!("Failed to parse events page: {}", e)))?;

        metrics::record_discovery_page_latency(start);
        Ok(events)
    }
}

/// Append the markets of one page to `out`, stopping at `limit`.
///
/// Returns `true` once `out` holds `limit` markets.
pub fn collect_page(
    events: &[Value],
    event_base_url: &str,
    limit: Option<usize>,
    out: &mut Vec<Market>,
) -> bool {
    let full = |len: usize| limit.is_some_and(|n| len >= n);

    for raw_event in events {
        if full(out.len()) {
            return true;
        }

        let event: EventData = match serde_json::from_value(raw_event.clone()) {
            Ok(event) => event,
            Err(e) => {
                debug!(error = %e, "Skipping malformed event");
                continue;
            }
        };

        for raw_market in event.markets.iter().flatten() {
            if full(out.len()) {
                return true;
            }
            if let Some(market) = normalize_market(&event, raw_market, event_base_url) {
                out.push(market);
            }
        }
    }

    full(out.len())
}

/// Turn one nested market entry into a [`Market`].
///
/// Only markets whose `clobTokenIds` and `outcomes` both decode to
/// two-element arrays are accepted.
pub fn normalize_market(event: &EventData, raw: &Value, event_base_url: &str) -> Option<Market> {
    let data: MarketData = serde_json::from_value(raw.clone()).ok()?;

    let tokens = decode_string_array(data.clob_token_ids.as_ref()?)?;
    let outcomes = decode_string_array(data.outcomes.as_ref()?)?;

    let Ok([token_0, token_1]) = <[String; 2]>::try_from(tokens) else {
        debug!(market_slug = ?data.market_slug, "Skipping market without exactly two tokens");
        return None;
    };
    let Ok([outcome_0, outcome_1]) = <[String; 2]>::try_from(outcomes) else {
        debug!(market_slug = ?data.market_slug, "Skipping market without exactly two outcomes");
        return None;
    };

    // Neither label says "yes" on generic A-vs-B markets; index 0 then stands
    // in for yes. The resulting yes/no naming carries no meaning there.
    let ((yes_token_id, yes_outcome), (no_token_id, no_outcome)) =
        if !outcome_0.eq_ignore_ascii_case("yes") && outcome_1.eq_ignore_ascii_case("yes") {
            ((token_1, outcome_1), (token_0, outcome_0))
        } else {
            ((token_0, outcome_0), (token_1, outcome_1))
        };

    let event_slug = event.slug.clone().unwrap_or_default();

    Some(Market {
        title: event.title.clone().unwrap_or_default(),
        url: event_url(event_base_url, &event_slug),
        event_slug,
        market_slug: data.market_slug.unwrap_or_default(),
        yes_token_id,
        no_token_id,
        yes_outcome,
        no_outcome,
    })
}

/// Decode a JSON-encoded string array such as `"[\"A\",\"B\"]"`.
///
/// Non-string elements are kept in their JSON text form.
pub fn decode_string_array(value: &Value) -> Option<Vec<String>> {
    let Value::String(encoded) = value else {
        return None;
    };
    let items: Vec<Value> = serde_json::from_str(encoded).ok()?;
    Some(
        items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
    )
}

/// Public page URL for an event slug.
pub fn event_url(base: &str, slug: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BASE: &str = "https://probable.markets/event/";

    fn event(slug: &str, markets: Value) -> EventData {
        serde_json::from_value(json!({"title": format!("Title {slug}"), "slug": slug, "markets": markets}))
            .unwrap()
    }

    fn raw_event(i: usize) -> Value {
        json!({
            "title": format!("Event {i}"),
            "slug": format!("event-{i}"),
            "markets": [{
                "market_slug": format!("market-{i}"),
                "clobTokenIds": format!("[\"y{i}\",\"n{i}\"]"),
                "outcomes": "[\"Yes\",\"No\"]"
            }]
        })
    }

    fn page(range: std::ops::Range<usize>) -> Value {
        Value::Array(range.map(raw_event).collect())
    }

    fn service(server: &MockServer) -> DiscoveryService {
        let config = Config {
            discovery_api_url: format!("{}/events", server.uri()),
            ..Config::default()
        };
        DiscoveryService::new(&config).unwrap()
    }

    #[test]
    fn generic_outcomes_map_index_zero_to_yes() {
        let ev = event(
            "election",
            json!([{
                "market_slug": "winner",
                "clobTokenIds": "[\"A\",\"B\"]",
                "outcomes": "[\"Democrat\",\"Republican\"]"
            }]),
        );
        let raw = &ev.markets.as_ref().unwrap()[0];
        let market = normalize_market(&ev, raw, BASE).unwrap();

        assert_eq!(
            market,
            Market {
                title: "Title election".to_string(),
                event_slug: "election".to_string(),
                market_slug: "winner".to_string(),
                url: "https://probable.markets/event/election".to_string(),
                yes_token_id: "A".to_string(),
                no_token_id: "B".to_string(),
                yes_outcome: "Democrat".to_string(),
                no_outcome: "Republican".to_string(),
            }
        );
    }

    #[test]
    fn yes_label_at_index_one_swaps_tokens() {
        let ev = event(
            "swap",
            json!([{"market_slug": "m", "clobTokenIds": "[\"t0\",\"t1\"]", "outcomes": "[\"No\",\"YES\"]"}]),
        );
        let market = normalize_market(&ev, &ev.markets.as_ref().unwrap()[0], BASE).unwrap();

        assert_eq!(market.yes_token_id, "t1");
        assert_eq!(market.no_token_id, "t0");
        assert_eq!(market.yes_outcome, "YES");
        assert_eq!(market.no_outcome, "No");
    }

    #[test]
    fn malformed_markets_are_skipped() {
        let markets = json!([
            {"market_slug": "three", "clobTokenIds": "[\"a\",\"b\",\"c\"]", "outcomes": "[\"Yes\",\"No\"]"},
            {"market_slug": "bad-json", "clobTokenIds": "[a,b", "outcomes": "[\"Yes\",\"No\"]"},
            {"market_slug": "no-outcomes", "clobTokenIds": "[\"a\",\"b\"]"},
            {"market_slug": "not-a-string", "clobTokenIds": ["a", "b"], "outcomes": "[\"Yes\",\"No\"]"},
            "garbage",
            {"market_slug": "ok", "clobTokenIds": "[\"a\",\"b\"]", "outcomes": "[\"Yes\",\"No\"]"}
        ]);
        let events = vec![json!({"title": "T", "slug": "s", "markets": markets}), json!(42)];

        let mut out = Vec::new();
        let full = collect_page(&events, BASE, None, &mut out);

        assert!(!full);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].market_slug, "ok");
    }

    #[test]
    fn collect_page_stops_mid_event_at_limit() {
        let markets = json!([
            {"market_slug": "a", "clobTokenIds": "[\"1\",\"2\"]", "outcomes": "[\"Yes\",\"No\"]"},
            {"market_slug": "b", "clobTokenIds": "[\"3\",\"4\"]", "outcomes": "[\"Yes\",\"No\"]"},
            {"market_slug": "c", "clobTokenIds": "[\"5\",\"6\"]", "outcomes": "[\"Yes\",\"No\"]"}
        ]);
        let events = vec![json!({"title": "T", "slug": "s", "markets": markets})];

        let mut out = Vec::new();
        assert!(collect_page(&events, BASE, Some(2), &mut out));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn decode_string_array_requires_encoded_string() {
        assert_eq!(
            decode_string_array(&json!("[\"a\", 7]")),
            Some(vec!["a".to_string(), "7".to_string()])
        );
        assert_eq!(decode_string_array(&json!(["a", "b"])), None);
        assert_eq!(decode_string_array(&json!("{}")), None);
    }

    #[test]
    fn event_url_joins_without_double_slash() {
        assert_eq!(event_url(BASE, "x"), "https://probable.markets/event/x");
        assert_eq!(event_url("https://h/event", "x"), "https://h/event/x");
    }

    #[tokio::test]
    async fn paginates_until_short_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .and(query_param("offset", "0"))
            .and(query_param("limit", "100"))
            .and(query_param("closed", "false"))
            .and(query_param("related_tags", "true"))
            .and(query_param("sort", "volume"))
            .and(query_param("order", "desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(0..100)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .and(query_param("offset", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(100..103)))
            .expect(1)
            .mount(&server)
            .await;

        let markets = service(&server).discover(Some(500)).await;

        assert_eq!(markets.len(), 103);
        assert_eq!(markets[102].market_slug, "market-102");
    }

    #[tokio::test]
    async fn stops_mid_page_once_limit_is_reached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(0..100)))
            .expect(1)
            .mount(&server)
            .await;

        let markets = service(&server).discover(Some(5)).await;

        assert_eq!(markets.len(), 5);
        assert_eq!(markets[4].market_slug, "market-4");
    }

    #[tokio::test]
    async fn empty_page_terminates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        assert!(service(&server).discover(None).await.is_empty());
    }

    #[tokio::test]
    async fn page_failure_returns_partial_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(0..100)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .and(query_param("offset", "100"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let markets = service(&server).discover(None).await;

        assert_eq!(markets.len(), 100);
    }

    #[tokio::test]
    async fn zero_limit_means_unbounded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(0..7)))
            .mount(&server)
            .await;

        assert_eq!(service(&server).discover(Some(0)).await.len(), 7);
    }
}
