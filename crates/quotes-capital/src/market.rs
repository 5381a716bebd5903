//! Market data gateway: instrument lookup and price retrieval.

use crate::session::SessionManager;
use async_trait::async_trait;
use quotes_config::CapitalSettings;
use quotes_core::{Quote, QuoteError, QuoteResult, QuoteSource, SearchHit};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Wire shape of `GET /markets/{epic}`: the price sits in a nested snapshot.
#[derive(Debug, Deserialize)]
struct MarketDetails {
    snapshot: Option<MarketSnapshot>,
}

#[derive(Debug, Default, Deserialize)]
struct MarketSnapshot {
    bid: Option<Decimal>,
    offer: Option<Decimal>,
}

/// One entry of the free-text search response.
#[derive(Debug, Default, Deserialize)]
struct SearchMarket {
    epic: Option<String>,
    #[serde(rename = "instrumentName")]
    instrument_name: Option<String>,
    #[serde(rename = "instrumentType")]
    instrument_type: Option<String>,
}

/// Translates instrument codes into prices against the Capital.com API.
///
/// Holds a shared [`SessionManager`] and authenticates lazily: the first
/// operation (or any operation after the upstream rejects the tokens)
/// triggers a login. Nothing here is cached between calls.
pub struct MarketGateway {
    settings: CapitalSettings,
    session: Arc<SessionManager>,
    http: Client,
}

impl MarketGateway {
    /// Create a gateway over an existing session manager.
    pub fn new(settings: CapitalSettings, session: Arc<SessionManager>) -> QuoteResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| QuoteError::Transport(e.to_string()))?;

        Ok(Self {
            settings,
            session,
            http,
        })
    }

    /// Qualify a bare ticker with the default venue, exactly once.
    ///
    /// "GS" becomes "GS.US"; "GS.US" and "IX.D.DOW:IP" pass through untouched.
    pub fn normalize_epic(&self, code: &str) -> String {
        if code.contains('.') || code.contains(':') {
            code.to_string()
        } else {
            format!("{code}.{}", self.settings.default_venue)
        }
    }

    /// Authenticate if no session is active yet.
    async fn ensure_session(&self) -> QuoteResult<()> {
        if self.session.is_authenticated() {
            return Ok(());
        }
        self.session.authenticate().await
    }

    /// Issue an authenticated GET, re-authenticating once on a 401.
    ///
    /// Tokens expire upstream without notice; one refresh-and-retry fixes the
    /// common case while a second rejection still propagates to the caller.
    async fn get_authenticated(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> QuoteResult<reqwest::Response> {
        self.ensure_session().await?;
        let resp = self.send(url, query).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            warn!("upstream rejected session tokens, re-authenticating");
            self.session.authenticate().await?;
            return self.send(url, query).await;
        }
        Ok(resp)
    }

    async fn send(&self, url: &str, query: &[(&str, &str)]) -> QuoteResult<reqwest::Response> {
        let headers = self.session.request_headers()?;
        self.http
            .get(url)
            .headers(headers)
            .query(query)
            .send()
            .await
            .map_err(|e| QuoteError::Transport(e.to_string()))
    }
}

#[async_trait]
impl QuoteSource for MarketGateway {
    async fn quote(&self, epic: &str) -> QuoteResult<Quote> {
        let url = format!("{}/markets/{}", self.settings.base_url, epic);
        let resp = self.get_authenticated(&url, &[]).await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(QuoteError::UpstreamHttp { status, body });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| QuoteError::Transport(e.to_string()))?;
        let quote = parse_market_details(&body, epic)?;
        debug!(epic, bid = ?quote.bid, offer = ?quote.offer, "fetched quote");
        Ok(quote)
    }

    async fn price(&self, code: &str) -> QuoteResult<Decimal> {
        let epic = self.normalize_epic(code);
        let quote = self.quote(&epic).await?;
        quote.price().ok_or(QuoteError::PriceNotFound(epic))
    }

    async fn search(&self, term: &str, limit: usize) -> QuoteResult<Vec<SearchHit>> {
        let url = format!("{}/markets", self.settings.base_url);
        let resp = self.get_authenticated(&url, &[("searchTerm", term)]).await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(QuoteError::UpstreamHttp { status, body });
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| QuoteError::Transport(e.to_string()))?;
        parse_search_results(payload, limit)
    }

    fn name(&self) -> &str {
        "capital.com"
    }
}

/// Extract a [`Quote`] from the market details body.
///
/// A body that is not the expected record shape is reported as
/// `ShapeMismatch` with the raw payload; a record without a snapshot simply
/// yields an empty quote (the caller turns that into `PriceNotFound`).
fn parse_market_details(body: &str, epic: &str) -> QuoteResult<Quote> {
    let details: MarketDetails = serde_json::from_str(body).map_err(|_| {
        QuoteError::ShapeMismatch {
            payload: raw_payload(body),
        }
    })?;
    let snapshot = details.snapshot.unwrap_or_default();
    Ok(Quote::new(epic, snapshot.bid, snapshot.offer))
}

/// Accept the two shapes the vendor is known to answer with: a bare list of
/// markets, or a record with a `markets` list. Anything else is a
/// `ShapeMismatch` carrying the payload for diagnostics.
fn parse_search_results(payload: Value, limit: usize) -> QuoteResult<Vec<SearchHit>> {
    let entries = match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("markets") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(QuoteError::ShapeMismatch {
                    payload: Value::Object(map),
                })
            }
        },
        other => return Err(QuoteError::ShapeMismatch { payload: other }),
    };

    let hits = entries
        .into_iter()
        .take(limit)
        .map(|item| {
            let market: SearchMarket = serde_json::from_value(item).unwrap_or_default();
            SearchHit {
                epic: market.epic.unwrap_or_default(),
                name: market.instrument_name.unwrap_or_default(),
                instrument_type: market.instrument_type.unwrap_or_default(),
            }
        })
        .collect();
    Ok(hits)
}

fn raw_payload(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn gateway() -> MarketGateway {
        gateway_with(CapitalSettings::default(), None)
    }

    fn gateway_with(
        settings: CapitalSettings,
        credentials: Option<crate::Credentials>,
    ) -> MarketGateway {
        let session = Arc::new(SessionManager::new(settings.clone(), credentials).unwrap());
        MarketGateway::new(settings, session).unwrap()
    }

    #[test]
    fn bare_ticker_gets_the_default_venue() {
        assert_eq!(gateway().normalize_epic("GS"), "GS.US");
    }

    #[test]
    fn qualified_codes_pass_through_unchanged() {
        let gateway = gateway();
        assert_eq!(gateway.normalize_epic("GS.US"), "GS.US");
        assert_eq!(gateway.normalize_epic("IX.D.DOW"), "IX.D.DOW");
        assert_eq!(gateway.normalize_epic("GS:US"), "GS:US");
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_price_request() {
        // an unroutable base_url would surface as Transport if a request were
        // ever attempted; the error kind proves the short-circuit
        let settings = CapitalSettings {
            base_url: "http://127.0.0.1:0".to_string(),
            ..CapitalSettings::default()
        };
        let gateway = gateway_with(settings, None);

        let err = gateway.price("GS").await.unwrap_err();
        assert!(matches!(err, QuoteError::AuthenticationFailed(_)));
    }

    #[test]
    fn market_details_with_both_sides() {
        let body = r#"{"instrument":{"epic":"GS.US"},"snapshot":{"bid":825.4,"offer":825.6,"marketStatus":"TRADEABLE"}}"#;
        let quote = parse_market_details(body, "GS.US").unwrap();
        assert_eq!(quote.bid, Some(dec!(825.4)));
        assert_eq!(quote.offer, Some(dec!(825.6)));
        assert_eq!(quote.price(), Some(dec!(825.50)));
    }

    #[test]
    fn market_details_without_snapshot_is_an_empty_quote() {
        let quote = parse_market_details(r#"{"instrument":{}}"#, "GS.US").unwrap();
        assert_eq!(quote.price(), None);
    }

    #[test]
    fn market_details_that_are_not_json_mismatch() {
        let err = parse_market_details("<html>maintenance</html>", "GS.US").unwrap_err();
        assert!(matches!(err, QuoteError::ShapeMismatch { .. }));
    }

    fn fixture_markets(count: usize) -> Vec<Value> {
        (0..count)
            .map(|i| {
                json!({
                    "epic": format!("MSFT{i}.US"),
                    "instrumentName": format!("Microsoft {i}"),
                    "instrumentType": "SHARES",
                })
            })
            .collect()
    }

    #[test]
    fn search_accepts_a_bare_list() {
        let hits = parse_search_results(Value::Array(fixture_markets(3)), 10).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].epic, "MSFT0.US");
        assert_eq!(hits[0].name, "Microsoft 0");
        assert_eq!(hits[0].instrument_type, "SHARES");
    }

    #[test]
    fn search_accepts_a_markets_record() {
        let payload = json!({ "markets": fixture_markets(3) });
        let hits = parse_search_results(payload, 10).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn search_truncates_to_the_limit_in_vendor_order() {
        let hits = parse_search_results(Value::Array(fixture_markets(15)), 10).unwrap();
        assert_eq!(hits.len(), 10);
        assert_eq!(hits[9].epic, "MSFT9.US");
    }

    #[test]
    fn search_rejects_other_shapes_with_the_payload() {
        let payload = json!({ "errorCode": "error.invalid.details" });
        let err = parse_search_results(payload, 10).unwrap_err();
        match err {
            QuoteError::ShapeMismatch { payload } => {
                assert_eq!(payload["errorCode"], "error.invalid.details");
            }
            other => panic!("expected ShapeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn search_tolerates_entries_with_missing_fields() {
        let payload = json!([{ "instrumentName": "Mystery" }]);
        let hits = parse_search_results(payload, 10).unwrap();
        assert_eq!(hits[0].epic, "");
        assert_eq!(hits[0].name, "Mystery");
    }
}
