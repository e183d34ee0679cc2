use super::{build_client, record_call, FeedErrorKind};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Instant;
use tickerdash_domain::repositories::price_feed::PriceFeed;
use tickerdash_domain::value_objects::quote::PriceQuote;
use tickerdash_domain::value_objects::symbol::Symbol;
use tracing::Instrument;

/// Dashboard backend: `GET {base_url}/current_price/{symbol}`.
pub struct BackendPriceFeed {
    base_url: String,
    timeout_ms: u64,
    client: Client,
}

impl BackendPriceFeed {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Result<Self, String> {
        Ok(Self {
            base_url: base_url.into(),
            timeout_ms,
            client: build_client(timeout_ms)?,
        })
    }

    /// The symbol is one percent-encoded path segment.
    pub fn endpoint(&self, symbol: &Symbol) -> Result<Url, String> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| format!("invalid price backend url {}: {err}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| format!("price backend url cannot take a path: {}", self.base_url))?
            .pop_if_empty()
            .push("current_price")
            .push(symbol.as_str());
        Ok(url)
    }

    async fn fetch(&self, endpoint: Url) -> Result<PriceQuote, (FeedErrorKind, String)> {
        let resp = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(|err| {
                (
                    FeedErrorKind::Transport,
                    format!("price request failed: {}", err.without_url()),
                )
            })?;
        let status = resp.status();
        if !status.is_success() {
            return Err((
                FeedErrorKind::HttpStatus,
                format!("price backend http error: status {}", status.as_u16()),
            ));
        }
        let body = resp
            .text()
            .await
            .map_err(|err| {
                (
                    FeedErrorKind::Transport,
                    format!("failed to read price body: {}", err.without_url()),
                )
            })?;
        parse_quote(&body).map_err(|err| (FeedErrorKind::Decode, err))
    }
}

/// `{"symbol": "AAPL", "price": 187.5}`; `price` may be `null` or absent.
pub fn parse_quote(body: &str) -> Result<PriceQuote, String> {
    serde_json::from_str(body).map_err(|err| format!("failed to parse price response: {err}"))
}

#[async_trait]
impl PriceFeed for BackendPriceFeed {
    async fn current_price(&self, symbol: &Symbol) -> Result<PriceQuote, String> {
        let endpoint = self.endpoint(symbol)?;
        let span = tracing::info_span!(
            "infra.feed.backend",
            symbol = %symbol,
            endpoint = %endpoint,
            timeout_ms = self.timeout_ms
        );
        async {
            let start = Instant::now();
            let result = self.fetch(endpoint).await;
            record_call("backend", start, &result);
            result.map_err(|(_, err)| err)
        }
        .instrument(span)
        .await
    }
}
