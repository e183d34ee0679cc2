use super::{build_client, record_call, FeedErrorKind};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Instant;
use tickerdash_domain::repositories::price_feed::PriceFeed;
use tickerdash_domain::value_objects::quote::PriceQuote;
use tickerdash_domain::value_objects::symbol::Symbol;
use tracing::Instrument;

/// Alpha Vantage `GLOBAL_QUOTE` lookups, queried directly.
pub struct AlphaVantagePriceFeed {
    base_url: String,
    api_key: String,
    timeout_ms: u64,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote", default)]
    global_quote: Option<GlobalQuote>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price", default)]
    price: Option<String>,
}

impl AlphaVantagePriceFeed {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout_ms: u64,
    ) -> Result<Self, String> {
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout_ms,
            client: build_client(timeout_ms)?,
        })
    }

    /// `{base_url}/query` with `function`, `symbol` and `apikey` as encoded query pairs.
    pub fn endpoint(&self, symbol: &Symbol) -> Result<Url, String> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| format!("invalid alpha vantage base url {}: {err}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| format!("alpha vantage base url cannot take a path: {}", self.base_url))?
            .pop_if_empty()
            .push("query");
        url.query_pairs_mut()
            .clear()
            .append_pair("function", "GLOBAL_QUOTE")
            .append_pair("symbol", symbol.as_str())
            .append_pair("apikey", &self.api_key);
        Ok(url)
    }

    async fn fetch(&self, symbol: &Symbol) -> Result<PriceQuote, (FeedErrorKind, String)> {
        let endpoint = self.endpoint(symbol).map_err(|err| (FeedErrorKind::Transport, err))?;
        // The URL carries the api key, so it never goes into error text.
        let resp = self.client.get(endpoint).send().await.map_err(|err| {
            (
                FeedErrorKind::Transport,
                format!("quote request failed: {}", err.without_url()),
            )
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err((
                FeedErrorKind::HttpStatus,
                format!("alpha vantage http error: status {}", status.as_u16()),
            ));
        }
        let body = resp
            .text()
            .await
            .map_err(|err| {
                (
                    FeedErrorKind::Transport,
                    format!("failed to read quote body: {}", err.without_url()),
                )
            })?;
        parse_global_quote(symbol, &body).map_err(|err| (FeedErrorKind::Decode, err))
    }
}

/// Rate-limit notes and unknown tickers come back without a price, not as errors.
pub fn parse_global_quote(symbol: &Symbol, body: &str) -> Result<PriceQuote, String> {
    let parsed: GlobalQuoteResponse = serde_json::from_str(body)
        .map_err(|err| format!("failed to parse GLOBAL_QUOTE response: {err}"))?;
    let price = parsed
        .global_quote
        .and_then(|quote| quote.price)
        .and_then(|raw| raw.trim().parse::<f64>().ok());
    Ok(PriceQuote {
        symbol: Some(symbol.to_string()),
        price,
    })
}

#[async_trait]
impl PriceFeed for AlphaVantagePriceFeed {
    async fn current_price(&self, symbol: &Symbol) -> Result<PriceQuote, String> {
        let span = tracing::info_span!(
            "infra.feed.alpha_vantage",
            symbol = %symbol,
            base_url = %self.base_url,
            timeout_ms = self.timeout_ms
        );
        async {
            let start = Instant::now();
            let result = self.fetch(symbol).await;
            record_call("alpha_vantage", start, &result);
            result.map_err(|(_, err)| err)
        }
        .instrument(span)
        .await
    }
}
