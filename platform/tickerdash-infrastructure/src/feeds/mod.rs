use reqwest::Client;
use std::time::{Duration, Instant};

pub mod alpha_vantage;
pub mod backend;

pub use alpha_vantage::AlphaVantagePriceFeed;
pub use backend::BackendPriceFeed;

pub(crate) fn build_client(timeout_ms: u64) -> Result<Client, String> {
    Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .map_err(|err| format!("failed to build http client: {err}"))
}

/// Error classes used as the `kind` label on feed error counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FeedErrorKind {
    Transport,
    HttpStatus,
    Decode,
}

impl FeedErrorKind {
    fn label(self) -> &'static str {
        match self {
            FeedErrorKind::Transport => "transport",
            FeedErrorKind::HttpStatus => "http_status",
            FeedErrorKind::Decode => "decode",
        }
    }
}

pub(crate) fn record_call<T>(
    feed: &'static str,
    start: Instant,
    result: &Result<T, (FeedErrorKind, String)>,
) {
    metrics::counter!("tickerdash.feed.requests_total", "feed" => feed).increment(1);
    let result_label = match result {
        Ok(_) => "ok",
        Err((kind, err)) => {
            metrics::counter!(
                "tickerdash.feed.errors_total",
                "feed" => feed,
                "kind" => kind.label()
            )
            .increment(1);
            tracing::debug!(feed, kind = kind.label(), error = %err, "price request failed");
            "err"
        }
    };
    metrics::histogram!("tickerdash.feed.call_ms", "feed" => feed, "result" => result_label)
        .record(start.elapsed().as_millis() as f64);
}
