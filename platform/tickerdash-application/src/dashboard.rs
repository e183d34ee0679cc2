//! Session state and the user-facing use cases of the dashboard.
//!
//! [`DashboardController`] owns everything a session accumulates (tracked
//! series, colors, current selection) and reaches the outside world only
//! through the injected ports.

use crate::cache::PriceCache;
use crate::chat::{answer_for, ChatReply};
use futures::future::join_all;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tickerdash_domain::entities::series::{SeriesBook, TrackedSeries};
use tickerdash_domain::error::DashboardError;
use tickerdash_domain::repositories::clock::Clock;
use tickerdash_domain::repositories::export::SnapshotExporter;
use tickerdash_domain::repositories::messaging::{MessagePayload, MessageRow, SelectionSender};
use tickerdash_domain::services::dedupe::dedupe_by_symbol_price;
use tickerdash_domain::services::palette::ColorPalette;
use tickerdash_domain::services::symbols::{normalize, SymbolResolver};
use tickerdash_domain::services::time_format::time_only;
use tickerdash_domain::value_objects::color::Rgb;
use tickerdash_domain::value_objects::sample::PriceSample;
use tickerdash_domain::value_objects::selection::{SelectedPoint, Selection};
use tickerdash_domain::value_objects::snapshot::SnapshotRow;
use tickerdash_domain::value_objects::symbol::Symbol;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddOutcome {
    pub symbol: Symbol,
    pub price: f64,
    pub color: Rgb,
    pub newly_tracked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefreshReport {
    pub timestamp_ms: i64,
    pub updated: Vec<Symbol>,
    pub skipped: Vec<Symbol>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistEntry {
    pub symbol: Symbol,
    pub color: Rgb,
    pub latest: Option<PriceSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendOutcome {
    pub rows: usize,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub rows: usize,
}

pub struct DashboardController {
    resolver: SymbolResolver,
    cache: PriceCache,
    sender: Arc<dyn SelectionSender>,
    clock: Arc<dyn Clock>,
    palette: ColorPalette,
    series: SeriesBook,
    selection: Selection,
}

impl DashboardController {
    pub fn new(
        resolver: SymbolResolver,
        cache: PriceCache,
        sender: Arc<dyn SelectionSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            resolver,
            cache,
            sender,
            clock,
            palette: ColorPalette::default(),
            series: SeriesBook::new(),
            selection: Selection::default(),
        }
    }

    pub fn with_palette(mut self, palette: ColorPalette) -> Self {
        self.palette = palette;
        self
    }

    pub fn resolver(&self) -> &SymbolResolver {
        &self.resolver
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    /// Resolves `raw`, fetches a price and appends one sample.
    ///
    /// Nothing is tracked unless a usable price comes back. Re-adding a
    /// tracked ticker appends to its existing series and keeps its color.
    pub async fn add_ticker(&mut self, raw: &str) -> Result<AddOutcome, DashboardError> {
        if normalize(raw).is_empty() {
            return Err(DashboardError::SymbolNotFound(String::new()));
        }
        let symbol = self.resolver.resolve(raw);
        if symbol.is_empty() {
            return Err(DashboardError::SymbolNotFound(String::new()));
        }

        let quote = self.cache.get(&symbol).await?;
        let price = quote
            .usable_price()
            .ok_or_else(|| DashboardError::SymbolNotFound(symbol.to_string()))?;

        let now = self.clock.now_ms();
        let (series, newly_tracked) = self.series.track(&symbol, &mut self.palette);
        series.push(PriceSample {
            timestamp_ms: now,
            price,
        });
        let color = series.color;
        tracing::info!(symbol = %symbol, price, newly_tracked, "ticker added");

        Ok(AddOutcome {
            symbol,
            price,
            color,
            newly_tracked,
        })
    }

    /// One refresh round over every tracked ticker.
    ///
    /// Fetches run concurrently; samples are applied only after all of them
    /// settle, with one timestamp for the round. Tickers without a usable
    /// price this round are skipped.
    pub async fn refresh_all(&mut self) -> RefreshReport {
        let symbols = self.series.symbols();
        let cache = &self.cache;
        let results = join_all(symbols.iter().map(|symbol| async move {
            let outcome = cache.get(symbol).await;
            (symbol, outcome)
        }))
        .await;

        let now = self.clock.now_ms();
        let mut report = RefreshReport {
            timestamp_ms: now,
            ..RefreshReport::default()
        };
        for (symbol, outcome) in results {
            let price = match outcome {
                Ok(quote) => quote.usable_price(),
                Err(err) => {
                    tracing::debug!(symbol = %symbol, error = %err, "refresh fetch failed");
                    None
                }
            };
            match (price, self.series.get_mut(symbol)) {
                (Some(price), Some(series)) => {
                    series.push(PriceSample {
                        timestamp_ms: now,
                        price,
                    });
                    report.updated.push(symbol.clone());
                }
                _ => {
                    metrics::counter!("tickerdash.refresh.skipped_total").increment(1);
                    report.skipped.push(symbol.clone());
                }
            }
        }
        tracing::debug!(
            updated = report.updated.len(),
            skipped = report.skipped.len(),
            "refresh round applied"
        );
        report
    }

    /// Latest sample per tracked ticker, in tracking order.
    pub fn export_snapshot(&self) -> Vec<SnapshotRow> {
        let latest = self.series.iter().filter_map(|series| {
            series.latest().map(|sample| SnapshotRow {
                symbol: series.symbol.clone(),
                price: sample.price,
                timestamp_ms: sample.timestamp_ms,
            })
        });
        dedupe_by_symbol_price(latest, |row| (&row.symbol, row.price))
    }

    pub fn export_to(&self, exporter: &dyn SnapshotExporter) -> Result<ExportOutcome, String> {
        let rows = self.export_snapshot();
        let path = exporter.export(&rows, self.clock.now_ms())?;
        tracing::info!(path = %path.display(), rows = rows.len(), "snapshot exported");
        Ok(ExportOutcome {
            path,
            rows: rows.len(),
        })
    }

    /// Builds the outbound rows for `selection`.
    ///
    /// Duplicate `(ticker, price)` pairs collapse to the first. Each row is
    /// stamped with the earliest sample of that ticker at that price, or with
    /// the current time when the series has no such sample.
    pub fn selection_to_message_payload(
        &self,
        selection: &Selection,
    ) -> Result<MessagePayload, DashboardError> {
        if selection.is_empty() {
            return Err(DashboardError::EmptySelection);
        }
        let now = self.clock.now_ms();
        let unique = dedupe_by_symbol_price(selection.points(), |point| (&point.symbol, point.price));
        let rows = unique
            .into_iter()
            .map(|point| {
                let timestamp_ms = self
                    .series
                    .get(&point.symbol)
                    .and_then(|series| series.first_at_price(point.price))
                    .map(|sample| sample.timestamp_ms)
                    .unwrap_or(now);
                MessageRow {
                    symbol: point.symbol.to_string(),
                    price: point.price,
                    datetime: time_only(timestamp_ms),
                }
            })
            .collect();
        Ok(MessagePayload { rows })
    }

    pub fn set_selection(&mut self, points: Vec<SelectedPoint>) {
        self.selection.replace(points);
    }

    /// Selects the latest `per_symbol` samples of each listed ticker.
    /// Returns how many points were selected.
    pub fn select_latest(&mut self, symbols: &[Symbol], per_symbol: usize) -> usize {
        let points: Vec<SelectedPoint> = symbols
            .iter()
            .filter_map(|symbol| self.series.get(symbol))
            .flat_map(|series| {
                let samples = series.samples();
                let start = samples.len().saturating_sub(per_symbol);
                samples[start..].iter().map(|sample| SelectedPoint {
                    symbol: series.symbol.clone(),
                    price: sample.price,
                })
            })
            .collect();
        let count = points.len();
        self.selection.replace(points);
        count
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Sends the current selection to the messaging endpoint.
    pub async fn send_selection(&self) -> Result<SendOutcome, DashboardError> {
        let payload = self.selection_to_message_payload(&self.selection)?;
        let response = self
            .sender
            .send(&payload)
            .await
            .map_err(DashboardError::NetworkFailure)?;
        if !response.is_success() {
            let message = response.message.unwrap_or(response.status);
            tracing::warn!(message = %message, "selection rejected by messaging endpoint");
            return Err(DashboardError::SendRejected(message));
        }
        tracing::info!(rows = payload.rows.len(), "selection sent");
        Ok(SendOutcome {
            rows: payload.rows.len(),
            body: payload.body_text(),
        })
    }

    /// Answers a free-text price question. Blank input is ignored.
    pub async fn chat_lookup(&self, input: &str) -> Option<ChatReply> {
        let question = input.trim();
        if question.is_empty() {
            return None;
        }
        let symbol = self.resolver.resolve(question);
        let outcome = if symbol.is_empty() {
            Err(DashboardError::SymbolNotFound(String::new()))
        } else {
            self.cache
                .get(&symbol)
                .await
                .map(|quote| quote.usable_price())
        };
        let answer = answer_for(symbol, outcome);
        Some(ChatReply::new(question, answer, self.clock.now_ms()))
    }

    pub fn watchlist(&self) -> Vec<WatchlistEntry> {
        self.series
            .iter()
            .map(|series| WatchlistEntry {
                symbol: series.symbol.clone(),
                color: series.color,
                latest: series.latest().copied(),
            })
            .collect()
    }

    pub fn series(&self) -> impl Iterator<Item = &TrackedSeries> {
        self.series.iter()
    }

    pub fn is_tracked(&self, symbol: &Symbol) -> bool {
        self.series.contains(symbol)
    }
}
