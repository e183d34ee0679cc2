use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use tickerdash_application::cache::{PriceCache, DEFAULT_TTL_MS};
use tickerdash_application::chat::{ChatAnswer, FETCH_ERROR_TEXT};
use tickerdash_application::dashboard::DashboardController;
use tickerdash_domain::error::DashboardError;
use tickerdash_domain::repositories::cache_store::{CacheEntry, CacheSnapshot, CacheStore};
use tickerdash_domain::repositories::clock::Clock;
use tickerdash_domain::repositories::export::SnapshotExporter;
use tickerdash_domain::repositories::messaging::{MessagePayload, SelectionSender, SendResponse};
use tickerdash_domain::repositories::price_feed::PriceFeed;
use tickerdash_domain::services::palette::DEFAULT_PALETTE;
use tickerdash_domain::services::symbols::SymbolResolver;
use tickerdash_domain::services::time_format::time_only;
use tickerdash_domain::value_objects::quote::PriceQuote;
use tickerdash_domain::value_objects::selection::{SelectedPoint, Selection};
use tickerdash_domain::value_objects::snapshot::SnapshotRow;
use tickerdash_domain::value_objects::symbol::Symbol;

#[derive(Default)]
struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Answers from a fixed table and counts calls per symbol.
#[derive(Default)]
struct ScriptedFeed {
    answers: Mutex<HashMap<String, Result<Option<f64>, String>>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedFeed {
    fn with(answers: &[(&str, Result<Option<f64>, String>)]) -> Arc<Self> {
        let feed = Self::default();
        for (symbol, answer) in answers {
            feed.answers
                .lock()
                .insert(symbol.to_string(), answer.clone());
        }
        Arc::new(feed)
    }

    fn set(&self, symbol: &str, answer: Result<Option<f64>, String>) {
        self.answers.lock().insert(symbol.to_string(), answer);
    }

    fn calls(&self, symbol: &str) -> usize {
        self.calls.lock().get(symbol).copied().unwrap_or(0)
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }
}

#[async_trait]
impl PriceFeed for ScriptedFeed {
    async fn current_price(&self, symbol: &Symbol) -> Result<PriceQuote, String> {
        *self
            .calls
            .lock()
            .entry(symbol.to_string())
            .or_insert(0) += 1;
        let answer = self
            .answers
            .lock()
            .get(symbol.as_str())
            .cloned()
            .unwrap_or(Ok(None));
        answer.map(|price| PriceQuote {
            symbol: Some(symbol.to_string()),
            price,
        })
    }
}

#[derive(Default)]
struct MemoryStore {
    saved: Mutex<Option<CacheSnapshot>>,
    saves: AtomicUsize,
    fail_save: bool,
    fail_load: bool,
}

impl CacheStore for MemoryStore {
    fn load(&self) -> Result<Option<CacheSnapshot>, String> {
        if self.fail_load {
            return Err("corrupt cache file".to_string());
        }
        Ok(self.saved.lock().clone())
    }

    fn save(&self, snapshot: &CacheSnapshot) -> Result<(), String> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_save {
            return Err("quota exceeded".to_string());
        }
        *self.saved.lock() = Some(snapshot.clone());
        Ok(())
    }
}

struct RecordingSender {
    response: Result<SendResponse, String>,
    sent: Mutex<Vec<MessagePayload>>,
}

impl RecordingSender {
    fn answering(response: Result<SendResponse, String>) -> Arc<Self> {
        Arc::new(Self {
            response,
            sent: Mutex::new(Vec::new()),
        })
    }

    fn success() -> Arc<Self> {
        Self::answering(Ok(SendResponse {
            status: "success".to_string(),
            message: None,
        }))
    }
}

#[async_trait]
impl SelectionSender for RecordingSender {
    async fn send(&self, payload: &MessagePayload) -> Result<SendResponse, String> {
        self.sent.lock().push(payload.clone());
        self.response.clone()
    }
}

struct Harness {
    feed: Arc<ScriptedFeed>,
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
    sender: Arc<RecordingSender>,
}

impl Harness {
    fn new(feed: Arc<ScriptedFeed>) -> Self {
        Self {
            feed,
            store: Arc::new(MemoryStore::default()),
            clock: Arc::new(ManualClock::default()),
            sender: RecordingSender::success(),
        }
    }

    fn cache(&self) -> PriceCache {
        PriceCache::new(
            self.feed.clone(),
            self.store.clone(),
            self.clock.clone(),
            DEFAULT_TTL_MS,
        )
    }

    fn controller(&self) -> DashboardController {
        DashboardController::new(
            SymbolResolver::default(),
            self.cache(),
            self.sender.clone(),
            self.clock.clone(),
        )
    }
}

fn point(symbol: &str, price: f64) -> SelectedPoint {
    SelectedPoint {
        symbol: Symbol::new(symbol),
        price,
    }
}

#[tokio::test]
async fn cache_reuses_entries_until_ttl_expires() {
    let h = Harness::new(ScriptedFeed::with(&[("AAPL", Ok(Some(187.5)))]));
    let cache = h.cache();
    let aapl = Symbol::new("AAPL");

    h.clock.set(0);
    assert_eq!(cache.get(&aapl).await.expect("get").price, Some(187.5));
    h.clock.set(30_000);
    cache.get(&aapl).await.expect("get");
    assert_eq!(h.feed.calls("AAPL"), 1);

    h.clock.set(59_999);
    assert!(cache.peek(&aapl).is_some());
    h.clock.set(60_000);
    assert!(cache.peek(&aapl).is_none());

    h.clock.set(61_000);
    cache.get(&aapl).await.expect("get");
    assert_eq!(h.feed.calls("AAPL"), 2);
    assert_eq!(cache.snapshot().entries[&aapl].fetched_at_ms, 61_000);
}

#[tokio::test]
async fn cache_persists_each_fetch_and_restores_on_start() {
    let h = Harness::new(ScriptedFeed::with(&[
        ("AAPL", Ok(Some(187.5))),
        ("MSFT", Ok(Some(410.0))),
    ]));
    let cache = h.cache();
    cache.get(&Symbol::new("AAPL")).await.expect("get");
    cache.get(&Symbol::new("MSFT")).await.expect("get");
    assert_eq!(h.store.saves.load(Ordering::SeqCst), 2);

    let saved = h.store.saved.lock().clone().expect("snapshot saved");
    assert_eq!(saved.entries.len(), 2);

    let restored = h.cache();
    assert_eq!(restored.len(), 2);
    h.clock.set(1_000);
    restored.get(&Symbol::new("MSFT")).await.expect("get");
    assert_eq!(h.feed.calls("MSFT"), 1);
}

#[tokio::test]
async fn cache_ignores_stale_restored_entries() {
    let h = Harness::new(ScriptedFeed::with(&[("AAPL", Ok(Some(190.0)))]));
    let mut entries = std::collections::BTreeMap::new();
    entries.insert(
        Symbol::new("AAPL"),
        CacheEntry {
            value: PriceQuote::with_price("AAPL", 150.0),
            fetched_at_ms: 0,
        },
    );
    *h.store.saved.lock() = Some(CacheSnapshot { entries });
    let cache = h.cache();

    h.clock.set(DEFAULT_TTL_MS + 1);
    let quote = cache.get(&Symbol::new("AAPL")).await.expect("get");
    assert_eq!(quote.price, Some(190.0));
    assert_eq!(h.feed.calls("AAPL"), 1);
}

#[tokio::test]
async fn persistence_failures_never_reach_the_caller() {
    let mut h = Harness::new(ScriptedFeed::with(&[("AAPL", Ok(Some(187.5)))]));
    h.store = Arc::new(MemoryStore {
        fail_save: true,
        fail_load: true,
        ..MemoryStore::default()
    });
    let cache = h.cache();
    assert!(cache.is_empty());

    let quote = cache.get(&Symbol::new("AAPL")).await.expect("value despite save failure");
    assert_eq!(quote.usable_price(), Some(187.5));
    assert_eq!(h.store.saves.load(Ordering::SeqCst), 1);
    assert!(cache.peek(&Symbol::new("AAPL")).is_some());
}

#[tokio::test]
async fn failed_fetch_leaves_cache_untouched() {
    let h = Harness::new(ScriptedFeed::with(&[(
        "AAPL",
        Err("connection refused".to_string()),
    )]));
    let cache = h.cache();
    let err = cache.get(&Symbol::new("AAPL")).await.expect_err("network");
    assert!(matches!(err, DashboardError::NetworkFailure(_)));
    assert!(cache.is_empty());
    assert_eq!(h.store.saves.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn clear_empties_and_persists() {
    let h = Harness::new(ScriptedFeed::with(&[("AAPL", Ok(Some(1.0)))]));
    let cache = h.cache();
    cache.get(&Symbol::new("AAPL")).await.expect("get");
    cache.clear();
    assert!(cache.is_empty());
    let saved = h.store.saved.lock().clone().expect("saved");
    assert!(saved.entries.is_empty());
}

#[tokio::test]
async fn add_ticker_resolves_tracks_and_colors_once() {
    let h = Harness::new(ScriptedFeed::with(&[
        ("AAPL", Ok(Some(187.5))),
        ("MSFT", Ok(Some(410.0))),
    ]));
    let mut dashboard = h.controller();

    h.clock.set(1_000);
    let added = dashboard.add_ticker("  Aple ").await.expect("add");
    assert_eq!(added.symbol.as_str(), "AAPL");
    assert_eq!(added.price, 187.5);
    assert_eq!(added.color, DEFAULT_PALETTE[0]);
    assert!(added.newly_tracked);

    let msft = dashboard.add_ticker("microsoft").await.expect("add");
    assert_eq!(msft.color, DEFAULT_PALETTE[1]);

    h.clock.set(2_000);
    let again = dashboard.add_ticker("AAPL").await.expect("add again");
    assert!(!again.newly_tracked);
    assert_eq!(again.color, DEFAULT_PALETTE[0]);

    let watchlist = dashboard.watchlist();
    assert_eq!(watchlist.len(), 2);
    assert_eq!(watchlist[0].symbol.as_str(), "AAPL");
    let aapl = dashboard.series().next().expect("series");
    assert_eq!(aapl.len(), 2);
    assert_eq!(aapl.samples()[1].timestamp_ms, 2_000);
    // The second add is inside the TTL, so no new fetch.
    assert_eq!(h.feed.calls("AAPL"), 1);
}

#[tokio::test]
async fn add_ticker_without_price_tracks_nothing() {
    let h = Harness::new(ScriptedFeed::with(&[("XYZ123", Ok(None)), ("ZERO", Ok(Some(0.0)))]));
    let mut dashboard = h.controller();

    let err = dashboard.add_ticker("xyz123").await.expect_err("no price");
    assert_eq!(err, DashboardError::SymbolNotFound("XYZ123".to_string()));
    assert!(dashboard.add_ticker("zero").await.is_err());
    assert!(dashboard.watchlist().is_empty());

    let err = dashboard.add_ticker("   ").await.expect_err("blank");
    assert!(matches!(err, DashboardError::SymbolNotFound(_)));
    assert_eq!(h.feed.calls("FB"), 0);
}

#[tokio::test]
async fn add_ticker_surfaces_network_failure() {
    let h = Harness::new(ScriptedFeed::with(&[("TSLA", Err("503".to_string()))]));
    let mut dashboard = h.controller();
    let err = dashboard.add_ticker("tsla").await.expect_err("network");
    assert!(matches!(err, DashboardError::NetworkFailure(_)));
    assert!(!dashboard.is_tracked(&Symbol::new("TSLA")));
}

#[tokio::test]
async fn refresh_applies_one_timestamp_and_skips_failures() {
    let h = Harness::new(ScriptedFeed::with(&[
        ("AAPL", Ok(Some(187.5))),
        ("MSFT", Ok(Some(410.0))),
        ("NFLX", Ok(Some(600.0))),
    ]));
    let mut dashboard = h.controller();
    for name in ["apple", "msft", "netflix"] {
        dashboard.add_ticker(name).await.expect("add");
    }

    h.feed.set("AAPL", Ok(Some(188.0)));
    h.feed.set("MSFT", Err("timeout".to_string()));
    h.feed.set("NFLX", Ok(None));
    h.clock.set(DEFAULT_TTL_MS + 5_000);

    let report = dashboard.refresh_all().await;
    assert_eq!(report.timestamp_ms, DEFAULT_TTL_MS + 5_000);
    assert_eq!(report.updated, vec![Symbol::new("AAPL")]);
    assert_eq!(report.skipped, vec![Symbol::new("MSFT"), Symbol::new("NFLX")]);
    assert_eq!(h.feed.total_calls(), 6);

    let lens: Vec<usize> = dashboard.series().map(|s| s.len()).collect();
    assert_eq!(lens, vec![2, 1, 1]);
    let latest = dashboard.watchlist()[0].latest.expect("sample");
    assert_eq!(latest.price, 188.0);
    assert_eq!(latest.timestamp_ms, DEFAULT_TTL_MS + 5_000);
}

#[tokio::test]
async fn refresh_with_nothing_tracked_is_a_no_op() {
    let h = Harness::new(Arc::new(ScriptedFeed::default()));
    let mut dashboard = h.controller();
    let report = dashboard.refresh_all().await;
    assert!(report.updated.is_empty() && report.skipped.is_empty());
    assert_eq!(h.feed.total_calls(), 0);
}

#[tokio::test]
async fn export_snapshot_keeps_latest_per_ticker() {
    let h = Harness::new(ScriptedFeed::with(&[
        ("AAPL", Ok(Some(187.5))),
        ("MSFT", Ok(Some(410.0))),
    ]));
    let mut dashboard = h.controller();
    assert!(dashboard.export_snapshot().is_empty());

    dashboard.add_ticker("apple").await.expect("add");
    dashboard.add_ticker("msft").await.expect("add");
    h.feed.set("AAPL", Ok(Some(190.0)));
    h.clock.set(DEFAULT_TTL_MS);
    dashboard.refresh_all().await;

    let rows = dashboard.export_snapshot();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].symbol.as_str(), "AAPL");
    assert_eq!(rows[0].price, 190.0);
    assert_eq!(rows[0].timestamp_ms, DEFAULT_TTL_MS);
    assert_eq!(rows[1].price, 410.0);
}

/// Captures what would have been written and names the file after `now_ms`.
#[derive(Default)]
struct CapturingExporter {
    written: Mutex<Vec<(Vec<SnapshotRow>, i64)>>,
    fail: bool,
}

impl SnapshotExporter for CapturingExporter {
    fn export(&self, rows: &[SnapshotRow], now_ms: i64) -> Result<PathBuf, String> {
        if self.fail {
            return Err("disk full".to_string());
        }
        self.written.lock().push((rows.to_vec(), now_ms));
        Ok(PathBuf::from(format!("exports/{now_ms}.csv")))
    }
}

#[tokio::test]
async fn export_to_hands_the_snapshot_to_the_exporter() {
    let h = Harness::new(ScriptedFeed::with(&[("AAPL", Ok(Some(187.5)))]));
    let mut dashboard = h.controller();
    dashboard.add_ticker("apple").await.expect("add");

    h.clock.set(42_000);
    let exporter = CapturingExporter::default();
    let out = dashboard.export_to(&exporter).expect("export");
    assert_eq!(out.rows, 1);
    assert_eq!(out.path, PathBuf::from("exports/42000.csv"));
    let written = exporter.written.lock();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].0[0].symbol.as_str(), "AAPL");
    assert_eq!(written[0].1, 42_000);

    let failing = CapturingExporter {
        fail: true,
        ..CapturingExporter::default()
    };
    assert_eq!(dashboard.export_to(&failing).expect_err("fails"), "disk full");
}

#[tokio::test]
async fn selection_payload_dedupes_and_stamps_first_sample() {
    let h = Harness::new(ScriptedFeed::with(&[("AAPL", Ok(Some(187.5)))]));
    let mut dashboard = h.controller();

    h.clock.set(10_000);
    dashboard.add_ticker("apple").await.expect("add");
    h.clock.set(20_000);
    dashboard.add_ticker("apple").await.expect("add");

    let err = dashboard
        .selection_to_message_payload(&Selection::default())
        .expect_err("empty");
    assert_eq!(err, DashboardError::EmptySelection);

    h.clock.set(30_000);
    let selection = Selection::new(vec![
        point("AAPL", 187.5),
        point("AAPL", 187.5),
        point("AAPL", 200.0),
    ]);
    let payload = dashboard
        .selection_to_message_payload(&selection)
        .expect("payload");
    assert_eq!(payload.rows.len(), 2);
    assert_eq!(payload.rows[0].symbol, "AAPL");
    assert_eq!(payload.rows[0].datetime, time_only(10_000));
    assert_eq!(payload.rows[1].datetime, time_only(30_000));
}

#[tokio::test]
async fn select_latest_takes_tail_of_each_series() {
    let h = Harness::new(ScriptedFeed::with(&[
        ("AAPL", Ok(Some(1.0))),
        ("MSFT", Ok(Some(5.0))),
    ]));
    let mut dashboard = h.controller();
    dashboard.add_ticker("aapl").await.expect("add");
    dashboard.add_ticker("msft").await.expect("add");
    for (step, price) in [(1, 2.0), (2, 3.0)] {
        h.feed.set("AAPL", Ok(Some(price)));
        h.clock.set(step * DEFAULT_TTL_MS);
        dashboard.refresh_all().await;
    }

    let count = dashboard.select_latest(&[Symbol::new("AAPL"), Symbol::new("MSFT")], 2);
    assert_eq!(count, 4);
    let prices: Vec<f64> = dashboard.selection().points().iter().map(|p| p.price).collect();
    assert_eq!(prices, vec![2.0, 3.0, 5.0, 5.0]);

    dashboard.clear_selection();
    assert!(dashboard.selection().is_empty());
}

#[tokio::test]
async fn send_selection_reports_each_outcome() {
    let mut h = Harness::new(ScriptedFeed::with(&[("AAPL", Ok(Some(187.5)))]));
    let mut dashboard = h.controller();
    assert_eq!(
        dashboard.send_selection().await.expect_err("nothing selected"),
        DashboardError::EmptySelection
    );

    dashboard.add_ticker("apple").await.expect("add");
    dashboard.set_selection(vec![point("AAPL", 187.5)]);
    let sent = dashboard.send_selection().await.expect("sent");
    assert_eq!(sent.rows, 1);
    assert!(sent.body.contains("AAPL"));
    assert_eq!(h.sender.sent.lock().len(), 1);

    h.sender = RecordingSender::answering(Ok(SendResponse {
        status: "error".to_string(),
        message: Some("Twilio auth failed".to_string()),
    }));
    let mut dashboard = h.controller();
    dashboard.set_selection(vec![point("AAPL", 187.5)]);
    assert_eq!(
        dashboard.send_selection().await.expect_err("rejected"),
        DashboardError::SendRejected("Twilio auth failed".to_string())
    );

    h.sender = RecordingSender::answering(Err("connection reset".to_string()));
    let mut dashboard = h.controller();
    dashboard.set_selection(vec![point("AAPL", 187.5)]);
    assert!(matches!(
        dashboard.send_selection().await,
        Err(DashboardError::NetworkFailure(_))
    ));
}

#[tokio::test]
async fn chat_lookup_answers_through_the_cache() {
    let h = Harness::new(ScriptedFeed::with(&[
        ("NVDA", Ok(Some(875.25))),
        ("XYZ123", Ok(None)),
        ("TSLA", Err("timeout".to_string())),
    ]));
    let dashboard = h.controller();

    assert!(dashboard.chat_lookup("   ").await.is_none());
    assert_eq!(h.feed.total_calls(), 0);

    let reply = dashboard.chat_lookup(" nvidea ").await.expect("reply");
    assert!(reply.user_line.ends_with("You: nvidea"));
    assert!(reply.reply_line.ends_with("] NVDA current price: $875.25"));
    assert_eq!(reply.price(), Some(875.25));

    let reply = dashboard.chat_lookup("xyz123").await.expect("reply");
    assert_eq!(
        reply.answer,
        ChatAnswer::NotFound {
            symbol: Symbol::new("XYZ123")
        }
    );

    let reply = dashboard.chat_lookup("tesla").await.expect("reply");
    assert_eq!(reply.reply_line, FETCH_ERROR_TEXT);

    dashboard.chat_lookup("nvda").await.expect("reply");
    assert_eq!(h.feed.calls("NVDA"), 1);
    // Chat never tracks tickers.
    assert!(dashboard.watchlist().is_empty());
}
