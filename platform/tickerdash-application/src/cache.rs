//! Time-boxed memoization of current-price lookups.
//!
//! An entry is reused while `now - fetched_at < ttl`. Anything older, or
//! missing, goes to the feed. Every successful fetch rewrites the whole
//! snapshot through the [`CacheStore`]; a failed write is logged and counted
//! but the fetched value is still returned.
//!
//! Concurrent `get`s for the same ticker are not coalesced: both miss and both
//! fetch, and the later write wins.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tickerdash_domain::error::DashboardError;
use tickerdash_domain::repositories::cache_store::{CacheEntry, CacheSnapshot, CacheStore};
use tickerdash_domain::repositories::clock::Clock;
use tickerdash_domain::repositories::price_feed::PriceFeed;
use tickerdash_domain::value_objects::quote::PriceQuote;
use tickerdash_domain::value_objects::symbol::Symbol;

pub const DEFAULT_TTL_MS: i64 = 60_000;

pub struct PriceCache {
    feed: Arc<dyn PriceFeed>,
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    ttl_ms: i64,
    entries: Mutex<BTreeMap<Symbol, CacheEntry>>,
}

impl PriceCache {
    /// Seeds from `store`. Unreadable state starts the cache empty.
    pub fn new(
        feed: Arc<dyn PriceFeed>,
        store: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
        ttl_ms: i64,
    ) -> Self {
        let entries = match store.load() {
            Ok(Some(snapshot)) => {
                tracing::info!(entries = snapshot.entries.len(), "price cache restored");
                snapshot.entries
            }
            Ok(None) => BTreeMap::new(),
            Err(err) => {
                metrics::counter!("tickerdash.cache.load_errors_total").increment(1);
                tracing::warn!(error = %err, "price cache could not be restored; starting empty");
                BTreeMap::new()
            }
        };
        Self {
            feed,
            store,
            clock,
            ttl_ms,
            entries: Mutex::new(entries),
        }
    }

    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    pub async fn get(&self, symbol: &Symbol) -> Result<PriceQuote, DashboardError> {
        let now = self.clock.now_ms();
        if let Some(value) = self.fresh(symbol, now) {
            metrics::counter!("tickerdash.cache.hits_total").increment(1);
            tracing::debug!(symbol = %symbol, "price cache hit");
            return Ok(value);
        }

        metrics::counter!("tickerdash.cache.misses_total").increment(1);
        tracing::debug!(symbol = %symbol, "price cache miss");
        let value = self.feed.current_price(symbol).await.map_err(|err| {
            metrics::counter!("tickerdash.cache.fetch_errors_total").increment(1);
            DashboardError::NetworkFailure(err)
        })?;

        let snapshot = {
            let mut entries = self.entries.lock();
            entries.insert(
                symbol.clone(),
                CacheEntry {
                    value: value.clone(),
                    fetched_at_ms: now,
                },
            );
            CacheSnapshot {
                entries: entries.clone(),
            }
        };
        self.persist(&snapshot);
        Ok(value)
    }

    /// Fresh value for `symbol`, if any. Never fetches.
    pub fn peek(&self, symbol: &Symbol) -> Option<PriceQuote> {
        self.fresh(symbol, self.clock.now_ms())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drops every entry and persists the empty snapshot.
    pub fn clear(&self) {
        self.entries.lock().clear();
        self.persist(&CacheSnapshot::default());
        tracing::info!("price cache cleared");
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            entries: self.entries.lock().clone(),
        }
    }

    fn fresh(&self, symbol: &Symbol, now: i64) -> Option<PriceQuote> {
        let entries = self.entries.lock();
        entries
            .get(symbol)
            .filter(|entry| now - entry.fetched_at_ms < self.ttl_ms)
            .map(|entry| entry.value.clone())
    }

    fn persist(&self, snapshot: &CacheSnapshot) {
        if let Err(err) = self.store.save(snapshot) {
            let err = DashboardError::CachePersistFailure(err);
            metrics::counter!("tickerdash.cache.persist_errors_total").increment(1);
            tracing::warn!(error = %err, "price cache write failed");
        }
    }
}
