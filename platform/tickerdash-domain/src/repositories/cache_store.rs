use crate::value_objects::quote::PriceQuote;
use crate::value_objects::symbol::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: PriceQuote,
    pub fetched_at_ms: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheSnapshot {
    pub entries: BTreeMap<Symbol, CacheEntry>,
}

/// Durable, best-effort home for the price cache.
pub trait CacheStore: Send + Sync {
    fn load(&self) -> Result<Option<CacheSnapshot>, String>;
    fn save(&self, snapshot: &CacheSnapshot) -> Result<(), String>;
}
