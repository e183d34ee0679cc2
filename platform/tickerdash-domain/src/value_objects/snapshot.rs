use crate::value_objects::symbol::Symbol;
use serde::Serialize;

/// Latest sample of one tracked ticker, as exported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRow {
    pub symbol: Symbol,
    pub price: f64,
    pub timestamp_ms: i64,
}
