use crate::value_objects::snapshot::SnapshotRow;
use std::path::PathBuf;

pub trait SnapshotExporter {
    /// Writes the rows and returns where they landed. `now_ms` names the file.
    fn export(&self, rows: &[SnapshotRow], now_ms: i64) -> Result<PathBuf, String>;
}
