use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tickerdash_domain::repositories::export::SnapshotExporter;
use tickerdash_domain::services::time_format::{export_file_name, time_only};
use tickerdash_domain::value_objects::snapshot::SnapshotRow;

/// Writes `Symbol,Price,Time` rows into `out_dir/DD_MM_YYYY_HH_MM.csv`.
#[derive(Debug, Clone)]
pub struct CsvSnapshotExporter {
    out_dir: PathBuf,
}

impl CsvSnapshotExporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

pub fn write_snapshot_csv<W: Write>(writer: W, rows: &[SnapshotRow]) -> Result<(), String> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Symbol", "Price", "Time"])
        .map_err(|err| format!("failed to write snapshot header: {err}"))?;
    for row in rows {
        wtr.write_record([
            row.symbol.to_string(),
            row.price.to_string(),
            time_only(row.timestamp_ms),
        ])
        .map_err(|err| format!("failed to write snapshot row: {err}"))?;
    }
    wtr.flush()
        .map_err(|err| format!("failed to flush snapshot csv: {err}"))
}

impl SnapshotExporter for CsvSnapshotExporter {
    fn export(&self, rows: &[SnapshotRow], now_ms: i64) -> Result<PathBuf, String> {
        let start = Instant::now();
        let path = self.out_dir.join(export_file_name(now_ms));
        let result = fs::create_dir_all(&self.out_dir)
            .map_err(|err| format!("failed to create dir {}: {}", self.out_dir.display(), err))
            .and_then(|_| {
                fs::File::create(&path)
                    .map_err(|err| format!("failed to create {}: {}", path.display(), err))
            })
            .and_then(|file| write_snapshot_csv(file, rows));

        let result_label = if result.is_ok() { "ok" } else { "err" };
        metrics::counter!("tickerdash.infra.export.calls_total", "result" => result_label)
            .increment(1);
        metrics::histogram!("tickerdash.infra.export.write_ms", "result" => result_label)
            .record(start.elapsed().as_millis() as f64);
        result.map(|_| path)
    }
}
