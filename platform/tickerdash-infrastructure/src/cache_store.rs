use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use tickerdash_domain::repositories::cache_store::{CacheSnapshot, CacheStore};

fn record_metrics<T>(op: &'static str, start: Instant, result: &Result<T, String>) {
    let result_label = if result.is_ok() { "ok" } else { "err" };
    metrics::counter!(
        "tickerdash.infra.cache_store.calls_total",
        "op" => op,
        "result" => result_label
    )
    .increment(1);
    metrics::histogram!("tickerdash.infra.cache_store.ms", "op" => op, "result" => result_label)
        .record(start.elapsed().as_millis() as f64);
}

/// Price cache kept as one JSON object keyed by ticker.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    path: PathBuf,
}

impl FileCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<CacheSnapshot>, String> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(format!(
                    "failed to read cache {}: {}",
                    self.path.display(),
                    err
                ))
            }
        };
        if contents.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|err| format!("failed to parse cache {}: {}", self.path.display(), err))
    }

    fn write(&self, snapshot: &CacheSnapshot) -> Result<(), String> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|err| format!("failed to create dir {}: {}", parent.display(), err))?;
        }
        let json = serde_json::to_string(snapshot)
            .map_err(|err| format!("failed to serialize cache: {err}"))?;
        fs::write(&self.path, json)
            .map_err(|err| format!("failed to write cache {}: {}", self.path.display(), err))
    }
}

impl CacheStore for FileCacheStore {
    fn load(&self) -> Result<Option<CacheSnapshot>, String> {
        let start = Instant::now();
        let result = self.read();
        record_metrics("load", start, &result);
        result
    }

    fn save(&self, snapshot: &CacheSnapshot) -> Result<(), String> {
        let start = Instant::now();
        let result = self.write(snapshot);
        record_metrics("save", start, &result);
        result
    }
}

/// Process-local store, used when persistence is switched off.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    snapshot: Mutex<Option<CacheSnapshot>>,
}

impl CacheStore for InMemoryCacheStore {
    fn load(&self) -> Result<Option<CacheSnapshot>, String> {
        self.snapshot
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| "in-memory cache lock poisoned".to_string())
    }

    fn save(&self, snapshot: &CacheSnapshot) -> Result<(), String> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| "in-memory cache lock poisoned".to_string())?;
        *guard = Some(snapshot.clone());
        Ok(())
    }
}
