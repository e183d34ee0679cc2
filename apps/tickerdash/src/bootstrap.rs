use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tickerdash_application::cache::PriceCache;
use tickerdash_application::config::{self, Config, FeedKind};
use tickerdash_application::dashboard::DashboardController;
use tickerdash_domain::repositories::cache_store::CacheStore;
use tickerdash_domain::repositories::price_feed::PriceFeed;
use tickerdash_infrastructure::cache_store::{FileCacheStore, InMemoryCacheStore};
use tickerdash_infrastructure::clock::SystemClock;
use tickerdash_infrastructure::export::CsvSnapshotExporter;
use tickerdash_infrastructure::feeds::{AlphaVantagePriceFeed, BackendPriceFeed};
use tickerdash_infrastructure::messaging::HttpSelectionSender;

pub const CONFIG_ENV: &str = "TICKERDASH_CONFIG";
pub const ALPHA_VANTAGE_KEY_ENV: &str = "ALPHA_VANTAGE_KEY";

/// Everything a session needs, wired from one config.
pub struct DashboardParts {
    pub controller: DashboardController,
    pub exporter: CsvSnapshotExporter,
    pub refresh_every: Duration,
}

/// `--config` wins over `TICKERDASH_CONFIG`; neither means built-in defaults.
pub fn resolve_config_path(cli: Option<PathBuf>) -> Option<PathBuf> {
    cli.or_else(|| {
        env::var(CONFIG_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
    })
}

pub fn load_startup_config(path: Option<&Path>) -> Result<Config, String> {
    let mut config = match path {
        Some(path) => {
            let (config, _source) = config::load_config_with_source(path)?;
            tracing::info!(config = %path.display(), "config loaded");
            config
        }
        None => Config::default(),
    };
    apply_env_overrides(&mut config, env::var(ALPHA_VANTAGE_KEY_ENV).ok());
    config::validate_config(&config).map_err(|err| format!("invalid config: {err}"))?;
    Ok(config)
}

fn apply_env_overrides(config: &mut Config, alpha_vantage_key: Option<String>) {
    let missing = config
        .feed
        .api_key
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .is_empty();
    if missing {
        if let Some(key) = alpha_vantage_key.filter(|k| !k.trim().is_empty()) {
            config.feed.api_key = Some(key);
        }
    }
}

pub fn build_feed(config: &Config) -> Result<Arc<dyn PriceFeed>, String> {
    let feed = &config.feed;
    let built: Arc<dyn PriceFeed> = match feed.kind {
        FeedKind::Backend => Arc::new(BackendPriceFeed::new(feed.base_url(), feed.timeout_ms)?),
        FeedKind::AlphaVantage => Arc::new(AlphaVantagePriceFeed::new(
            feed.base_url(),
            feed.api_key.clone().unwrap_or_default(),
            feed.timeout_ms,
        )?),
    };
    Ok(built)
}

pub fn build_cache_store(config: &Config, no_persist: bool) -> Arc<dyn CacheStore> {
    if no_persist || !config.cache.persist {
        Arc::new(InMemoryCacheStore::default())
    } else {
        Arc::new(FileCacheStore::new(&config.cache.path))
    }
}

pub fn build_dashboard(config: &Config, no_persist: bool) -> Result<DashboardParts, String> {
    let clock = Arc::new(SystemClock);
    let cache = PriceCache::new(
        build_feed(config)?,
        build_cache_store(config, no_persist),
        clock.clone(),
        config.cache.ttl_ms,
    );
    let sender = Arc::new(HttpSelectionSender::new(
        &config.messaging.url,
        config.messaging.timeout_ms,
    )?);
    let controller = DashboardController::new(config.resolver(), cache, sender, clock)
        .with_palette(config.palette()?);

    tracing::info!(
        feed = ?config.feed.kind,
        base_url = config.feed.base_url(),
        ttl_ms = config.cache.ttl_ms,
        persist = !no_persist && config.cache.persist,
        refresh_ms = config.refresh.interval_ms,
        "dashboard ready"
    );
    Ok(DashboardParts {
        controller,
        exporter: CsvSnapshotExporter::new(&config.export.out_dir),
        refresh_every: Duration::from_millis(config.refresh.interval_ms),
    })
}
