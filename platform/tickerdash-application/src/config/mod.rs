use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tickerdash_domain::services::palette::ColorPalette;
use tickerdash_domain::services::symbols::{AliasTable, SymbolResolver};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co";

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    #[default]
    Backend,
    AlphaVantage,
}

impl FeedKind {
    pub fn default_base_url(self) -> &'static str {
        match self {
            FeedKind::Backend => DEFAULT_BACKEND_URL,
            FeedKind::AlphaVantage => DEFAULT_ALPHA_VANTAGE_URL,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub feed: FeedConfig,
    pub cache: CacheConfig,
    pub refresh: RefreshConfig,
    pub messaging: MessagingConfig,
    pub export: ExportConfig,
    pub aliases: Vec<AliasConfig>,
    /// Hex colors (`#RRGGBB`) replacing the built-in chart palette.
    pub palette: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    pub kind: FeedKind,
    /// Unset means the default endpoint of `kind`.
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            kind: FeedKind::Backend,
            base_url: None,
            api_key: None,
            timeout_ms: 5_000,
        }
    }
}

impl FeedConfig {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_base_url())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub ttl_ms: i64,
    pub path: String,
    pub persist: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: crate::cache::DEFAULT_TTL_MS,
            path: ".tickerdash/price_cache.json".to_string(),
            persist: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RefreshConfig {
    pub interval_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { interval_ms: 5_000 }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MessagingConfig {
    pub url: String,
    pub timeout_ms: u64,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5000/send_whatsapp".to_string(),
            timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub out_dir: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            out_dir: "exports".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AliasConfig {
    pub alias: String,
    pub symbol: String,
}

impl Config {
    /// Built-in aliases followed by the configured extras.
    pub fn resolver(&self) -> SymbolResolver {
        let table = AliasTable::builtin().with_extra(
            self.aliases
                .iter()
                .map(|a| (a.alias.as_str(), a.symbol.as_str())),
        );
        SymbolResolver::new(table)
    }

    pub fn palette(&self) -> Result<ColorPalette, String> {
        match &self.palette {
            Some(colors) => ColorPalette::from_hex_list(colors),
            None => Ok(ColorPalette::default()),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    let (config, _source) = load_config_with_source(path)?;
    Ok(config)
}

pub fn load_config_with_source(path: &Path) -> Result<(Config, String), String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    let config = toml::from_str(&contents)
        .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))?;
    Ok((config, contents))
}

pub fn to_toml_pretty(config: &Config) -> Result<String, String> {
    toml::to_string_pretty(config)
        .map_err(|err| format!("failed to serialize config as TOML: {err}"))
}

pub fn validate_config(config: &Config) -> Result<(), String> {
    let mut errors = Vec::new();

    if config.feed.base_url().trim().is_empty() {
        errors.push("feed.base_url must not be empty".to_string());
    }
    if config.feed.timeout_ms == 0 {
        errors.push("feed.timeout_ms must be > 0".to_string());
    }
    if config.feed.kind == FeedKind::AlphaVantage
        && config
            .feed
            .api_key
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .is_empty()
    {
        errors.push("feed.api_key is required for kind = \"alpha_vantage\"".to_string());
    }
    if config.cache.ttl_ms <= 0 {
        errors.push("cache.ttl_ms must be > 0".to_string());
    }
    if config.cache.persist && config.cache.path.trim().is_empty() {
        errors.push("cache.path must not be empty when cache.persist = true".to_string());
    }
    if config.refresh.interval_ms == 0 {
        errors.push("refresh.interval_ms must be > 0".to_string());
    }
    if config.messaging.url.trim().is_empty() {
        errors.push("messaging.url must not be empty".to_string());
    }
    if config.messaging.timeout_ms == 0 {
        errors.push("messaging.timeout_ms must be > 0".to_string());
    }
    if config.export.out_dir.trim().is_empty() {
        errors.push("export.out_dir must not be empty".to_string());
    }
    for (idx, alias) in config.aliases.iter().enumerate() {
        if alias.alias.trim().is_empty() {
            errors.push(format!("aliases[{idx}].alias must not be empty"));
        }
        if alias.symbol.trim().is_empty() {
            errors.push(format!("aliases[{idx}].symbol must not be empty"));
        }
    }
    if let Err(err) = config.palette() {
        errors.push(err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}
