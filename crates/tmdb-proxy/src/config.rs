use crate::action::TtlPolicy;
use crate::dispatch::Dispatcher;
use crate::request::Locale;
use gavetta_cache::StoreConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the TMDB bearer token.
pub const TOKEN_ENV: &str = "TMDB_TOKEN";

/// Upper bound accepted for `cache.max_entries`.
pub const MAX_ENTRIES_LIMIT: usize = 1_000_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    pub url: String,
    /// Overridden by `TMDB_TOKEN` when that is set.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_watch_region")]
    pub watch_region: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_evict_batch")]
    pub evict_batch: usize,
    #[serde(default)]
    pub coalesce_misses: bool,
    #[serde(default)]
    pub ttl: TtlConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TtlConfig {
    #[serde(default = "default_search_secs")]
    pub search_secs: u64,
    #[serde(default = "default_details_secs")]
    pub details_secs: u64,
    #[serde(default = "default_credits_secs")]
    pub credits_secs: u64,
    #[serde(default = "default_providers_secs")]
    pub providers_secs: u64,
    #[serde(default = "default_discover_secs")]
    pub discover_secs: u64,
    #[serde(default = "default_person_secs")]
    pub person_secs: u64,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Config {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            cache: CacheConfig::default(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.max_entries == 0 || self.cache.max_entries > MAX_ENTRIES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "cache.max_entries must be between 1 and {MAX_ENTRIES_LIMIT}"
            )));
        }
        if self.cache.evict_batch == 0 || self.cache.evict_batch > self.cache.max_entries {
            return Err(ConfigError::Invalid(
                "cache.evict_batch must be between 1 and cache.max_entries".into(),
            ));
        }
        if self.upstream.url.trim().is_empty() {
            return Err(ConfigError::Invalid("upstream.url must not be empty".into()));
        }
        Ok(())
    }

    /// Bearer token: `TMDB_TOKEN` first, then `upstream.token`.
    pub fn resolve_token(&self) -> Option<String> {
        std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.upstream.token.clone().filter(|t| !t.is_empty()))
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.cache.max_entries, self.cache.evict_batch)
    }

    pub fn locale(&self) -> Locale {
        Locale {
            language: self.upstream.language.clone(),
            watch_region: self.upstream.watch_region.clone(),
        }
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream.timeout_ms)
    }
}

impl TtlConfig {
    pub fn to_policy(&self) -> TtlPolicy {
        TtlPolicy {
            search: Duration::from_secs(self.search_secs),
            details: Duration::from_secs(self.details_secs),
            credits: Duration::from_secs(self.credits_secs),
            providers: Duration::from_secs(self.providers_secs),
            discover: Duration::from_secs(self.discover_secs),
            person: Duration::from_secs(self.person_secs),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            metrics_addr: default_metrics_addr(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            token: None,
            timeout_ms: default_timeout_ms(),
            language: default_language(),
            watch_region: default_watch_region(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            evict_batch: default_evict_batch(),
            coalesce_misses: false,
            ttl: TtlConfig::default(),
        }
    }
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            search_secs: default_search_secs(),
            details_secs: default_details_secs(),
            credits_secs: default_credits_secs(),
            providers_secs: default_providers_secs(),
            discover_secs: default_discover_secs(),
            person_secs: default_person_secs(),
        }
    }
}

/// Compare old and new config, apply safe changes, reject unsafe ones.
///
/// - TTLs changed → atomic swap, cached entries kept
/// - Store sizing or coalescing changed → WARN, ignored (restart required)
/// - Listeners or upstream changed → WARN, ignored (restart required)
///
/// Returns whether a new TTL table was applied.
pub fn diff_and_apply(old: &Config, new: &Config, dispatcher: &Dispatcher) -> bool {
    if old.cache.max_entries != new.cache.max_entries
        || old.cache.evict_batch != new.cache.evict_batch
    {
        tracing::warn!(
            old_max = old.cache.max_entries,
            new_max = new.cache.max_entries,
            old_batch = old.cache.evict_batch,
            new_batch = new.cache.evict_batch,
            "cache sizing change detected, ignoring. Restart to resize the store"
        );
    }

    if old.cache.coalesce_misses != new.cache.coalesce_misses {
        tracing::warn!(
            new = new.cache.coalesce_misses,
            "coalesce_misses change detected, ignoring. Restart to apply"
        );
    }

    if old.server != new.server || old.upstream != new.upstream {
        tracing::warn!("server/upstream change detected, ignoring. Restart to apply");
    }

    if old.cache.ttl != new.cache.ttl {
        dispatcher.set_ttl_policy(new.cache.ttl.to_policy());
        tracing::info!(
            search = new.cache.ttl.search_secs,
            details = new.cache.ttl.details_secs,
            credits = new.cache.ttl.credits_secs,
            providers = new.cache.ttl.providers_secs,
            discover = new.cache.ttl.discover_secs,
            person = new.cache.ttl.person_secs,
            "config reloaded: TTLs changed"
        );
        return true;
    }

    false
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}
fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}
fn default_upstream_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}
fn default_timeout_ms() -> u64 {
    10_000
}
fn default_language() -> String {
    "pt-BR".to_string()
}
fn default_watch_region() -> String {
    "BR".to_string()
}
fn default_max_entries() -> usize {
    500
}
fn default_evict_batch() -> usize {
    100
}
fn default_search_secs() -> u64 {
    5 * 60
}
fn default_details_secs() -> u64 {
    60 * 60
}
fn default_credits_secs() -> u64 {
    24 * 60 * 60
}
fn default_providers_secs() -> u64 {
    6 * 60 * 60
}
fn default_discover_secs() -> u64 {
    30 * 60
}
fn default_person_secs() -> u64 {
    24 * 60 * 60
}
