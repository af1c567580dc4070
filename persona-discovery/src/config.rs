//! Configuration for the discovery service
//!
//! Loaded once at start-up from TOML. Every field has a built-in default, so
//! an empty (or absent) file yields a working configuration.
//!
//! # Settings Sources Priority
//!
//! 1. Explicit path passed by the caller
//! 2. `PERSONA_DISCOVERY_CONFIG` environment variable
//! 3. `<config_dir>/persona/discovery.toml`
//! 4. Built-in defaults
//!
//! Timeouts and cache TTL can additionally be overridden per value through
//! `PERSONA_SEARCH_TIMEOUT_MS`, `PERSONA_DETAILS_TIMEOUT_MS` and
//! `PERSONA_CACHE_TTL_SECS`.

use crate::types::GenreId;
use persona_common::config::{env_override, load_toml, resolve_config_file, LoggingConfig};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

pub const CONFIG_ENV_VAR: &str = "PERSONA_DISCOVERY_CONFIG";
pub const CONFIG_FILE_NAME: &str = "discovery.toml";

/// Top-level configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub search: SearchConfig,

    /// Per-genre source priority overrides
    ///
    /// Genres not listed keep the built-in priority list.
    #[serde(default)]
    pub genres: BTreeMap<String, Vec<SourcePriority>>,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[search]` section
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,

    #[serde(default = "default_details_timeout_ms")]
    pub details_timeout_ms: u64,

    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Generic last-resort source; empty disables the fallback
    #[serde(default = "default_fallback_source")]
    pub fallback_source: String,

    #[serde(default = "default_fallback_limit")]
    pub fallback_limit: usize,

    /// Default result cap for aggregated search
    #[serde(default = "default_aggregate_limit")]
    pub aggregate_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_timeout_ms: default_search_timeout_ms(),
            details_timeout_ms: default_details_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            fallback_source: default_fallback_source(),
            fallback_limit: default_fallback_limit(),
            aggregate_limit: default_aggregate_limit(),
        }
    }
}

/// `[events]` section
#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// Broadcast channel capacity
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

/// `[database]` section
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL for the session store
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

/// `[server]` section
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen address of the HTTP API
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// One entry of a genre's source list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourcePriority {
    pub source: String,
    pub priority: u32,
}

impl SourcePriority {
    pub fn new(source: impl Into<String>, priority: u32) -> Self {
        Self {
            source: source.into(),
            priority,
        }
    }
}

fn default_search_timeout_ms() -> u64 {
    10_000
}

fn default_details_timeout_ms() -> u64 {
    5_000
}

fn default_cache_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_fallback_source() -> String {
    "firecrawl".to_string()
}

fn default_fallback_limit() -> usize {
    5
}

fn default_aggregate_limit() -> usize {
    10
}

fn default_event_capacity() -> usize {
    100
}

fn default_database_url() -> String {
    "sqlite://persona_discovery.db?mode=rwc".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:5730".to_string()
}

impl DiscoveryConfig {
    /// Resolve, load and apply environment overrides
    pub fn load(explicit: Option<&Path>) -> persona_common::Result<Self> {
        let path = resolve_config_file(explicit, CONFIG_ENV_VAR, CONFIG_FILE_NAME);
        let mut config: DiscoveryConfig = load_toml(path.as_deref())?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `PERSONA_*` value overrides
    pub fn apply_env_overrides(&mut self) -> persona_common::Result<()> {
        if let Some(ms) = env_override::<u64>("PERSONA_SEARCH_TIMEOUT_MS")? {
            info!(search_timeout_ms = ms, "Search timeout overridden from environment");
            self.search.search_timeout_ms = ms;
        }
        if let Some(ms) = env_override::<u64>("PERSONA_DETAILS_TIMEOUT_MS")? {
            info!(details_timeout_ms = ms, "Details timeout overridden from environment");
            self.search.details_timeout_ms = ms;
        }
        if let Some(secs) = env_override::<u64>("PERSONA_CACHE_TTL_SECS")? {
            info!(cache_ttl_secs = secs, "Cache TTL overridden from environment");
            self.search.cache_ttl_secs = secs;
        }
        Ok(())
    }

    /// Router settings derived from the `[search]` section
    pub fn router_settings(&self) -> RouterSettings {
        let fallback = self.search.fallback_source.trim();
        RouterSettings {
            search_timeout: Duration::from_millis(self.search.search_timeout_ms),
            details_timeout: Duration::from_millis(self.search.details_timeout_ms),
            cache_ttl: Duration::from_secs(self.search.cache_ttl_secs),
            fallback_source: (!fallback.is_empty()).then(|| fallback.to_string()),
            fallback_limit: self.search.fallback_limit,
            aggregate_limit: self.search.aggregate_limit,
        }
    }

    /// Built-in priorities with this file's overrides applied
    pub fn genre_priorities(&self) -> GenrePriorities {
        let mut priorities = GenrePriorities::default();
        for (name, sources) in &self.genres {
            match name.parse::<GenreId>() {
                Ok(genre) => priorities.set(genre, sources.clone()),
                Err(e) => warn!(genre = %name, "Ignoring genre override: {}", e),
            }
        }
        priorities
    }
}

/// Runtime knobs of the search router
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub search_timeout: Duration,
    pub details_timeout: Duration,
    pub cache_ttl: Duration,
    pub fallback_source: Option<String>,
    pub fallback_limit: usize,
    pub aggregate_limit: usize,
}

impl Default for RouterSettings {
    fn default() -> Self {
        DiscoveryConfig::default().router_settings()
    }
}

/// Static genre to source priority mapping
///
/// Read-only once handed to the router.
#[derive(Debug, Clone)]
pub struct GenrePriorities {
    table: BTreeMap<GenreId, Vec<SourcePriority>>,
}

impl GenrePriorities {
    /// A table with no genres configured
    pub fn empty() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// Replace the list for one genre
    pub fn set(&mut self, genre: GenreId, sources: Vec<SourcePriority>) {
        self.table.insert(genre, sources);
    }

    pub fn with(mut self, genre: GenreId, sources: Vec<SourcePriority>) -> Self {
        self.set(genre, sources);
        self
    }

    /// Source ids for `genre`, highest priority first
    ///
    /// Equal priorities keep their configured order.
    pub fn ordered_sources(&self, genre: GenreId) -> Vec<&str> {
        let mut entries: Vec<&SourcePriority> = self
            .table
            .get(&genre)
            .map(|list| list.iter().collect())
            .unwrap_or_default();
        entries.sort_by(|a, b| b.priority.cmp(&a.priority));
        entries.into_iter().map(|e| e.source.as_str()).collect()
    }

    pub fn entries(&self, genre: GenreId) -> &[SourcePriority] {
        self.table.get(&genre).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for GenrePriorities {
    fn default() -> Self {
        let p = SourcePriority::new;
        Self::empty()
            .with(
                GenreId::Romance,
                vec![
                    p("anilist", 10),
                    p("mal", 9),
                    p("jikan", 8),
                    p("tmdb", 5),
                    p("tvmaze", 4),
                    p("wikipedia", 3),
                    p("firecrawl", 1),
                ],
            )
            .with(
                GenreId::Roleplay,
                vec![
                    p("anilist", 10),
                    p("mal", 9),
                    p("igdb", 8),
                    p("tmdb", 7),
                    p("tvmaze", 6),
                    p("wikipedia", 5),
                    p("firecrawl", 1),
                ],
            )
            .with(
                GenreId::Gaming,
                vec![
                    p("igdb", 10),
                    p("wikipedia", 5),
                    p("anilist", 3),
                    p("firecrawl", 1),
                ],
            )
            .with(
                GenreId::Professional,
                vec![
                    p("wikipedia", 10),
                    p("tmdb", 8),
                    p("tvmaze", 7),
                    p("firecrawl", 1),
                ],
            )
            .with(
                GenreId::Friendship,
                vec![
                    p("anilist", 9),
                    p("mal", 8),
                    p("tvmaze", 7),
                    p("tmdb", 6),
                    p("wikipedia", 5),
                    p("firecrawl", 1),
                ],
            )
            .with(
                GenreId::Wellness,
                vec![p("wikipedia", 10), p("firecrawl", 1)],
            )
    }
}
