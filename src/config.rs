//! Configuration Module
//!
//! Handles loading and managing gateway configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::classify::RoutePatterns;

/// Paths pre-cached into the static store at install.
pub const DEFAULT_MANIFEST: &[&str] = &[
    "/",
    "/static/css/style.css",
    "/static/js/main.js",
    "/static/manifest.json",
    "/offline/",
];

// == Cache Version ==
/// Version tag the running gateway names its stores with.
///
/// Bumping the tag makes activation purge every store of the previous tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheVersion {
    pub prefix: String,
    pub tag: String,
}

impl CacheVersion {
    pub fn new(prefix: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            tag: tag.into(),
        }
    }

    /// Name of the store holding pre-cached static assets.
    pub fn static_store(&self) -> String {
        format!("{}-static-{}", self.prefix, self.tag)
    }

    /// Name of the store filled at runtime.
    pub fn dynamic_store(&self) -> String {
        format!("{}-dynamic-{}", self.prefix, self.tag)
    }
}

/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Origin every intercepted request is forwarded to
    pub upstream_url: String,
    /// Current store version
    pub version: CacheVersion,
    /// Ordered list of absolute paths pre-cached at install
    pub manifest: Vec<String>,
    /// Document served to page requests when nothing else is available
    pub offline_page: String,
    /// Maximum number of entries kept in the dynamic store
    pub max_dynamic_entries: usize,
    /// Size governor interval in seconds
    pub trim_interval: u64,
    /// Directory store snapshots are persisted to, in-memory only when unset
    pub cache_dir: Option<PathBuf>,
    /// Path patterns driving request classification
    pub patterns: RoutePatterns,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `UPSTREAM_URL` - Network origin (default: http://127.0.0.1:8000)
    /// - `CACHE_PREFIX` - Store name prefix (default: store)
    /// - `CACHE_VERSION` - Store version tag (default: v1)
    /// - `PRECACHE_MANIFEST` - Comma-separated paths to pre-cache
    /// - `OFFLINE_PAGE` - Offline fallback document (default: /offline/)
    /// - `MAX_DYNAMIC_ENTRIES` - Dynamic store bound (default: 100)
    /// - `TRIM_INTERVAL` - Size governor frequency in seconds (default: 300)
    /// - `CACHE_DIR` - Snapshot directory (default: unset, in-memory)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_port: parsed_var("SERVER_PORT").unwrap_or(defaults.server_port),
            upstream_url: env::var("UPSTREAM_URL").unwrap_or(defaults.upstream_url),
            version: CacheVersion::new(
                env::var("CACHE_PREFIX").unwrap_or(defaults.version.prefix),
                env::var("CACHE_VERSION").unwrap_or(defaults.version.tag),
            ),
            manifest: env::var("PRECACHE_MANIFEST")
                .map(|v| parse_manifest(&v))
                .unwrap_or(defaults.manifest),
            offline_page: env::var("OFFLINE_PAGE").unwrap_or(defaults.offline_page),
            max_dynamic_entries: parsed_var("MAX_DYNAMIC_ENTRIES")
                .unwrap_or(defaults.max_dynamic_entries),
            trim_interval: parsed_var("TRIM_INTERVAL").unwrap_or(defaults.trim_interval),
            cache_dir: env::var("CACHE_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            patterns: defaults.patterns,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            upstream_url: "http://127.0.0.1:8000".to_string(),
            version: CacheVersion::new("store", "v1"),
            manifest: DEFAULT_MANIFEST.iter().map(|p| p.to_string()).collect(),
            offline_page: "/offline/".to_string(),
            max_dynamic_entries: 100,
            trim_interval: 300,
            cache_dir: None,
            patterns: RoutePatterns::default(),
        }
    }
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Splits a comma-separated manifest, dropping blanks.
fn parse_manifest(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
