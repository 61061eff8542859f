//! Configuration management.
//!
//! Settings come from an optional TOML file layered with `READ_SPHERE_*`
//! environment variables. Every field has a default, so running with no
//! configuration at all talks to the public OpenLibrary endpoints.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! base_url = "https://openlibrary.org"
//! covers_url = "https://covers.openlibrary.org"
//! page_size = 20
//! timeout_seconds = 30
//!
//! [cache]
//! stale_time_seconds = 300
//! gc_time_seconds = 600
//!
//! [search]
//! debounce_ms = 400
//! initial_query = "science"
//!
//! [grid]
//! overscan = 3
//! default_viewport_height = 900
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! Environment overrides use `__` between section and key, e.g.
//! `READ_SPHERE_API__PAGE_SIZE=50`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "READ_SPHERE";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// In-memory query cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Search input settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Grid virtualization settings
    #[serde(default)]
    pub grid: GridConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the search endpoint host
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base URL of the covers host
    #[serde(default = "default_covers_url")]
    pub covers_url: String,

    /// Books requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Custom user agent (defaults to crate name/version)
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            covers_url: default_covers_url(),
            page_size: default_page_size(),
            timeout_seconds: default_timeout(),
            user_agent: None,
        }
    }
}

impl ApiConfig {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_base_url() -> String {
    "https://openlibrary.org".to_string()
}

fn default_covers_url() -> String {
    "https://covers.openlibrary.org".to_string()
}

fn default_page_size() -> u32 {
    crate::models::DEFAULT_PAGE_SIZE
}

fn default_timeout() -> u64 {
    30
}

/// Query cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a fetched page counts as fresh
    #[serde(default = "default_stale_time")]
    pub stale_time_seconds: u64,

    /// How long an unobserved query stays cached
    #[serde(default = "default_gc_time")]
    pub gc_time_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_seconds: default_stale_time(),
            gc_time_seconds: default_gc_time(),
        }
    }
}

impl CacheConfig {
    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_time_seconds)
    }

    pub fn gc_time(&self) -> Duration {
        Duration::from_secs(self.gc_time_seconds)
    }
}

fn default_stale_time() -> u64 {
    300 // 5 minutes
}

fn default_gc_time() -> u64 {
    600 // 10 minutes
}

/// Search input configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Debounce window for typed input
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Query shown when the library opens
    #[serde(default = "default_initial_query")]
    pub initial_query: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            initial_query: default_initial_query(),
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_debounce_ms() -> u64 {
    400
}

fn default_initial_query() -> String {
    "science".to_string()
}

/// Grid configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Rows rendered beyond each edge of the viewport
    #[serde(default = "default_overscan")]
    pub overscan: usize,

    /// Viewport height in pixels when the terminal size is unknown
    #[serde(default = "default_viewport_height")]
    pub default_viewport_height: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            overscan: default_overscan(),
            default_viewport_height: default_viewport_height(),
        }
    }
}

fn default_overscan() -> usize {
    3
}

fn default_viewport_height() -> u32 {
    900
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `"json"` switches the subscriber to JSON output
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Config {
    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Load configuration from environment variables only
pub fn load_from_env() -> Result<Config, ConfigError> {
    let settings = config::Config::builder()
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Find a configuration file in the default locations
///
/// Checks `./read-sphere.toml` first, then the platform config directory
/// (`~/.config/read-sphere/config.toml` on Linux).
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("read-sphere.toml");
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("read-sphere").join("config.toml"))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://openlibrary.org");
        assert_eq!(config.api.page_size, 20);
        assert_eq!(config.search.debounce(), Duration::from_millis(400));
        assert_eq!(config.cache.stale_time(), Duration::from_secs(300));
        assert_eq!(config.cache.gc_time(), Duration::from_secs(600));
        assert_eq!(config.grid.overscan, 3);
        assert_eq!(config.search.initial_query, "science");
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[api]
page_size = 40

[search]
debounce_ms = 250

[logging]
level = "debug"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.api.page_size, 40);
        assert_eq!(config.api.base_url, "https://openlibrary.org");
        assert_eq!(config.search.debounce_ms, 250);
        assert_eq!(config.search.initial_query, "science");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.cache, CacheConfig::default());
    }

    #[test]
    fn test_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.grid.overscan = 5;
        config.api.covers_url = "http://localhost:9000".to_string();
        config.save(&path).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.grid.overscan, 5);
        assert_eq!(loaded.api.covers_url, "http://localhost:9000");
    }

    #[test]
    fn test_load_nonexistent() {
        let result = load_config(Path::new("/nonexistent/read-sphere.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");
        std::fs::write(&path, "invalid = toml = content").unwrap();
        assert!(load_config(&path).is_err());
    }
}
