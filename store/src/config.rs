//! Configuration for the persistence layer.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite location: a path, `sqlite:<path>`, or `:memory:`
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

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Create tables on startup. Disabled by `ENABLE_CACHE=false`.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default values
fn default_database_url() -> String {
    "sqlite:./data/newsnow.db".to_string()
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Interprets the `ENABLE_CACHE` toggle: anything but the literal `false` enables.
pub fn parse_enable_flag(value: &str) -> bool {
    value != "false"
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Flat variables `DATABASE_URL`, `ENABLE_CACHE`, `LOG_LEVEL`
    /// 2. Environment variables (NEWSNOW__SECTION__KEY format)
    /// 3. config.toml file (if present)
    /// 4. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .set_default("database.url", default_database_url())?
            .set_default("cache.enabled", default_true())?
            .set_default("logging.level", default_log_level())?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("NEWSNOW")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option(
                "cache.enabled",
                env::var("ENABLE_CACHE").ok().map(|v| parse_enable_flag(&v)),
            )?
            .set_override_option("logging.level", env::var("LOG_LEVEL").ok())?
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_database_config() {
        let db = DatabaseConfig::default();
        assert_eq!(db.url, "sqlite:./data/newsnow.db");
    }

    #[test]
    fn test_default_cache_enabled() {
        assert!(CacheConfig::default().enabled);
        assert_eq!(LoggingConfig::default().level, "info");
    }

    #[test]
    fn test_parse_enable_flag() {
        assert!(!parse_enable_flag("false"));
        assert!(parse_enable_flag("true"));
        assert!(parse_enable_flag(""));
        // only the exact lowercase literal disables
        assert!(parse_enable_flag("FALSE"));
        assert!(parse_enable_flag("0"));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: Config = ConfigLoader::builder()
            .set_override("database.url", ":memory:")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.database.url, ":memory:");
        assert!(config.cache.enabled);
        assert_eq!(config.logging.level, "info");
    }
}
