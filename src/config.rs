//! Configuration management for domain stats
//!
//! TOML file support, environment variable overrides and sensible defaults.
//!
//! ```toml
//! [redis]
//! url = "redis://localhost:6379/0"
//! connection_timeout_ms = 5000
//! command_timeout_ms = 1000
//!
//! [series]
//! key_prefix = "stats"
//!
//! [registry]
//! domains = ["foo.com", "bar.com"]
//!
//! [logging]
//! level = "info"
//! ```

use crate::error::{Error, Result};
use crate::redis::RedisConfig;
use crate::registry::StaticRegistry;
use crate::series::DEFAULT_KEY_PREFIX;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Redis connection settings
    #[serde(default)]
    pub redis: RedisSection,

    /// Series naming
    #[serde(default)]
    pub series: SeriesSection,

    /// Known domains
    #[serde(default)]
    pub registry: RegistrySection,

    /// Logging
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Redis connection settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RedisSection {
    /// Redis server URL
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection timeout in milliseconds
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// Per-command timeout in milliseconds (unset = none)
    #[serde(default)]
    pub command_timeout_ms: Option<u64>,

    /// Enable TLS
    #[serde(default)]
    pub tls: bool,
}

/// Series naming
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SeriesSection {
    /// Prefix of every series key (`{prefix}-domain-{entity}`)
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

/// Domain registry contents
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RegistrySection {
    /// Domains aggregated by `get_all_series`
    #[serde(default)]
    pub domains: Vec<String>,
}

/// Logging
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingSection {
    /// Log level or filter directive (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_redis_url() -> String { "redis://127.0.0.1:6379/0".to_string() }
fn default_connection_timeout_ms() -> u64 { 5_000 }
fn default_key_prefix() -> String { DEFAULT_KEY_PREFIX.to_string() }
fn default_log_level() -> String { "info".to_string() }

impl Default for RedisSection {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            connection_timeout_ms: default_connection_timeout_ms(),
            command_timeout_ms: None,
            tls: false,
        }
    }
}

impl Default for SeriesSection {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        Self::from_toml(&contents).map_err(|e| {
            Error::Configuration(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from environment variables only
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var("DOMAIN_STATS_REDIS_URL") {
            self.redis.url = url;
        }
        if let Some(ms) = var("DOMAIN_STATS_COMMAND_TIMEOUT_MS") {
            if let Ok(ms) = ms.parse() {
                self.redis.command_timeout_ms = Some(ms);
            }
        }
        if let Some(prefix) = var("DOMAIN_STATS_KEY_PREFIX") {
            self.series.key_prefix = prefix;
        }
        if let Some(domains) = var("DOMAIN_STATS_DOMAINS") {
            self.registry.domains = domains
                .split(',')
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .collect();
        }
        if let Some(level) = var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.redis_config().validate().map_err(Error::Configuration)?;

        if self.series.key_prefix.is_empty() {
            return Err(Error::Configuration("Key prefix cannot be empty".to_string()));
        }
        if let Some(bad) = self
            .registry
            .domains
            .iter()
            .find(|d| d.trim().is_empty() || d.contains(char::is_whitespace))
        {
            return Err(Error::Configuration(format!("Invalid domain name: {:?}", bad)));
        }
        Ok(())
    }

    /// Redis connection settings
    pub fn redis_config(&self) -> RedisConfig {
        let mut config = RedisConfig::with_url(self.redis.url.clone())
            .connection_timeout(Duration::from_millis(self.redis.connection_timeout_ms))
            .tls(self.redis.tls);
        config.command_timeout = self.redis.command_timeout_ms.map(Duration::from_millis);
        config
    }

    /// Registry of the configured domains
    pub fn registry(&self) -> StaticRegistry {
        StaticRegistry::new(&self.registry.domains)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents).map_err(|e| {
            Error::Configuration(format!("Failed to write config file {}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DomainRegistry;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.redis.url, "redis://127.0.0.1:6379/0");
        assert_eq!(config.series.key_prefix, "stats");
        assert!(config.registry.domains.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = Config::from_toml(
            r#"
            [registry]
            domains = ["foo.com", "bar.com"]

            [redis]
            url = "redis://cache:6379/2"
            command_timeout_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.redis.url, "redis://cache:6379/2");
        assert_eq!(config.redis.connection_timeout_ms, 5_000);
        assert_eq!(
            config.redis_config().command_timeout,
            Some(Duration::from_millis(250))
        );
        assert_eq!(config.series.key_prefix, "stats");
        assert_eq!(config.registry().list_entities().len(), 2);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DOMAIN_STATS_REDIS_URL", "redis://other:6380"),
            ("DOMAIN_STATS_KEY_PREFIX", "prod"),
            ("DOMAIN_STATS_DOMAINS", "a.com, b.com,,c.com"),
            ("DOMAIN_STATS_COMMAND_TIMEOUT_MS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.redis.url, "redis://other:6380");
        assert_eq!(config.series.key_prefix, "prod");
        assert_eq!(config.registry.domains, vec!["a.com", "b.com", "c.com"]);
        assert_eq!(config.redis.command_timeout_ms, None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_config() {
        let mut config = Config::default();
        config.series.key_prefix.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.redis.url = "http://wrong".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.registry.domains = vec!["foo .com".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domain-stats.toml");

        let mut config = Config::default();
        config.registry.domains = vec!["foo.com".to_string()];
        config.redis.command_timeout_ms = Some(100);
        config.save_to_file(&path).unwrap();

        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
