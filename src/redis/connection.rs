//! Redis connection handling
//!
//! Holds a single multiplexed connection (Redis multiplexes commands over
//! it internally) with:
//! - Configurable connection timeout and optional per-command timeout
//! - Lazy reconnection after the connection drops
//! - Command and connect counters
//!
//! Failed commands are never retried here; the error goes straight back to
//! the caller.
//!
//! # Example
//!
//! ```rust,no_run
//! use domain_stats::redis::{RedisConfig, RedisConnection};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RedisConfig::with_url("redis://localhost:6379")
//!     .connection_timeout(Duration::from_secs(2));
//!
//! let connection = RedisConnection::new(config).await?;
//! # Ok(())
//! # }
//! ```

use crate::context::CallContext;
use crate::error::{Error, Result};
use redis::aio::MultiplexedConnection;
use redis::{Client, RedisError, RedisResult};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::util::safe_redis_error;

/// Configuration for the Redis connection
#[derive(Clone, Debug)]
pub struct RedisConfig {
    /// Redis server URL (e.g., "redis://localhost:6379/0")
    pub url: String,

    /// Timeout for establishing a connection
    /// Default: 5 seconds
    pub connection_timeout: Duration,

    /// Timeout for individual commands, on top of the caller's context
    /// Default: none
    pub command_timeout: Option<Duration>,

    /// Enable TLS for connections
    /// Default: false
    pub tls_enabled: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            connection_timeout: Duration::from_secs(5),
            command_timeout: None,
            tls_enabled: false,
        }
    }
}

impl RedisConfig {
    /// Create a new config with the specified URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the connection timeout
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the per-command timeout
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Enable or disable TLS (`rediss://`)
    pub fn tls(mut self, enabled: bool) -> Self {
        self.tls_enabled = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.url.is_empty() {
            return Err("Redis URL cannot be empty".to_string());
        }
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err("Redis URL must use the 'redis://' or 'rediss://' scheme".to_string());
        }
        if self.connection_timeout.is_zero() {
            return Err("Connection timeout must be greater than 0".to_string());
        }
        if self.command_timeout.is_some_and(|t| t.is_zero()) {
            return Err("Command timeout must be greater than 0 when set".to_string());
        }
        Ok(())
    }

    /// Get the effective URL for connection
    ///
    /// Converts between `redis://` and `rediss://` based on TLS setting.
    pub fn effective_url(&self) -> String {
        if self.tls_enabled && self.url.starts_with("redis://") {
            format!("rediss://{}", &self.url[8..])
        } else if !self.tls_enabled && self.url.starts_with("rediss://") {
            format!("redis://{}", &self.url[9..])
        } else {
            self.url.clone()
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    connects: AtomicU64,
    connect_failures: AtomicU64,
    commands: AtomicU64,
    command_failures: AtomicU64,
}

/// Command counters of a [`RedisConnection`] since it was opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandStats {
    /// Connections established, including reconnects
    pub connects: u64,
    /// Connection attempts that failed or timed out
    pub connect_failures: u64,
    /// Commands answered by Redis
    pub commands: u64,
    /// Commands that failed or timed out
    pub command_failures: u64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CommandStats {
        CommandStats {
            connects: self.connects.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
            commands: self.commands.load(Ordering::Relaxed),
            command_failures: self.command_failures.load(Ordering::Relaxed),
        }
    }
}

/// Redis connection handle
///
/// Cheap to share behind an `Arc`; commands run concurrently over the
/// multiplexed connection.
pub struct RedisConnection {
    client: Client,
    connection: RwLock<Option<MultiplexedConnection>>,
    config: RedisConfig,
    counters: Counters,
}

impl RedisConnection {
    /// Open a client and establish the initial connection
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let connection = Self::lazy(config)?;
        connection.connect().await?;
        debug!("Redis connection initialized");
        Ok(connection)
    }

    /// Open a client without connecting; the first command connects
    pub fn lazy(config: RedisConfig) -> Result<Self> {
        config.validate().map_err(Error::Configuration)?;

        // Sanitized URL in error messages to prevent credential leakage
        let url = config.effective_url();
        let client = Client::open(url.as_str())
            .map_err(|e| Error::Configuration(safe_redis_error(&url, &e)))?;

        Ok(Self {
            client,
            connection: RwLock::new(None),
            config,
            counters: Counters::default(),
        })
    }

    async fn connect(&self) -> Result<MultiplexedConnection> {
        let start = Instant::now();

        let conn = tokio::time::timeout(
            self.config.connection_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| {
            Counters::bump(&self.counters.connect_failures);
            Error::StoreUnavailable("Connection timeout".to_string())
        })?
        .map_err(|e| {
            Counters::bump(&self.counters.connect_failures);
            Error::StoreUnavailable(safe_redis_error(&self.config.url, &e))
        })?;

        *self.connection.write().await = Some(conn.clone());
        Counters::bump(&self.counters.connects);

        debug!("Redis connection established in {:?}", start.elapsed());
        Ok(conn)
    }

    async fn current(&self) -> Result<MultiplexedConnection> {
        let cached = self.connection.read().await.clone();
        match cached {
            Some(conn) => Ok(conn),
            None => self.connect().await,
        }
    }

    /// Execute one command under the caller's context
    ///
    /// A dropped connection is discarded so the next command reconnects; the
    /// failing command itself is not retried.
    pub async fn execute<F, Fut, T>(&self, ctx: &CallContext, f: F) -> Result<T>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        ctx.run(async move {
            let conn = self.current().await?;

            let result = match self.config.command_timeout {
                Some(timeout) => tokio::time::timeout(timeout, f(conn))
                    .await
                    .map_err(|_| Error::StoreUnavailable("Command timeout".to_string())),
                None => Ok(f(conn).await),
            };

            match result {
                Ok(Ok(value)) => {
                    Counters::bump(&self.counters.commands);
                    Ok(value)
                },
                Ok(Err(e)) => {
                    Counters::bump(&self.counters.command_failures);
                    if is_connection_error(&e) {
                        warn!("Redis connection lost, reconnecting on next command");
                        *self.connection.write().await = None;
                    }
                    Err(Error::StoreUnavailable(safe_redis_error(&self.config.url, &e)))
                },
                Err(timeout) => {
                    Counters::bump(&self.counters.command_failures);
                    Err(timeout)
                },
            }
        })
        .await
    }

    /// Send a PING and report whether Redis answered
    pub async fn ping(&self, ctx: &CallContext) -> Result<()> {
        let reply: String = self
            .execute(ctx, |mut conn| async move {
                redis::cmd("PING").query_async(&mut conn).await
            })
            .await?;
        debug!("Redis PING answered: {}", reply);
        Ok(())
    }

    /// Command counters since the handle was opened
    pub fn stats(&self) -> CommandStats {
        self.counters.snapshot()
    }

    /// Get the connection configuration
    pub fn config(&self) -> &RedisConfig {
        &self.config
    }
}

/// Check if an error means the connection must be re-established
fn is_connection_error(e: &RedisError) -> bool {
    e.is_connection_dropped() || e.is_io_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RedisConfig::default();
        assert_eq!(config.connection_timeout, Duration::from_secs(5));
        assert!(config.command_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = RedisConfig {
            url: "".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RedisConfig::with_url("http://localhost:6379");
        assert!(config.validate().is_err());

        let config = RedisConfig::with_url("redis://localhost").connection_timeout(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = RedisConfig::with_url("redis://localhost").command_timeout(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = RedisConfig::with_url("redis://localhost/0");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_effective_url() {
        let config = RedisConfig::with_url("redis://localhost:6379").tls(true);
        assert_eq!(config.effective_url(), "rediss://localhost:6379");

        let config = RedisConfig::with_url("rediss://localhost:6379").tls(false);
        assert_eq!(config.effective_url(), "redis://localhost:6379");

        let config = RedisConfig::with_url("rediss://localhost:6379").tls(true);
        assert_eq!(config.effective_url(), "rediss://localhost:6379");
    }

    #[test]
    fn test_command_stats_snapshot() {
        let counters = Counters::default();
        Counters::bump(&counters.connects);
        Counters::bump(&counters.commands);
        Counters::bump(&counters.commands);
        Counters::bump(&counters.command_failures);

        let stats = counters.snapshot();
        assert_eq!(stats.connects, 1);
        assert_eq!(stats.connect_failures, 0);
        assert_eq!(stats.commands, 2);
        assert_eq!(stats.command_failures, 1);
    }

    #[test]
    fn test_lazy_rejects_invalid_config() {
        let result = RedisConnection::lazy(RedisConfig::with_url(""));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[tokio::test]
    async fn test_cancelled_context_does_not_connect() {
        let connection =
            RedisConnection::lazy(RedisConfig::with_url("redis://127.0.0.1:1")).unwrap();
        let ctx = CallContext::background();
        ctx.cancel();

        let result = connection.ping(&ctx).await;
        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(connection.stats(), CommandStats::default());
    }
}
