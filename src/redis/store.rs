//! Redis implementation of [`KeyValueStore`]
//!
//! | Capability       | Redis command                     |
//! |------------------|-----------------------------------|
//! | `get`            | `GET key`                         |
//! | `set`            | `SET key value [PX milliseconds]` |
//! | `add_scored`     | `ZADD key score member`           |
//! | `range_by_score` | `ZRANGEBYSCORE key min max`       |

use super::connection::{CommandStats, RedisConfig, RedisConnection};
use crate::context::CallContext;
use crate::error::Result;
use crate::store::{Expiration, KeyValueStore};

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Key-value store backed by a Redis server
#[derive(Clone)]
pub struct RedisStore {
    connection: Arc<RedisConnection>,
}

impl RedisStore {
    /// Connect to Redis
    pub async fn connect(config: RedisConfig) -> Result<Self> {
        let connection = RedisConnection::new(config).await?;
        Ok(Self::from_connection(Arc::new(connection)))
    }

    /// Connect to Redis using a URL and default settings
    pub async fn open(url: &str) -> Result<Self> {
        Self::connect(RedisConfig::with_url(url)).await
    }

    /// Wrap an existing connection handle
    pub fn from_connection(connection: Arc<RedisConnection>) -> Self {
        Self { connection }
    }

    /// Underlying connection handle
    pub fn connection(&self) -> &RedisConnection {
        &self.connection
    }

    /// Command counters of the underlying connection
    pub fn stats(&self) -> CommandStats {
        self.connection.stats()
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    fn backend_id(&self) -> &str {
        "redis"
    }

    async fn get(&self, ctx: &CallContext, key: &str) -> Result<Option<Vec<u8>>> {
        let key = key.to_string();
        self.connection
            .execute(ctx, |mut conn| async move {
                redis::cmd("GET")
                    .arg(&key)
                    .query_async::<Option<Vec<u8>>>(&mut conn)
                    .await
            })
            .await
    }

    async fn set(
        &self,
        ctx: &CallContext,
        key: &str,
        value: Vec<u8>,
        expiration: Expiration,
    ) -> Result<()> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ms) = expiration.as_millis() {
            cmd.arg("PX").arg(ms);
        }

        self.connection
            .execute(ctx, |mut conn| async move {
                cmd.query_async::<()>(&mut conn).await
            })
            .await
    }

    async fn add_scored(
        &self,
        ctx: &CallContext,
        key: &str,
        score: f64,
        member: Vec<u8>,
    ) -> Result<()> {
        let mut cmd = redis::cmd("ZADD");
        cmd.arg(key).arg(score).arg(member);

        self.connection
            .execute(ctx, |mut conn| async move {
                cmd.query_async::<()>(&mut conn).await
            })
            .await
    }

    async fn range_by_score(
        &self,
        ctx: &CallContext,
        key: &str,
        min: f64,
        max: f64,
    ) -> Result<Vec<Vec<u8>>> {
        let mut cmd = redis::cmd("ZRANGEBYSCORE");
        cmd.arg(key).arg(min).arg(max);

        let members = self
            .connection
            .execute(ctx, |mut conn| async move {
                cmd.query_async::<Vec<Vec<u8>>>(&mut conn).await
            })
            .await?;

        debug!(
            "ZRANGEBYSCORE {} [{}, {}] returned {} members",
            key,
            min,
            max,
            members.len()
        );
        Ok(members)
    }
}
