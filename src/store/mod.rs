//! Key-value store capability used by the time-series core
//!
//! The core never talks to a concrete client. It is handed an
//! `Arc<dyn KeyValueStore>` that provides scalar get/set and a sorted
//! collection keyed by a numeric score:
//!
//! ```text
//! get(key)                          → bytes | None
//! set(key, bytes, expiration)
//! add_scored(collection, score, member)
//! range_by_score(collection, min, max) → [member] ascending, both bounds inclusive
//! ```
//!
//! [`crate::redis::RedisStore`] maps these onto `GET`, `SET`, `ZADD` and
//! `ZRANGEBYSCORE`; [`InMemoryStore`] reproduces the same semantics in
//! process for tests and local tooling.

mod memory;

pub use memory::InMemoryStore;

use crate::codec::{from_json_bytes, to_json_bytes};
use crate::context::CallContext;
use crate::error::Result;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Lifetime of a scalar value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Expiration {
    /// Keep the value until overwritten
    #[default]
    Never,

    /// Drop the value after the given duration (millisecond precision)
    After(Duration),
}

impl Expiration {
    /// Expiration from a duration where zero means "never"
    pub fn from_duration(duration: Duration) -> Self {
        if duration.is_zero() {
            Expiration::Never
        } else {
            Expiration::After(duration)
        }
    }

    /// Expiration in whole milliseconds, rounded up so it never becomes zero
    pub fn as_millis(&self) -> Option<u64> {
        match self {
            Expiration::Never => None,
            Expiration::After(d) => {
                let ms = d.as_millis().min(u64::MAX as u128) as u64;
                let ms = if d.subsec_nanos() % 1_000_000 != 0 {
                    ms.saturating_add(1)
                } else {
                    ms
                };
                Some(ms.max(1))
            },
        }
    }
}

/// Capability set the time-series core needs from a key-value backend
///
/// Every call takes the caller's [`CallContext`] and must give up with
/// `Cancelled`/`DeadlineExceeded` when it fires. Implementations never retry.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Identifier of this backend, for logs
    fn backend_id(&self) -> &str;

    /// Read a scalar value; `None` if the key does not exist
    async fn get(&self, ctx: &CallContext, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a scalar value
    async fn set(
        &self,
        ctx: &CallContext,
        key: &str,
        value: Vec<u8>,
        expiration: Expiration,
    ) -> Result<()>;

    /// Insert `member` into the sorted collection `key` with `score`
    ///
    /// Re-adding a member that is already present moves it to the new score.
    async fn add_scored(
        &self,
        ctx: &CallContext,
        key: &str,
        score: f64,
        member: Vec<u8>,
    ) -> Result<()>;

    /// Members of `key` with `min <= score <= max`, ascending by score
    ///
    /// Members with equal scores come back in lexicographic byte order. A
    /// missing collection yields an empty vector.
    async fn range_by_score(
        &self,
        ctx: &CallContext,
        key: &str,
        min: f64,
        max: f64,
    ) -> Result<Vec<Vec<u8>>>;
}

/// Read a string value
pub async fn get_string(
    store: &dyn KeyValueStore,
    ctx: &CallContext,
    key: &str,
) -> Result<Option<String>> {
    match store.get(ctx, key).await? {
        Some(bytes) => String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| crate::error::Error::Decode(e.to_string())),
        None => Ok(None),
    }
}

/// Write a string value
pub async fn set_string(
    store: &dyn KeyValueStore,
    ctx: &CallContext,
    key: &str,
    value: &str,
    expiration: Expiration,
) -> Result<()> {
    store
        .set(ctx, key, value.as_bytes().to_vec(), expiration)
        .await
}

/// Read a structured value stored as JSON
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    ctx: &CallContext,
    key: &str,
) -> Result<Option<T>> {
    match store.get(ctx, key).await? {
        Some(bytes) => from_json_bytes(&bytes).map(Some),
        None => Ok(None),
    }
}

/// Write a structured value as JSON
pub async fn set_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    ctx: &CallContext,
    key: &str,
    value: &T,
    expiration: Expiration,
) -> Result<()> {
    let payload = to_json_bytes(value)?;
    store.set(ctx, key, payload, expiration).await
}
