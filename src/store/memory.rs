//! In-process key-value store with Redis-compatible semantics
//!
//! Used by tests and local tooling in place of a live Redis server. Sorted
//! collections behave like Redis sorted sets: members are unique, re-adding
//! a member updates its score, and equal scores are ordered by member bytes.

use super::{Expiration, KeyValueStore};
use crate::context::CallContext;
use crate::error::{Error, Result};

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug)]
struct ScalarEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl ScalarEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

#[derive(Debug, Default)]
struct StoreData {
    scalars: HashMap<String, ScalarEntry>,
    sorted: HashMap<String, HashMap<Vec<u8>, f64>>,
}

/// In-memory [`KeyValueStore`]
#[derive(Debug)]
pub struct InMemoryStore {
    data: RwLock<StoreData>,

    /// When false every command fails with `StoreUnavailable`
    available: AtomicBool,

    /// Number of commands served
    commands: AtomicU64,
}

impl InMemoryStore {
    /// Create an empty, available store
    pub fn new() -> Self {
        Self {
            data: RwLock::new(StoreData::default()),
            available: AtomicBool::new(true),
            commands: AtomicU64::new(0),
        }
    }

    /// Simulate the backend going away (or coming back)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of commands served so far
    pub fn commands_executed(&self) -> u64 {
        self.commands.load(Ordering::Relaxed)
    }

    /// Number of members in a sorted collection
    pub fn collection_len(&self, key: &str) -> usize {
        self.data.read().sorted.get(key).map_or(0, |c| c.len())
    }

    fn ensure_available(&self) -> Result<()> {
        self.commands.fetch_add(1, Ordering::Relaxed);
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::StoreUnavailable(
                "in-memory store marked unavailable".to_string(),
            ))
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    fn backend_id(&self) -> &str {
        "in-memory"
    }

    async fn get(&self, ctx: &CallContext, key: &str) -> Result<Option<Vec<u8>>> {
        ctx.run(async {
            self.ensure_available()?;
            let now = Instant::now();
            let data = self.data.read();
            Ok(data
                .scalars
                .get(key)
                .filter(|entry| entry.is_live(now))
                .map(|entry| entry.value.clone()))
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
        ctx.run(async move {
            self.ensure_available()?;
            let expires_at = match expiration {
                Expiration::Never => None,
                // Past the clock's range the value effectively never expires
                Expiration::After(d) => Instant::now().checked_add(d),
            };
            self.data
                .write()
                .scalars
                .insert(key.to_string(), ScalarEntry { value, expires_at });
            Ok(())
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
        ctx.run(async move {
            self.ensure_available()?;
            if score.is_nan() {
                return Err(Error::StoreUnavailable(
                    "score is not a valid float".to_string(),
                ));
            }
            self.data
                .write()
                .sorted
                .entry(key.to_string())
                .or_default()
                .insert(member, score);
            Ok(())
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
        ctx.run(async {
            self.ensure_available()?;
            let data = self.data.read();
            let Some(collection) = data.sorted.get(key) else {
                return Ok(Vec::new());
            };

            let mut hits: Vec<(f64, &Vec<u8>)> = collection
                .iter()
                .filter(|(_, score)| **score >= min && **score <= max)
                .map(|(member, score)| (*score, member))
                .collect();
            hits.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));

            debug!("Range [{}, {}] on {} matched {} members", min, max, key, hits.len());
            Ok(hits.into_iter().map(|(_, member)| member.clone()).collect())
        })
        .await
    }
}
