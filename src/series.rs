//! Per-entity snapshot series
//!
//! Every entity owns one sorted collection named `{prefix}-domain-{entity}`.
//! Members are encoded [`CounterSet`]s scored by observation time in epoch
//! milliseconds, so a score window is a time window.
//!
//! # Example
//!
//! ```rust
//! use domain_stats::context::CallContext;
//! use domain_stats::series::TimeSeriesStore;
//! use domain_stats::store::InMemoryStore;
//! use domain_stats::types::CounterSet;
//! use chrono::{TimeZone, Utc};
//! use std::sync::Arc;
//!
//! # async fn example() -> domain_stats::Result<()> {
//! let series = TimeSeriesStore::new(Arc::new(InMemoryStore::new()), "stats");
//! let ctx = CallContext::background();
//! let t = Utc.with_ymd_and_hms(2009, 11, 10, 2, 1, 2).unwrap();
//!
//! series.add_snapshot(&ctx, "foo.com", &CounterSet::new(1, 0, 0, 0), t).await?;
//! let counters = series.query_counters(&ctx, "foo.com", t, t).await?;
//! assert_eq!(counters, vec![CounterSet::new(1, 0, 0, 0)]);
//! # Ok(())
//! # }
//! ```

use crate::codec::SnapshotCodec;
use crate::context::CallContext;
use crate::error::Result;
use crate::store::KeyValueStore;
use crate::types::{CounterSet, Score, Snapshot};

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Default key prefix for series collections
pub const DEFAULT_KEY_PREFIX: &str = "stats";

const SERIES_KEY_INFIX: &str = "-domain-";

/// Appends and range-reads counter snapshots
#[derive(Clone)]
pub struct TimeSeriesStore {
    store: Arc<dyn KeyValueStore>,
    key_prefix: String,
}

impl TimeSeriesStore {
    /// Create a series store over `store`, naming collections with `key_prefix`
    pub fn new(store: Arc<dyn KeyValueStore>, key_prefix: impl Into<String>) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
        }
    }

    /// Underlying key-value store
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Collection key for an entity
    pub fn series_key(&self, entity_key: &str) -> String {
        format!("{}{}{}", self.key_prefix, SERIES_KEY_INFIX, entity_key)
    }

    /// Record `value` as observed for `entity_key` at `timestamp`
    ///
    /// Every call adds a new member; identical calls are counted twice.
    pub async fn add_snapshot(
        &self,
        ctx: &CallContext,
        entity_key: &str,
        value: &CounterSet,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        let payload = SnapshotCodec::encode(value)?;
        let score = Score::from_time(timestamp);
        let key = self.series_key(entity_key);

        self.store
            .add_scored(ctx, &key, score.as_f64(), payload)
            .await?;

        debug!("Added snapshot to {} at {}: {}", key, score.0, value);
        Ok(())
    }

    /// Record a [`Snapshot`]
    pub async fn add(&self, ctx: &CallContext, snapshot: &Snapshot) -> Result<()> {
        self.add_snapshot(ctx, &snapshot.entity_key, &snapshot.value, snapshot.timestamp)
            .await
    }

    /// Raw members of `entity_key` observed in `[start, stop]`, oldest first
    ///
    /// Both bounds are inclusive at millisecond precision. An unknown entity
    /// or an empty window yields an empty vector.
    pub async fn query_range(
        &self,
        ctx: &CallContext,
        entity_key: &str,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
    ) -> Result<Vec<Vec<u8>>> {
        let key = self.series_key(entity_key);
        let (min, max) = (Score::from_time(start), Score::from_time(stop));

        self.store
            .range_by_score(ctx, &key, min.as_f64(), max.as_f64())
            .await
    }

    /// Decoded counters of `entity_key` observed in `[start, stop]`
    ///
    /// Fails with `Decode` if any member in the window is malformed; no
    /// partial result is returned.
    pub async fn query_counters(
        &self,
        ctx: &CallContext,
        entity_key: &str,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
    ) -> Result<Vec<CounterSet>> {
        let members = self.query_range(ctx, entity_key, start, stop).await?;
        let counters = SnapshotCodec::decode_all(&members)?;

        debug!(
            "Read {} snapshots for {} in [{}, {}]",
            counters.len(),
            entity_key,
            start,
            stop
        );
        Ok(counters)
    }
}
