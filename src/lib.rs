//! Domain Stats - per-domain HTTP status counters over Redis sorted sets
//!
//! This library records snapshots of response-class counters (2xx, 3xx, 4xx,
//! 5xx) per domain and answers "total over [start, stop]" queries:
//! - One sorted set per domain, scored by observation time in epoch milliseconds
//! - Inclusive range reads summed on demand, never cached or persisted
//! - Every registered domain reported, zero when it saw no traffic
//! - Per-call cancellation and deadlines
//!
//! # Example
//!
//! ```rust
//! use domain_stats::{
//!     CallContext, CounterSet, DomainRangeAggregator, InMemoryStore, StaticRegistry,
//!     TimeSeriesStore,
//! };
//! use chrono::{Duration, Utc};
//! use std::sync::Arc;
//!
//! # async fn example() -> domain_stats::Result<()> {
//! let series = TimeSeriesStore::new(Arc::new(InMemoryStore::new()), "stats");
//! let registry = Arc::new(StaticRegistry::new(["foo.com", "bar.com"]));
//! let aggregator = DomainRangeAggregator::new(series.clone(), registry);
//!
//! let ctx = CallContext::background().with_timeout(std::time::Duration::from_secs(1));
//! let now = Utc::now();
//! series.add_snapshot(&ctx, "foo.com", &CounterSet::new(10, 1, 0, 0), now).await?;
//!
//! let totals = aggregator
//!     .get_all_series(&ctx, now - Duration::hours(1), now)
//!     .await?;
//! assert_eq!(totals["foo.com"], CounterSet::new(10, 1, 0, 0));
//! assert!(totals["bar.com"].is_zero());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod context;
pub mod error;
pub mod registry;
pub mod series;
pub mod store;
pub mod types;

/// Configuration management with TOML support
pub mod config;

/// Redis backend: connection handling and the `KeyValueStore` implementation
pub mod redis;

/// Summation of counter snapshots for one domain or all registered domains
pub mod aggregation;

/// UTC calendar-day bucketing
pub mod calendar;

// Re-export main types
pub use aggregation::DomainRangeAggregator;
pub use context::CallContext;
pub use error::{Error, Result};
pub use registry::{DomainRegistry, StaticRegistry};
pub use series::TimeSeriesStore;
pub use store::{Expiration, InMemoryStore, KeyValueStore};
pub use types::{CounterSet, Snapshot};
