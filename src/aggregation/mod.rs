//! Aggregation of domain counter snapshots
//!
//! # Data flow
//!
//! ```text
//! DomainRangeAggregator::get_series(domain, start, stop)
//!        ↓
//! TimeSeriesStore::query_counters   (ZRANGEBYSCORE start_ms stop_ms)
//!        ↓
//! SnapshotCodec::decode             (fails fast on a malformed member)
//!        ↓
//! functions::sum                    (element-wise, empty → zero)
//! ```
//!
//! `get_all_series` repeats this for every domain in the registry, one
//! domain at a time.

pub mod domain;
pub mod functions;

pub use domain::DomainRangeAggregator;
pub use functions::sum;
