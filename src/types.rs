//! Core data types for domain traffic counters
//!
//! # Key Types
//!
//! - **`CounterSet`**: counts of HTTP response classes (2xx/3xx/4xx/5xx)
//! - **`Snapshot`**: a `CounterSet` observed for one entity at one instant
//! - **`Score`**: the sorted-set score of a snapshot (UTC epoch milliseconds)
//!
//! # Example
//!
//! ```rust
//! use domain_stats::types::CounterSet;
//!
//! let a = CounterSet::new(1, 2, 3, 4);
//! let b = CounterSet::new(10, 0, 0, 1);
//! assert_eq!(a + b, CounterSet::new(11, 2, 3, 5));
//! assert!(CounterSet::default().is_zero());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Counts of HTTP responses grouped by status class
///
/// Serializes with the field names `2xx`, `3xx`, `4xx` and `5xx`. Missing
/// fields read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CounterSet {
    /// Successful responses
    #[serde(rename = "2xx", default)]
    pub c2xx: u64,

    /// Redirects
    #[serde(rename = "3xx", default)]
    pub c3xx: u64,

    /// Client errors
    #[serde(rename = "4xx", default)]
    pub c4xx: u64,

    /// Server errors
    #[serde(rename = "5xx", default)]
    pub c5xx: u64,
}

impl CounterSet {
    /// Create a counter set from the four class counts
    pub const fn new(c2xx: u64, c3xx: u64, c4xx: u64, c5xx: u64) -> Self {
        Self {
            c2xx,
            c3xx,
            c4xx,
            c5xx,
        }
    }

    /// Total number of responses across all classes
    pub fn total(&self) -> u64 {
        self.c2xx + self.c3xx + self.c4xx + self.c5xx
    }

    /// True if every class count is zero
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl Add for CounterSet {
    type Output = CounterSet;

    fn add(mut self, rhs: CounterSet) -> CounterSet {
        self += rhs;
        self
    }
}

impl AddAssign for CounterSet {
    fn add_assign(&mut self, rhs: CounterSet) {
        self.c2xx += rhs.c2xx;
        self.c3xx += rhs.c3xx;
        self.c4xx += rhs.c4xx;
        self.c5xx += rhs.c5xx;
    }
}

impl Sum for CounterSet {
    fn sum<I: Iterator<Item = CounterSet>>(iter: I) -> Self {
        iter.fold(CounterSet::default(), Add::add)
    }
}

impl<'a> Sum<&'a CounterSet> for CounterSet {
    fn sum<I: Iterator<Item = &'a CounterSet>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for CounterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "2xx={} 3xx={} 4xx={} 5xx={}",
            self.c2xx, self.c3xx, self.c4xx, self.c5xx
        )
    }
}

/// Sorted-set score of a snapshot
///
/// Epoch milliseconds in UTC. Sub-millisecond precision is truncated, so two
/// instants within the same millisecond share a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(pub i64);

impl Score {
    /// Score for an instant
    pub fn from_time(time: DateTime<Utc>) -> Self {
        Score(time.timestamp_millis())
    }

    /// Score as handed to the store
    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }
}

impl From<DateTime<Utc>> for Score {
    fn from(time: DateTime<Utc>) -> Self {
        Score::from_time(time)
    }
}

/// One observation of an entity's counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Entity the counters belong to (e.g. a domain name)
    pub entity_key: String,

    /// When the counters were observed
    pub timestamp: DateTime<Utc>,

    /// Observed counters
    pub value: CounterSet,
}

impl Snapshot {
    /// Create a new snapshot
    pub fn new(entity_key: impl Into<String>, value: CounterSet, timestamp: DateTime<Utc>) -> Self {
        Self {
            entity_key: entity_key.into(),
            timestamp,
            value,
        }
    }

    /// Score this snapshot is stored under
    pub fn score(&self) -> Score {
        Score::from_time(self.timestamp)
    }
}
