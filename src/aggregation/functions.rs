//! Aggregation functions over counter sets

use crate::types::CounterSet;

/// Element-wise sum of counter sets
///
/// The empty sum is the zero counter set. Order does not matter.
///
/// ```rust
/// use domain_stats::aggregation::functions::sum;
/// use domain_stats::types::CounterSet;
///
/// let total = sum([CounterSet::new(1, 2, 0, 0), CounterSet::new(0, 1, 1, 0)]);
/// assert_eq!(total, CounterSet::new(1, 3, 1, 0));
/// assert_eq!(sum(Vec::new()), CounterSet::default());
/// ```
pub fn sum<I>(snapshots: I) -> CounterSet
where
    I: IntoIterator<Item = CounterSet>,
{
    snapshots.into_iter().sum()
}
