//! Range aggregation for one domain or every registered domain

use super::functions::sum;
use crate::context::CallContext;
use crate::error::Result;
use crate::registry::DomainRegistry;
use crate::series::TimeSeriesStore;
use crate::types::CounterSet;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Sums domain snapshots over inclusive time windows
///
/// Holds no state between calls: every query re-reads the series from the
/// store.
#[derive(Clone)]
pub struct DomainRangeAggregator {
    series: TimeSeriesStore,
    registry: Arc<dyn DomainRegistry>,
}

impl DomainRangeAggregator {
    /// Create an aggregator over `series` for the domains in `registry`
    pub fn new(series: TimeSeriesStore, registry: Arc<dyn DomainRegistry>) -> Self {
        Self { series, registry }
    }

    /// Series store used for reads
    pub fn series(&self) -> &TimeSeriesStore {
        &self.series
    }

    /// Registry of domains walked by [`Self::get_all_series`]
    pub fn registry(&self) -> &Arc<dyn DomainRegistry> {
        &self.registry
    }

    /// Total counters of `entity_key` observed in `[start, stop]`
    ///
    /// A domain without snapshots in the window yields the zero counter set.
    pub async fn get_series(
        &self,
        ctx: &CallContext,
        entity_key: &str,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
    ) -> Result<CounterSet> {
        let counters = self
            .series
            .query_counters(ctx, entity_key, start, stop)
            .await?;
        Ok(sum(counters))
    }

    /// Total counters of every registered domain observed in `[start, stop]`
    ///
    /// Every registered domain gets an entry, zero if it has no data.
    /// Domains are read one after another; the first failure aborts the
    /// whole call.
    pub async fn get_all_series(
        &self,
        ctx: &CallContext,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
    ) -> Result<BTreeMap<String, CounterSet>> {
        let entities = self.registry.list_entities();
        debug!("Aggregating {} domains over [{}, {}]", entities.len(), start, stop);

        let mut totals = BTreeMap::new();
        for entity in entities {
            let total = self.get_series(ctx, &entity, start, stop).await?;
            totals.insert(entity, total);
        }

        let active = totals.values().filter(|c| !c.is_zero()).count();
        info!(
            "Aggregated {} domains ({} with traffic) over [{}, {}]",
            totals.len(),
            active,
            start,
            stop
        );
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::registry::StaticRegistry;
    use crate::store::{InMemoryStore, KeyValueStore};
    use crate::types::Score;
    use chrono::{Duration, TimeZone};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2009, 11, d, 2, 1, 2).unwrap() + Duration::nanoseconds(3)
    }

    fn aggregator(domains: &[&str]) -> (Arc<InMemoryStore>, DomainRangeAggregator) {
        let store = Arc::new(InMemoryStore::new());
        let series = TimeSeriesStore::new(store.clone(), "test");
        let registry = Arc::new(StaticRegistry::new(domains.iter().copied()));
        (store, DomainRangeAggregator::new(series, registry))
    }

    #[tokio::test]
    async fn test_get_series_sums_window() {
        let (_, agg) = aggregator(&["foo.com"]);
        let ctx = CallContext::background();

        for (d, n) in [(10, 1), (11, 12), (12, 13), (13, 14), (14, 15)] {
            agg.series()
                .add_snapshot(&ctx, "foo.com", &CounterSet::new(n, 0, 0, 0), day(d))
                .await
                .unwrap();
        }

        let got = agg.get_series(&ctx, "foo.com", day(10), day(14)).await.unwrap();
        assert_eq!(got, CounterSet::new(55, 0, 0, 0));

        let got = agg.get_series(&ctx, "foo.com", day(12), day(14)).await.unwrap();
        assert_eq!(got, CounterSet::new(42, 0, 0, 0));
    }

    #[tokio::test]
    async fn test_get_series_bounds_are_inclusive() {
        let (_, agg) = aggregator(&["foo.com"]);
        let ctx = CallContext::background();

        agg.series()
            .add_snapshot(&ctx, "foo.com", &CounterSet::new(1, 0, 0, 0), day(10))
            .await
            .unwrap();
        agg.series()
            .add_snapshot(&ctx, "foo.com", &CounterSet::new(0, 1, 0, 0), day(12))
            .await
            .unwrap();

        let got = agg.get_series(&ctx, "foo.com", day(10), day(12)).await.unwrap();
        assert_eq!(got, CounterSet::new(1, 1, 0, 0));

        // One millisecond inside either bound excludes that snapshot
        let inner_start = day(10) + Duration::milliseconds(1);
        let inner_stop = day(12) - Duration::milliseconds(1);
        let got = agg
            .get_series(&ctx, "foo.com", inner_start, inner_stop)
            .await
            .unwrap();
        assert!(got.is_zero());
    }

    #[tokio::test]
    async fn test_get_all_series_includes_empty_domains() {
        let (_, agg) = aggregator(&["foo.com", "bar.com", "barfoo.com", "foobar.com"]);
        let ctx = CallContext::background();

        let snapshots = [
            ("foo.com", CounterSet::new(1, 0, 0, 0), 10),
            ("foo.com", CounterSet::new(12, 0, 0, 0), 11),
            ("bar.com", CounterSet::new(1, 1, 0, 1), 12),
            ("bar.com", CounterSet::new(1, 1, 1, 0), 13),
            ("bar.com", CounterSet::new(1, 0, 1, 1), 14),
        ];
        for (domain, value, d) in snapshots {
            agg.series()
                .add_snapshot(&ctx, domain, &value, day(d))
                .await
                .unwrap();
        }

        let got = agg.get_all_series(&ctx, day(10), day(14)).await.unwrap();

        let mut want = BTreeMap::new();
        want.insert("foo.com".to_string(), CounterSet::new(13, 0, 0, 0));
        want.insert("bar.com".to_string(), CounterSet::new(3, 2, 2, 2));
        want.insert("barfoo.com".to_string(), CounterSet::default());
        want.insert("foobar.com".to_string(), CounterSet::default());
        assert_eq!(got, want);
    }

    #[tokio::test]
    async fn test_get_all_series_ignores_unregistered_domains() {
        let (_, agg) = aggregator(&["foo.com"]);
        let ctx = CallContext::background();

        agg.series()
            .add_snapshot(&ctx, "other.com", &CounterSet::new(9, 9, 9, 9), day(10))
            .await
            .unwrap();

        let got = agg.get_all_series(&ctx, day(1), day(30)).await.unwrap();
        assert_eq!(got.len(), 1);
        assert!(got["foo.com"].is_zero());
    }

    #[tokio::test]
    async fn test_get_all_series_fails_atomically() {
        let (store, agg) = aggregator(&["a.com", "b.com", "c.com"]);
        let ctx = CallContext::background();

        agg.series()
            .add_snapshot(&ctx, "a.com", &CounterSet::new(1, 0, 0, 0), day(10))
            .await
            .unwrap();
        store
            .add_scored(
                &ctx,
                "test-domain-b.com",
                Score::from_time(day(15)).as_f64(),
                b"{oops".to_vec(),
            )
            .await
            .unwrap();

        let result = agg.get_all_series(&ctx, day(1), day(30)).await;
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[tokio::test]
    async fn test_get_all_series_reads_sequentially() {
        let (store, agg) = aggregator(&["a.com", "b.com", "c.com"]);
        let ctx = CallContext::background();

        agg.get_all_series(&ctx, day(1), day(30)).await.unwrap();
        assert_eq!(store.commands_executed(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_context_aborts_aggregation() {
        let (_, agg) = aggregator(&["a.com", "b.com"]);
        let ctx = CallContext::background();
        ctx.cancel();

        let result = agg.get_all_series(&ctx, day(1), day(30)).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
