//! Integration tests against a live Redis server
//!
//! Run with: REDIS_URL=redis://127.0.0.1:6379/15 cargo test --test redis_integration -- --ignored
//!
//! Every test writes under a unique key prefix so runs do not interfere.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};

use domain_stats::redis::{RedisConfig, RedisStore};
use domain_stats::store::{get_string, set_string};
use domain_stats::{
    CallContext, CounterSet, DomainRangeAggregator, Error, Expiration, KeyValueStore,
    StaticRegistry, TimeSeriesStore,
};

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/15".to_string())
}

fn unique_prefix() -> String {
    format!("it-{}", uuid::Uuid::new_v4().simple())
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2009, 11, d, 2, 1, 2).unwrap() + Duration::nanoseconds(3)
}

async fn connect() -> Arc<RedisStore> {
    Arc::new(
        RedisStore::connect(RedisConfig::with_url(redis_url()))
            .await
            .expect("Redis must be reachable at REDIS_URL"),
    )
}

#[tokio::test]
#[ignore]
async fn test_redis_range_totals() {
    let store = connect().await;
    let prefix = unique_prefix();
    let series = TimeSeriesStore::new(store.clone(), prefix.clone());
    let registry = Arc::new(StaticRegistry::new(["foo.com", "bar.com"]));
    let aggregator = DomainRangeAggregator::new(series.clone(), registry);
    let ctx = CallContext::background().with_timeout(StdDuration::from_secs(5));

    for d in 10..=15u32 {
        series
            .add_snapshot(&ctx, "foo.com", &CounterSet::new(d as u64, 1, 0, 0), day(d))
            .await
            .unwrap();
    }
    // Duplicate snapshot must not collapse
    series
        .add_snapshot(&ctx, "foo.com", &CounterSet::new(10, 1, 0, 0), day(10))
        .await
        .unwrap();

    let total = aggregator
        .get_series(&ctx, "foo.com", day(10), day(15))
        .await
        .unwrap();
    assert_eq!(total, CounterSet::new(85, 7, 0, 0));

    let totals = aggregator
        .get_all_series(&ctx, day(12), day(13))
        .await
        .unwrap();
    assert_eq!(totals["foo.com"], CounterSet::new(25, 2, 0, 0));
    assert!(totals["bar.com"].is_zero());

    let stats = store.stats();
    assert_eq!(stats.connects, 1);
    assert_eq!(stats.command_failures, 0);
    assert_eq!(stats.commands, 10);
}

#[tokio::test]
#[ignore]
async fn test_redis_malformed_member() {
    let store = connect().await;
    let prefix = unique_prefix();
    let series = TimeSeriesStore::new(store.clone(), prefix.clone());
    let ctx = CallContext::background();

    store
        .add_scored(
            &ctx,
            &series.series_key("foo.com"),
            day(10).timestamp_millis() as f64,
            b"{broken".to_vec(),
        )
        .await
        .unwrap();

    let err = series
        .query_counters(&ctx, "foo.com", day(10), day(10))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

#[tokio::test]
#[ignore]
async fn test_redis_scalar_expiry() {
    let store = connect().await;
    let key = format!("{}-scalar", unique_prefix());
    let ctx = CallContext::background();

    set_string(
        store.as_ref(),
        &ctx,
        &key,
        "value",
        Expiration::After(StdDuration::from_millis(200)),
    )
    .await
    .unwrap();
    assert_eq!(
        get_string(store.as_ref(), &ctx, &key).await.unwrap().as_deref(),
        Some("value")
    );

    tokio::time::sleep(StdDuration::from_millis(400)).await;
    assert!(get_string(store.as_ref(), &ctx, &key).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn test_redis_unreachable() {
    let ctx = CallContext::background().with_timeout(StdDuration::from_secs(2));
    let config = RedisConfig::with_url("redis://127.0.0.1:1/0")
        .connection_timeout(StdDuration::from_millis(200));

    let result = match RedisStore::connect(config).await {
        Ok(store) => store.get(&ctx, "anything").await.map(|_| ()),
        Err(e) => Err(e),
    };
    let err = result.unwrap_err();
    assert!(
        matches!(err, Error::StoreUnavailable(_) | Error::DeadlineExceeded),
        "unexpected error: {err:?}"
    );
}
