use super::common::{build, build_with_policy, GW_A, GW_B};
use ipfs_gateway_node::gateway::{RefreshPolicy, TransportError};
use std::time::Duration;

const TTL: Duration = Duration::from_millis(300_000);
const SHORT_TTL: Duration = Duration::from_millis(50);

#[tokio::test]
async fn test_fresh_hit_is_byte_identical_with_no_network() {
    let (cache, transport) = build(TTL);
    transport.enqueue_ok(GW_A, Some("text/plain"), b"hello").await;

    let first = cache.resolve("QmX").await.unwrap();
    let second = cache.resolve("QmX").await.unwrap();

    assert_eq!(first.payload, second.payload);
    assert_eq!(first.content_type, second.content_type);
    assert_eq!(transport.call_count().await, 1);

    let stats = cache.get_stats().await;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn test_single_flight_collapses_concurrent_misses() {
    let (cache, transport) = build(TTL);
    transport.enqueue_ok(GW_A, Some("text/plain"), b"shared").await;
    transport.set_delay(Duration::from_millis(100)).await;

    let mut tasks = Vec::new();
    for _ in 0..50 {
        let cache = cache.clone();
        tasks.push(tokio::spawn(
            async move { cache.resolve("QmCold").await },
        ));
    }

    for outcome in futures_util::future::join_all(tasks).await {
        let entry = outcome.unwrap().unwrap();
        assert_eq!(entry.payload.as_ref(), b"shared");
    }

    // 50 callers, one fetch sequence.
    assert_eq!(transport.call_count().await, 1);
}

#[tokio::test]
async fn test_stale_while_revalidate_serves_stale_then_refreshes() {
    let (cache, transport) = build(SHORT_TTL);
    transport.enqueue_ok(GW_A, Some("text/plain"), b"v1").await;
    transport.enqueue_ok(GW_A, Some("text/plain"), b"v2").await;

    let first = cache.resolve("QmX").await.unwrap();
    assert_eq!(first.payload.as_ref(), b"v1");

    tokio::time::sleep(Duration::from_millis(80)).await;

    // Stale hit returns the old bytes immediately.
    let stale = cache.resolve("QmX").await.unwrap();
    assert_eq!(stale.payload.as_ref(), b"v1");

    // The background refresh lands for later callers.
    let mut refreshed = Vec::new();
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let entry = cache.resolve("QmX").await.unwrap();
        refreshed = entry.payload.to_vec();
        if refreshed == b"v2" {
            break;
        }
    }
    assert_eq!(refreshed, b"v2");

    let stats = cache.get_stats().await;
    assert!(stats.stale_served >= 1);
    assert!(stats.refreshes >= 1);
}

#[tokio::test]
async fn test_stale_hits_spawn_at_most_one_background_refresh() {
    let (cache, transport) = build(SHORT_TTL);
    transport.enqueue_ok(GW_A, Some("text/plain"), b"v1").await;
    transport.enqueue_ok(GW_A, Some("text/plain"), b"v2").await;

    cache.resolve("QmX").await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;

    // Keep the refresh flight up while the stale hits pile on.
    transport.set_delay(Duration::from_millis(150)).await;

    for _ in 0..10 {
        let stale = cache.resolve("QmX").await.unwrap();
        assert_eq!(stale.payload.as_ref(), b"v1");
    }

    tokio::time::sleep(Duration::from_millis(300)).await;

    // Initial fetch plus exactly one refresh fetch.
    assert_eq!(transport.call_count().await, 2);
    let stats = cache.get_stats().await;
    assert_eq!(stats.refreshes, 1);
    assert_eq!(stats.stale_served, 10);
}

#[tokio::test]
async fn test_block_on_stale_counts_one_refresh_for_concurrent_callers() {
    let (cache, transport) = build_with_policy(SHORT_TTL, RefreshPolicy::BlockOnStale);
    transport.enqueue_ok(GW_A, Some("text/plain"), b"v1").await;
    transport.enqueue_ok(GW_A, Some("text/plain"), b"v2").await;

    cache.resolve("QmX").await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;

    transport.set_delay(Duration::from_millis(100)).await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let cache = cache.clone();
        tasks.push(tokio::spawn(async move { cache.resolve("QmX").await }));
    }

    for outcome in futures_util::future::join_all(tasks).await {
        let entry = outcome.unwrap().unwrap();
        assert_eq!(entry.payload.as_ref(), b"v2");
    }

    // One owner fetched; the other callers waited on the same flight.
    assert_eq!(transport.call_count().await, 2);
    let stats = cache.get_stats().await;
    assert_eq!(stats.refreshes, 1);
}

#[tokio::test]
async fn test_block_on_stale_waits_for_fresh_value() {
    let (cache, transport) = build_with_policy(SHORT_TTL, RefreshPolicy::BlockOnStale);
    transport.enqueue_ok(GW_A, Some("text/plain"), b"v1").await;
    transport.enqueue_ok(GW_A, Some("text/plain"), b"v2").await;

    let first = cache.resolve("QmX").await.unwrap();
    assert_eq!(first.payload.as_ref(), b"v1");

    tokio::time::sleep(Duration::from_millis(80)).await;

    // The caller waits for the refresh and gets the new value directly.
    let second = cache.resolve("QmX").await.unwrap();
    assert_eq!(second.payload.as_ref(), b"v2");
    assert_eq!(transport.call_count().await, 2);
}

#[tokio::test]
async fn test_block_on_stale_falls_back_to_stale_when_refresh_fails() {
    let (cache, transport) = build_with_policy(SHORT_TTL, RefreshPolicy::BlockOnStale);
    transport.enqueue_ok(GW_A, Some("text/plain"), b"v1").await;
    transport
        .enqueue_error(GW_A, TransportError::Network("gateway down".to_string()))
        .await;
    transport.enqueue_error(GW_B, TransportError::Timeout).await;

    let first = cache.resolve("QmX").await.unwrap();
    assert_eq!(first.payload.as_ref(), b"v1");

    tokio::time::sleep(Duration::from_millis(80)).await;

    // Refresh exhausts every gateway; the stale entry stays servable.
    let fallback = cache.resolve("QmX").await.unwrap();
    assert_eq!(fallback.payload.as_ref(), b"v1");
}

#[tokio::test]
async fn test_lru_eviction_respects_entry_bound() {
    // test_config caps the cache at 4 entries
    let (cache, transport) = build(TTL);
    transport.enqueue_ok(GW_A, Some("text/plain"), b"content").await;

    for id in ["Qm1", "Qm2", "Qm3", "Qm4", "Qm5"] {
        cache.resolve(id).await.unwrap();
    }

    assert_eq!(cache.len().await, 4);
    assert!(!cache.contains("Qm1").await);
    assert!(cache.contains("Qm5").await);

    let stats = cache.get_stats().await;
    assert_eq!(stats.evictions, 1);
}

#[tokio::test]
async fn test_refresh_replaces_entry_for_future_callers() {
    let (cache, transport) = build(TTL);
    transport.enqueue_ok(GW_A, Some("text/plain"), b"v1").await;
    transport.enqueue_ok(GW_A, Some("application/json"), b"{}").await;

    let first = cache.resolve("QmX").await.unwrap();
    assert_eq!(first.content_type, "text/plain");

    cache.set_ttl(Duration::ZERO).await;
    cache.set_refresh_policy(RefreshPolicy::BlockOnStale).await;

    let second = cache.resolve("QmX").await.unwrap();
    assert_eq!(second.content_type, "application/json");
    assert_eq!(second.payload.as_ref(), b"{}");

    // The old entry is still whole in the first caller's hands.
    assert_eq!(first.payload.as_ref(), b"v1");
}

#[tokio::test]
async fn test_distinct_keys_fetch_independently() {
    let (cache, transport) = build(TTL);
    transport.enqueue_ok(GW_A, Some("text/plain"), b"same-body").await;

    let a = cache.resolve("QmA").await.unwrap();
    let b = cache.resolve("QmB").await.unwrap();

    assert_eq!(a.key, "QmA");
    assert_eq!(b.key, "QmB");
    assert_eq!(transport.call_count().await, 2);
}
