use super::common::{build, build_cache, test_config, GW_A, GW_B};
use ipfs_gateway_node::gateway::{FetchCacheConfig, FetchError, TransportError};
use std::time::Duration;

const TTL: Duration = Duration::from_millis(300_000);

#[tokio::test]
async fn test_first_gateway_short_circuits() {
    let (cache, transport) = build(TTL);
    transport.enqueue_ok(GW_A, Some("text/plain"), b"hello").await;

    let entry = cache.resolve("QmX").await.unwrap();

    assert_eq!(entry.payload.as_ref(), b"hello");
    assert_eq!(entry.content_type, "text/plain");
    assert_eq!(transport.calls().await, vec!["https://gw-a.test/ipfs/QmX"]);
}

#[tokio::test]
async fn test_fallback_to_second_gateway() {
    let (cache, transport) = build(TTL);
    transport.enqueue_error(GW_A, TransportError::Timeout).await;
    transport.enqueue_ok(GW_B, Some("text/plain"), b"hello").await;

    let entry = cache.resolve("QmX").await.unwrap();

    assert_eq!(entry.payload.as_ref(), b"hello");
    assert_eq!(entry.content_type, "text/plain");
    assert_eq!(
        transport.calls().await,
        vec!["https://gw-a.test/ipfs/QmX", "https://gw-b.test/ipfs/QmX"]
    );
}

#[tokio::test]
async fn test_missing_content_type_defaults_to_octet_stream() {
    let (cache, transport) = build(TTL);
    transport.enqueue_status(GW_A, 500).await;
    transport.enqueue_ok(GW_B, None, &[0xde, 0xad, 0xbe, 0xef]).await;

    let entry = cache.resolve("QmBin").await.unwrap();

    assert_eq!(entry.content_type, "application/octet-stream");
    assert_eq!(entry.payload.as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
}

#[tokio::test]
async fn test_all_gateways_failed_is_not_cached() {
    let (cache, transport) = build(TTL);
    transport
        .enqueue_error(GW_A, TransportError::Network("connection refused".to_string()))
        .await;
    transport.enqueue_error(GW_B, TransportError::Timeout).await;

    let err = cache.resolve("QmGone").await.unwrap_err();
    match err {
        FetchError::AllGatewaysFailed {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 2);
            assert!(last_error.contains("gw-b"));
        }
        other => panic!("expected AllGatewaysFailed, got {:?}", other),
    }

    assert!(!cache.contains("QmGone").await);

    // A later call must retry every gateway, not replay a cached failure.
    let err = cache.resolve("QmGone").await.unwrap_err();
    assert!(matches!(err, FetchError::AllGatewaysFailed { .. }));
    assert_eq!(transport.call_count().await, 4);
}

#[tokio::test]
async fn test_client_error_falls_through_by_default() {
    let (cache, transport) = build(TTL);
    transport.enqueue_status(GW_A, 404).await;
    transport.enqueue_ok(GW_B, Some("application/json"), b"{}").await;

    let entry = cache.resolve("QmX").await.unwrap();

    assert_eq!(entry.content_type, "application/json");
    assert_eq!(transport.call_count().await, 2);
}

#[tokio::test]
async fn test_client_error_is_terminal_when_configured() {
    let config = FetchCacheConfig {
        terminal_client_errors: true,
        ..test_config(TTL)
    };
    let (cache, transport) = build_cache(config);
    transport.enqueue_status(GW_A, 404).await;
    transport.enqueue_ok(GW_B, Some("text/plain"), b"never served").await;

    let err = cache.resolve("QmX").await.unwrap_err();
    match err {
        FetchError::UpstreamRejected { status, .. } => assert_eq!(status, 404),
        other => panic!("expected UpstreamRejected, got {:?}", other),
    }

    // The second gateway must not be contacted after a terminal answer.
    assert_eq!(transport.call_count().await, 1);
    assert!(!cache.contains("QmX").await);
}

#[tokio::test]
async fn test_empty_identifier_rejected_before_any_fetch() {
    let (cache, transport) = build(TTL);

    assert!(matches!(
        cache.resolve("").await,
        Err(FetchError::InvalidIdentifier)
    ));
    assert!(matches!(
        cache.resolve("   ").await,
        Err(FetchError::InvalidIdentifier)
    ));
    assert_eq!(transport.call_count().await, 0);
}

#[tokio::test]
async fn test_hostile_identifier_is_percent_encoded() {
    let (cache, transport) = build(TTL);
    transport.enqueue_ok(GW_A, Some("text/plain"), b"ok").await;

    cache.resolve("QmX/../../admin").await.unwrap();

    let calls = transport.calls().await;
    assert_eq!(calls.len(), 1);
    assert!(!calls[0].contains("/admin"));
    assert!(calls[0].starts_with("https://gw-a.test/ipfs/"));
}
