use super::client::{GatewayTransport, TransportError};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use url::Url;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// What a stale cache hit does: serve the old entry and refresh in the
/// background, or make the caller wait for the refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    StaleWhileRevalidate,
    BlockOnStale,
}

#[derive(Debug, Clone)]
pub struct FetchCacheConfig {
    /// Gateway base URLs, tried strictly in this order.
    pub gateways: Vec<String>,
    pub ttl: Duration,
    pub request_timeout: Duration,
    pub default_cid: String,
    /// Entry-count bound for LRU eviction.
    pub max_entries: usize,
    pub refresh_policy: RefreshPolicy,
    /// When set, a 4xx answer ends the fallback scan instead of moving on.
    pub terminal_client_errors: bool,
}

impl Default for FetchCacheConfig {
    fn default() -> Self {
        Self {
            gateways: vec![
                "https://ipfs.io/ipfs/".to_string(),
                "https://cloudflare-ipfs.com/ipfs/".to_string(),
                "https://gateway.pinata.cloud/ipfs/".to_string(),
                "https://dweb.link/ipfs/".to_string(),
            ],
            ttl: Duration::from_millis(300_000),
            request_timeout: Duration::from_millis(8_000),
            default_cid: "QmTWm6xa4yXTP8TUgWstqoKn5aGhfzoa5ejntuUyhFbHVn".to_string(),
            max_entries: 1024,
            refresh_policy: RefreshPolicy::StaleWhileRevalidate,
            terminal_client_errors: false,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Identifier must be a non-empty string")]
    InvalidIdentifier,
    #[error("Invalid gateway URL: {0}")]
    InvalidGateway(String),
    #[error("Gateway {gateway} rejected '{id}' with status {status}")]
    UpstreamRejected {
        gateway: String,
        id: String,
        status: u16,
    },
    #[error("All {attempts} gateways failed, last error: {last_error}")]
    AllGatewaysFailed { attempts: usize, last_error: String },
}

/// Immutable once stored; a refresh swaps in a whole new entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Bytes,
    pub content_type: String,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::MAX);
        Utc::now().signed_duration_since(self.fetched_at) < ttl
    }
}

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stale_served: u64,
    pub refreshes: u64,
    pub evictions: u64,
    pub upstream_failures: u64,
    pub hit_rate: f64,
}

type FlightResult = Result<Arc<CacheEntry>, FetchError>;

enum FlightTicket {
    Owner,
    Waiter(broadcast::Receiver<FlightResult>),
}

/// Resolves content identifiers to bytes + content type through ordered
/// gateway fallback, with a TTL + LRU cache and per-key single-flight fetches.
pub struct GatewayFetchCache {
    transport: Arc<dyn GatewayTransport>,
    config: Arc<Mutex<FetchCacheConfig>>,
    entries: Arc<Mutex<LruCache<String, Arc<CacheEntry>>>>,
    inflight: Arc<Mutex<HashMap<String, broadcast::Sender<FlightResult>>>>,
    stats: Arc<Mutex<CacheStats>>,
}

impl Clone for GatewayFetchCache {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
            entries: Arc::clone(&self.entries),
            inflight: Arc::clone(&self.inflight),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl GatewayFetchCache {
    pub fn new(transport: Arc<dyn GatewayTransport>, config: FetchCacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries.max(1)).expect("capacity >= 1");

        Self {
            transport,
            config: Arc::new(Mutex::new(config)),
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
            inflight: Arc::new(Mutex::new(HashMap::new())),
            stats: Arc::new(Mutex::new(CacheStats::default())),
        }
    }

    /// Resolve an identifier to a cache entry, fetching through the gateway
    /// list on a miss. Fresh hits return synchronously; stale hits follow the
    /// configured refresh policy; concurrent misses for the same key collapse
    /// into one upstream fetch sequence.
    pub async fn resolve(&self, id: &str) -> Result<Arc<CacheEntry>, FetchError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(FetchError::InvalidIdentifier);
        }

        let (ttl, policy) = {
            let config = self.config.lock().await;
            (config.ttl, config.refresh_policy)
        };

        let cached = {
            let mut entries = self.entries.lock().await;
            entries.get(id).cloned()
        };

        if let Some(entry) = &cached {
            if entry.is_fresh(ttl) {
                self.record(|s| s.hits += 1).await;
                return Ok(Arc::clone(entry));
            }
        }

        match (cached, policy) {
            (Some(stale), RefreshPolicy::StaleWhileRevalidate) => {
                self.record(|s| s.stale_served += 1).await;
                self.spawn_refresh(id);
                Ok(stale)
            }
            (Some(stale), RefreshPolicy::BlockOnStale) => {
                match self.join_flight(id, true).await {
                    Ok(entry) => Ok(entry),
                    // A stale entry stays servable when the refresh comes up
                    // empty-handed.
                    Err(FetchError::AllGatewaysFailed { last_error, .. }) => {
                        tracing::warn!(id, last_error, "refresh failed, serving stale entry");
                        self.record(|s| s.stale_served += 1).await;
                        Ok(stale)
                    }
                    Err(e) => Err(e),
                }
            }
            (None, _) => {
                self.record(|s| s.misses += 1).await;
                self.join_flight(id, false).await
            }
        }
    }

    pub async fn get_stats(&self) -> CacheStats {
        let mut stats = self.stats.lock().await.clone();
        let lookups = stats.hits + stats.misses + stats.stale_served;
        stats.hit_rate = if lookups > 0 {
            (stats.hits + stats.stale_served) as f64 / lookups as f64
        } else {
            0.0
        };
        stats
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.entries.lock().await.peek(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn set_ttl(&self, ttl: Duration) {
        self.config.lock().await.ttl = ttl;
    }

    pub async fn set_refresh_policy(&self, policy: RefreshPolicy) {
        self.config.lock().await.refresh_policy = policy;
    }

    /// Join the in-flight fetch for a key, or become its owner. `refresh`
    /// marks the flight as a stale refresh; only the owner counts it, so the
    /// stat tracks upstream refresh fetches rather than blocked callers.
    async fn join_flight(&self, id: &str, refresh: bool) -> FlightResult {
        let ticket = {
            let mut inflight = self.inflight.lock().await;
            match inflight.get(id) {
                Some(tx) => FlightTicket::Waiter(tx.subscribe()),
                None => {
                    let (tx, _) = broadcast::channel(1);
                    inflight.insert(id.to_string(), tx);
                    FlightTicket::Owner
                }
            }
        };

        match ticket {
            FlightTicket::Owner => {
                if refresh {
                    self.record(|s| s.refreshes += 1).await;
                }
                self.complete_flight(id).await
            }
            FlightTicket::Waiter(mut rx) => match rx.recv().await {
                Ok(outcome) => outcome,
                Err(_) => Err(FetchError::AllGatewaysFailed {
                    attempts: 0,
                    last_error: "in-flight fetch was dropped".to_string(),
                }),
            },
        }
    }

    /// Owner side of a flight: fetch, publish the outcome, release the slot.
    async fn complete_flight(&self, id: &str) -> FlightResult {
        let outcome = self.fetch_and_store(id).await;

        let sender = self.inflight.lock().await.remove(id);
        if let Some(tx) = sender {
            // Waiters may have all timed out; nothing to do then.
            let _ = tx.send(outcome.clone());
        }

        outcome
    }

    /// Non-blocking refresh for a stale key. A no-op when a flight for the
    /// key is already up.
    fn spawn_refresh(&self, id: &str) {
        let cache = self.clone();
        let id = id.to_string();

        tokio::spawn(async move {
            {
                let mut inflight = cache.inflight.lock().await;
                if inflight.contains_key(&id) {
                    return;
                }
                let (tx, _) = broadcast::channel(1);
                inflight.insert(id.clone(), tx);
            }

            cache.record(|s| s.refreshes += 1).await;
            if let Err(e) = cache.complete_flight(&id).await {
                tracing::warn!(id, error = %e, "background refresh failed");
            }
        });
    }

    /// Walk the gateway list in order; first 2xx/3xx answer wins and is
    /// stored. Individual failures are absorbed and logged, never cached.
    async fn fetch_and_store(&self, id: &str) -> FlightResult {
        let config = self.config.lock().await.clone();

        let mut attempts = 0usize;
        let mut last_error = "no gateways configured".to_string();

        for gateway in &config.gateways {
            attempts += 1;

            let url = match gateway_url(gateway, id) {
                Ok(url) => url,
                Err(e) => {
                    last_error = e.to_string();
                    tracing::warn!(gateway, "skipping malformed gateway base: {}", last_error);
                    continue;
                }
            };

            match self.transport.fetch(url.as_str()).await {
                Ok(response) if (200..400).contains(&response.status) => {
                    let entry = Arc::new(CacheEntry {
                        key: id.to_string(),
                        content_type: response
                            .content_type
                            .filter(|ct| !ct.is_empty())
                            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
                        payload: response.body,
                        fetched_at: Utc::now(),
                    });
                    self.store(Arc::clone(&entry)).await;
                    tracing::debug!(gateway, id, "gateway fetch succeeded");
                    return Ok(entry);
                }
                Ok(response)
                    if config.terminal_client_errors && (400..500).contains(&response.status) =>
                {
                    self.record(|s| s.upstream_failures += 1).await;
                    return Err(FetchError::UpstreamRejected {
                        gateway: gateway.clone(),
                        id: id.to_string(),
                        status: response.status,
                    });
                }
                Ok(response) => {
                    self.record(|s| s.upstream_failures += 1).await;
                    last_error = format!("{} returned status {}", gateway, response.status);
                    tracing::warn!(
                        gateway,
                        id,
                        status = response.status,
                        "gateway returned disqualifying status"
                    );
                }
                Err(e) => {
                    self.record(|s| s.upstream_failures += 1).await;
                    last_error = format!("{}: {}", gateway, e);
                    match e {
                        TransportError::Timeout => {
                            tracing::warn!(gateway, id, "gateway attempt timed out")
                        }
                        TransportError::Network(_) => {
                            tracing::warn!(gateway, id, error = %e, "gateway attempt failed")
                        }
                    }
                }
            }
        }

        Err(FetchError::AllGatewaysFailed {
            attempts,
            last_error,
        })
    }

    async fn store(&self, entry: Arc<CacheEntry>) {
        let key = entry.key.clone();
        let evicted = {
            let mut entries = self.entries.lock().await;
            entries.push(key.clone(), entry)
        };

        // push returns the replaced entry for the same key; only a different
        // key counts as an eviction.
        if let Some((evicted_key, _)) = evicted {
            if evicted_key != key {
                self.record(|s| s.evictions += 1).await;
                tracing::debug!(key = evicted_key, "evicted least-recently-used entry");
            }
        }
    }

    async fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        let mut stats = self.stats.lock().await;
        update(&mut stats);
    }
}

/// Build the fetch URL with the identifier as a single percent-encoded path
/// segment, so a hostile id cannot splice extra path or query parts in.
fn gateway_url(base: &str, id: &str) -> Result<Url, FetchError> {
    let mut url =
        Url::parse(base).map_err(|e| FetchError::InvalidGateway(format!("{}: {}", base, e)))?;

    url.path_segments_mut()
        .map_err(|_| FetchError::InvalidGateway(format!("{} cannot be a base URL", base)))?
        .pop_if_empty()
        .push(id);

    Ok(url)
}
