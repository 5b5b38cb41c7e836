pub mod client;
pub mod fetch_cache;

// Re-export main types for convenience
pub use client::{GatewayResponse, GatewayTransport, HttpTransport, MockTransport, TransportError};

pub use fetch_cache::{
    CacheEntry, CacheStats, FetchCacheConfig, FetchError, GatewayFetchCache, RefreshPolicy,
    DEFAULT_CONTENT_TYPE,
};
