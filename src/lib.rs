pub mod api;
pub mod config;
pub mod gateway;
pub mod payout;
pub mod registry;
pub mod version;
pub mod wallet;

// Re-export main types for convenience
pub use api::{ApiConfig, ApiError, ApiServer, ErrorResponse};
pub use config::NodeConfig;
pub use gateway::{
    CacheEntry, CacheStats, FetchCacheConfig, FetchError, GatewayFetchCache, GatewayResponse,
    GatewayTransport, HttpTransport, MockTransport, RefreshPolicy, TransportError,
};
pub use payout::{fee_amount, quote_withdrawal, PayoutError, WithdrawalQuote};
pub use registry::{BotParams, BotRegistry, NodeStatus, StatusSnapshot};
