// Version information for the IPFS gateway node

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-gateway-fallback-2026-08-27";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Build date
pub const BUILD_DATE: &str = "2026-08-27";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "gateway-fallback",
    "ttl-cache",
    "lru-eviction",
    "single-flight",
    "stale-while-revalidate",
    "withdrawal-quotes",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("IPFS Gateway Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for API responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
