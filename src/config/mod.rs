use crate::gateway::{FetchCacheConfig, RefreshPolicy};
use crate::payout;
use crate::registry;
use std::env;
use std::time::Duration;

pub const DEFAULT_FEE_WALLET: &str = "999KYSwjC2XmDD8cdXLoWj4EExZExvrsQxewzXRM1Drg";

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub api_port: u16,
    pub fetch: FetchCacheConfig,
    pub fee_wallet: String,
    pub fee_percent: f64,
    pub funding_goal: f64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            api_port: 4000,
            fetch: FetchCacheConfig::default(),
            fee_wallet: DEFAULT_FEE_WALLET.to_string(),
            fee_percent: payout::DEFAULT_FEE_PERCENT,
            funding_goal: registry::DEFAULT_FUNDING_GOAL,
        }
    }
}

impl NodeConfig {
    /// Load configuration from the environment, falling back to defaults for
    /// anything unset or unparseable.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let defaults = Self::default();
        let fetch_defaults = defaults.fetch.clone();

        let fetch = FetchCacheConfig {
            gateways: env::var("IPFS_GATEWAYS")
                .ok()
                .map(|raw| parse_gateways(&raw))
                .filter(|list| !list.is_empty())
                .unwrap_or(fetch_defaults.gateways),
            ttl: env_duration_ms("IPFS_CACHE_TTL_MS", fetch_defaults.ttl),
            request_timeout: env_duration_ms("GATEWAY_TIMEOUT_MS", fetch_defaults.request_timeout),
            default_cid: env::var("DEFAULT_CID").unwrap_or(fetch_defaults.default_cid),
            max_entries: env_parse("CACHE_MAX_ENTRIES", fetch_defaults.max_entries),
            refresh_policy: env::var("REFRESH_POLICY")
                .ok()
                .map(|raw| parse_refresh_policy(&raw))
                .unwrap_or(fetch_defaults.refresh_policy),
            terminal_client_errors: env_parse("TERMINAL_4XX", false),
        };

        Self {
            api_port: env_parse("API_PORT", defaults.api_port),
            fetch,
            fee_wallet: env::var("FEE_WALLET").unwrap_or(defaults.fee_wallet),
            fee_percent: env_parse("FEE_PERCENT", defaults.fee_percent),
            funding_goal: env_parse("FUNDING_GOAL", defaults.funding_goal),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_duration_ms(name: &str, default: Duration) -> Duration {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

fn parse_gateways(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_refresh_policy(raw: &str) -> RefreshPolicy {
    match raw.trim().to_ascii_lowercase().as_str() {
        "block-on-stale" | "block_on_stale" | "blocking" => RefreshPolicy::BlockOnStale,
        _ => RefreshPolicy::StaleWhileRevalidate,
    }
}
