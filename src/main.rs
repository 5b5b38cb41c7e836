use anyhow::Result;
use ipfs_gateway_node::{
    api::{self, ApiConfig, ApiServer},
    config::NodeConfig,
    gateway::{GatewayFetchCache, HttpTransport},
    version,
};
use std::{env, sync::Arc};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = NodeConfig::from_env();

    tracing::info!("{}", version::get_version_string());
    tracing::info!(
        gateways = ?config.fetch.gateways,
        ttl_ms = config.fetch.ttl.as_millis() as u64,
        timeout_ms = config.fetch.request_timeout.as_millis() as u64,
        max_entries = config.fetch.max_entries,
        policy = ?config.fetch.refresh_policy,
        "gateway fetch cache configured"
    );

    let transport = Arc::new(HttpTransport::new(config.fetch.request_timeout)?);
    let fetch_cache = GatewayFetchCache::new(transport, config.fetch.clone());

    let api_config = ApiConfig {
        port: config.api_port,
        fee_wallet: config.fee_wallet.clone(),
        fee_percent: config.fee_percent,
        default_cid: config.fetch.default_cid.clone(),
    };
    let server = ApiServer::new(api_config, fetch_cache, config.funding_goal);

    tokio::select! {
        result = api::start_server(server) => {
            if let Err(e) = result {
                tracing::error!("API server exited: {}", e);
            }
        }
        _ = signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    Ok(())
}
