use super::errors::ApiError;
use super::handlers::{
    BalanceResponse, BotLogRequest, BotLogResponse, BotsOnlineRequest, BotsOnlineResponse,
    FundingUpdateRequest, FundingUpdateResponse, WithdrawRequest, WithdrawResponse,
};
use crate::gateway::{CacheEntry, FetchError, GatewayFetchCache};
use crate::payout;
use crate::registry::{BotParams, BotRegistry, NodeStatus, StatusSnapshot};
use crate::wallet;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub fee_wallet: String,
    pub fee_percent: f64,
    pub default_cid: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            fee_wallet: "999KYSwjC2XmDD8cdXLoWj4EExZExvrsQxewzXRM1Drg".to_string(),
            fee_percent: payout::DEFAULT_FEE_PERCENT,
            default_cid: "QmTWm6xa4yXTP8TUgWstqoKn5aGhfzoa5ejntuUyhFbHVn".to_string(),
        }
    }
}

/// Request-level service behind the HTTP routes. Owns the fetch cache and the
/// in-memory registry/status state; the router only does extraction and
/// response mapping.
pub struct ApiServer {
    config: ApiConfig,
    fetch_cache: GatewayFetchCache,
    registry: BotRegistry,
    status: NodeStatus,
}

impl ApiServer {
    pub fn new(config: ApiConfig, fetch_cache: GatewayFetchCache, funding_goal: f64) -> Self {
        Self {
            config,
            fetch_cache,
            registry: BotRegistry::with_defaults(),
            status: NodeStatus::new(funding_goal),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Resolve pinned content; a missing id falls back to the configured
    /// default CID.
    pub async fn fetch_content(&self, cid: Option<&str>) -> Result<Arc<CacheEntry>, ApiError> {
        let cid = match cid {
            Some(cid) if !cid.trim().is_empty() => cid,
            _ => self.config.default_cid.as_str(),
        };

        self.fetch_cache.resolve(cid).await.map_err(|e| match e {
            FetchError::InvalidIdentifier => ApiError::InvalidRequest(e.to_string()),
            FetchError::AllGatewaysFailed { .. } | FetchError::UpstreamRejected { .. } => {
                ApiError::BadGateway(e.to_string())
            }
            FetchError::InvalidGateway(_) => ApiError::InternalError(e.to_string()),
        })
    }

    pub async fn bot(&self, cid: &str) -> Result<BotParams, ApiError> {
        self.registry
            .get(cid)
            .await
            .ok_or_else(|| ApiError::NotFound(format!("Bot '{}' not found", cid)))
    }

    pub async fn log_activation(&self, request: BotLogRequest) -> Result<BotLogResponse, ApiError> {
        if !wallet::is_valid_address(&request.user_wallet) {
            return Err(ApiError::ValidationError {
                field: "userWallet".to_string(),
                message: "Invalid wallet address".to_string(),
            });
        }

        tracing::info!(
            bot_id = request.bot_id,
            status = request.status,
            user_wallet = request.user_wallet,
            tx_signature = request.tx_signature.as_deref().unwrap_or("-"),
            "bot activation logged"
        );

        Ok(BotLogResponse { success: true })
    }

    pub async fn withdraw(&self, request: WithdrawRequest) -> Result<WithdrawResponse, ApiError> {
        let quote = payout::quote_withdrawal(
            request.user_profit,
            self.config.fee_percent,
            &request.user_wallet,
            &self.config.fee_wallet,
        )
        .map_err(|e| match e {
            payout::PayoutError::InvalidProfit => ApiError::ValidationError {
                field: "userProfit".to_string(),
                message: e.to_string(),
            },
            payout::PayoutError::InvalidWallet => ApiError::ValidationError {
                field: "userWallet".to_string(),
                message: e.to_string(),
            },
        })?;

        tracing::info!(
            user_wallet = request.user_wallet,
            user_profit = request.user_profit,
            fee_amount = quote.fee_amount,
            "withdrawal quote issued"
        );

        Ok(WithdrawResponse {
            address: quote.address,
            fee_amount: quote.fee_amount,
        })
    }

    /// Balance snapshot for the dashboard. Fixed figures, no chain lookup.
    pub async fn balance(&self, wallet_address: &str) -> Result<BalanceResponse, ApiError> {
        if !wallet::is_valid_address(wallet_address) {
            return Err(ApiError::ValidationError {
                field: "wallet".to_string(),
                message: "Invalid wallet address".to_string(),
            });
        }

        Ok(BalanceResponse {
            balance: 200.0,
            total_profits: 50.0,
        })
    }

    pub async fn status(&self) -> StatusSnapshot {
        self.status.snapshot().await
    }

    pub async fn update_funding(
        &self,
        request: FundingUpdateRequest,
    ) -> Result<FundingUpdateResponse, ApiError> {
        if !request.amount.is_finite() || request.amount < 0.0 {
            return Err(ApiError::ValidationError {
                field: "amount".to_string(),
                message: "Invalid amount".to_string(),
            });
        }

        let snapshot = self.status.set_funding(request.amount).await;
        Ok(FundingUpdateResponse {
            message: "Funding updated".to_string(),
            funding_amount: snapshot.funding_amount,
        })
    }

    pub async fn update_bots_online(
        &self,
        request: BotsOnlineRequest,
    ) -> Result<BotsOnlineResponse, ApiError> {
        let snapshot = self.status.set_bots_online(request.bots_online).await;
        Ok(BotsOnlineResponse {
            message: "Bot count updated".to_string(),
            bots_online: snapshot.bots_online,
        })
    }

    pub async fn health(&self) -> serde_json::Value {
        let stats = self.fetch_cache.get_stats().await;
        serde_json::json!({
            "status": "ok",
            "version": crate::version::get_version_info(),
            "cache": {
                "hits": stats.hits,
                "misses": stats.misses,
                "stale_served": stats.stale_served,
                "hit_rate": stats.hit_rate,
            },
        })
    }
}
