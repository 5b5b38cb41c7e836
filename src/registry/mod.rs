use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

pub const FUNDING_PENDING_STATUS: &str = "Awaiting Funding Drop";
pub const FUNDING_COMPLETE_STATUS: &str = "Funding Complete - Awaiting API Key";
pub const DEFAULT_FUNDING_GOAL: f64 = 4050.0;

/// Strategy parameters pinned alongside a bot definition, keyed by its CID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BotParams {
    pub strategy: String,
    pub max_slippage: f64,
    #[serde(rename = "targetSOL")]
    pub target_sol: f64,
}

/// In-memory bot parameter lookup. Process-lifetime only; the pinned content
/// itself comes through the gateway fetch cache.
pub struct BotRegistry {
    bots: RwLock<HashMap<String, BotParams>>,
}

impl BotRegistry {
    pub fn new() -> Self {
        Self {
            bots: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_defaults() -> Self {
        let registry = Self::new();
        {
            let mut bots = registry.bots.try_write().expect("fresh registry lock");
            bots.insert(
                "QmTWm6xa4yXTP8TUgWstqoKn5aGhfzoa5ejntuUyhFbHVn".to_string(),
                BotParams {
                    strategy: "Leverage Trading Bot".to_string(),
                    max_slippage: 2.0,
                    target_sol: 4.0,
                },
            );
        }
        registry
    }

    pub async fn get(&self, cid: &str) -> Option<BotParams> {
        self.bots.read().await.get(cid).cloned()
    }

    pub async fn insert(&self, cid: &str, params: BotParams) {
        self.bots.write().await.insert(cid.to_string(), params);
    }

    pub async fn len(&self) -> usize {
        self.bots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for BotRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub status: String,
    pub bots_online: u32,
    pub funding_amount: f64,
    pub funding_goal: f64,
}

/// Funding/status state shared with the dashboard endpoints.
pub struct NodeStatus {
    inner: RwLock<StatusSnapshot>,
}

impl NodeStatus {
    pub fn new(funding_goal: f64) -> Self {
        Self {
            inner: RwLock::new(StatusSnapshot {
                status: FUNDING_PENDING_STATUS.to_string(),
                bots_online: 0,
                funding_amount: 0.0,
                funding_goal,
            }),
        }
    }

    pub async fn snapshot(&self) -> StatusSnapshot {
        self.inner.read().await.clone()
    }

    pub async fn set_funding(&self, amount: f64) -> StatusSnapshot {
        let mut state = self.inner.write().await;
        state.funding_amount = amount;
        if state.funding_amount >= state.funding_goal {
            state.status = FUNDING_COMPLETE_STATUS.to_string();
        }
        state.clone()
    }

    pub async fn set_bots_online(&self, count: u32) -> StatusSnapshot {
        let mut state = self.inner.write().await;
        state.bots_online = count;
        state.clone()
    }
}

impl Default for NodeStatus {
    fn default() -> Self {
        Self::new(DEFAULT_FUNDING_GOAL)
    }
}
