use serde::{Deserialize, Serialize};

// Wire types match the original dashboard client, hence camelCase fields.

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub user_profit: f64,
    pub user_wallet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawResponse {
    pub address: String,
    pub fee_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BotLogRequest {
    pub bot_id: String,
    #[serde(default)]
    pub tx_signature: Option<String>,
    pub status: String,
    pub user_wallet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BotLogResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub balance: f64,
    pub total_profits: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FundingUpdateRequest {
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FundingUpdateResponse {
    pub message: String,
    pub funding_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BotsOnlineRequest {
    pub bots_online: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BotsOnlineResponse {
    pub message: String,
    pub bots_online: u32,
}
