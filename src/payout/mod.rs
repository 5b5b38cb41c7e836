use crate::wallet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_FEE_PERCENT: f64 = 20.0;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PayoutError {
    #[error("Profit must be a positive amount")]
    InvalidProfit,
    #[error("Invalid wallet address")]
    InvalidWallet,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WithdrawalQuote {
    /// Fee payout address the client is asked to send the fee to.
    pub address: String,
    pub fee_amount: f64,
    pub net_amount: f64,
}

pub fn fee_amount(profit: f64, fee_percent: f64) -> f64 {
    profit * fee_percent / 100.0
}

/// Pure withdrawal quote: validates inputs and computes the fee split.
/// No settlement happens here; the client signs and submits on its own.
pub fn quote_withdrawal(
    profit: f64,
    fee_percent: f64,
    user_wallet: &str,
    fee_wallet: &str,
) -> Result<WithdrawalQuote, PayoutError> {
    if !profit.is_finite() || profit <= 0.0 {
        return Err(PayoutError::InvalidProfit);
    }
    if !wallet::is_valid_address(user_wallet) {
        return Err(PayoutError::InvalidWallet);
    }

    let fee = fee_amount(profit, fee_percent);
    Ok(WithdrawalQuote {
        address: fee_wallet.to_string(),
        fee_amount: fee,
        net_amount: profit - fee,
    })
}
