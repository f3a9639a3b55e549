//! Bybit v5 response payloads

use serde::Deserialize;
use serde_json::Value;

use crate::types::Execution;

/// Outer envelope shared by every v5 endpoint.
///
/// `result` is kept untyped until `retCode` has been checked, since error
/// responses carry an empty or differently shaped result.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(rename = "retCode")]
    pub ret_code: i64,
    #[serde(rename = "retMsg", default)]
    pub ret_msg: String,
    #[serde(default)]
    pub result: Value,
}

// ============================================================================
// Execution list
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ExecutionListResult {
    #[serde(default)]
    pub list: Vec<Execution>,
    #[serde(rename = "nextPageCursor", default)]
    pub next_page_cursor: String,
}

// ============================================================================
// Market tickers
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TickerInfo {
    pub symbol: String,
    #[serde(rename = "lastPrice")]
    pub last_price: String,
}

#[derive(Debug, Deserialize)]
pub struct TickerListResult {
    #[serde(default)]
    pub list: Vec<TickerInfo>,
}

// ============================================================================
// Wallet balance
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CoinEquity {
    pub coin: String,
    #[serde(default)]
    pub equity: String,
}

#[derive(Debug, Deserialize)]
pub struct WalletAccount {
    #[serde(rename = "totalWalletBalance", default)]
    pub total_wallet_balance: String,
    #[serde(default)]
    pub coin: Vec<CoinEquity>,
}

#[derive(Debug, Deserialize)]
pub struct WalletBalanceResult {
    #[serde(default)]
    pub list: Vec<WalletAccount>,
}
