use crate::errors::QuoteErrorCode;
use ethers_core::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteAsset {
    pub address: Address,
    pub chain_id: u64,
    pub decimals: u8,
    #[serde(default)]
    pub symbol: String,
}

/// 报价附带的可直接上链的交易
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteTrade {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub gas_limit: Option<U256>,
}

/// 单个报价源返回的一条路由，收到后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub request_id: String,
    pub aggregator_id: String,
    pub src_asset: QuoteAsset,
    pub dest_asset: QuoteAsset,
    pub src_token_amount: U256,
    pub dest_token_amount: U256,
    pub estimated_gas: U256,
    pub fetched_at_ms: i64,
    pub trade: Option<QuoteTrade>,
    pub estimated_processing_time_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Loading,
    Fetched,
    Error,
}

/// 报价集合状态，quotes 保持到达顺序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSetState {
    pub status: Option<RequestStatus>,
    pub quotes: Vec<Quote>,
    pub last_fetched_ms: Option<i64>,
    pub error: Option<QuoteErrorCode>,
}
