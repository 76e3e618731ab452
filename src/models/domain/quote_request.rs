use ethers_core::types::{Address, H160};
use serde::{Deserialize, Serialize};

/// 原生币（ETH/BNB/...）在报价接口中的占位地址
pub const NATIVE_TOKEN_ADDRESS: Address = H160([0u8; 20]);

pub const DEFAULT_SLIPPAGE: f64 = 0.5;

/// 报价请求。金额为最小单位的十进制字符串，避免精度丢失。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub wallet_address: Option<Address>,
    pub src_chain_id: Option<u64>,
    pub dest_chain_id: Option<u64>,
    pub src_token_address: Option<Address>,
    pub dest_token_address: Option<Address>,
    pub src_token_amount: Option<String>,
    pub slippage: f64,
}

impl Default for QuoteRequest {
    fn default() -> Self {
        Self {
            wallet_address: None,
            src_chain_id: None,
            dest_chain_id: None,
            src_token_address: Some(NATIVE_TOKEN_ADDRESS),
            dest_token_address: None,
            src_token_amount: None,
            slippage: DEFAULT_SLIPPAGE,
        }
    }
}

/// 按字段的增量更新，`None` 表示不改动该字段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequestUpdate {
    pub wallet_address: Option<Address>,
    pub src_chain_id: Option<u64>,
    pub dest_chain_id: Option<u64>,
    pub src_token_address: Option<Address>,
    pub dest_token_address: Option<Address>,
    pub src_token_amount: Option<String>,
    pub slippage: Option<f64>,
}
