//! 桥接服务 REST 接口的原始报文结构
use crate::errors::error::AppError;
use crate::models::{BridgeFeatureFlags, BridgeToken, Quote, QuoteAsset, QuoteTrade};
use crate::utils::{parse_address, parse_hex_data, parse_quantity};
use ethers_core::types::U256;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct FeatureFlagsResponse {
    #[serde(rename = "extension-support", default)]
    pub extension_support: bool,
    #[serde(rename = "src-network-allowlist", default)]
    pub src_network_allowlist: Vec<u64>,
    #[serde(rename = "dest-network-allowlist", default)]
    pub dest_network_allowlist: Vec<u64>,
}

impl From<FeatureFlagsResponse> for BridgeFeatureFlags {
    fn from(resp: FeatureFlagsResponse) -> Self {
        Self {
            extension_support: resp.extension_support,
            src_network_allowlist: resp.src_network_allowlist,
            dest_network_allowlist: resp.dest_network_allowlist,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDto {
    pub address: String,
    pub chain_id: u64,
    pub symbol: String,
    pub decimals: u8,
    pub name: Option<String>,
    pub icon_url: Option<String>,
}

impl TryFrom<TokenDto> for BridgeToken {
    type Error = AppError;

    fn try_from(dto: TokenDto) -> Result<Self, Self::Error> {
        Ok(Self {
            address: parse_address(&dto.address)?,
            chain_id: dto.chain_id,
            symbol: dto.symbol,
            decimals: dto.decimals,
            name: dto.name,
            icon_url: dto.icon_url,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDto {
    pub address: String,
    pub chain_id: u64,
    pub decimals: u8,
    #[serde(default)]
    pub symbol: String,
}

impl TryFrom<AssetDto> for QuoteAsset {
    type Error = AppError;

    fn try_from(dto: AssetDto) -> Result<Self, Self::Error> {
        Ok(Self {
            address: parse_address(&dto.address)?,
            chain_id: dto.chain_id,
            decimals: dto.decimals,
            symbol: dto.symbol,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDto {
    pub request_id: String,
    pub src_asset: AssetDto,
    pub src_token_amount: String,
    pub dest_asset: AssetDto,
    pub dest_token_amount: String,
    pub bridge_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxDto {
    pub to: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub value: String,
    pub gas_limit: Option<u64>,
}

impl TryFrom<TxDto> for QuoteTrade {
    type Error = AppError;

    fn try_from(dto: TxDto) -> Result<Self, Self::Error> {
        Ok(Self {
            to: parse_address(&dto.to)?,
            data: parse_hex_data(&dto.data)?,
            value: if dto.value.is_empty() {
                U256::zero()
            } else {
                parse_quantity(&dto.value)?
            },
            gas_limit: dto.gas_limit.map(U256::from),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponseDto {
    pub quote: QuoteDto,
    pub approval: Option<TxDto>,
    pub trade: Option<TxDto>,
    pub estimated_processing_time_in_seconds: Option<u64>,
}

impl QuoteResponseDto {
    /// 预估 gas = 授权交易 + 兑换交易
    pub fn into_quote(self, fetched_at_ms: i64) -> Result<Quote, AppError> {
        let approval_gas = self
            .approval
            .as_ref()
            .and_then(|tx| tx.gas_limit)
            .unwrap_or_default();
        let trade = self.trade.map(QuoteTrade::try_from).transpose()?;
        let trade_gas = trade
            .as_ref()
            .and_then(|t| t.gas_limit)
            .unwrap_or_default();

        Ok(Quote {
            request_id: self.quote.request_id,
            aggregator_id: self.quote.bridge_id,
            src_asset: self.quote.src_asset.try_into()?,
            dest_asset: self.quote.dest_asset.try_into()?,
            src_token_amount: parse_quantity(&self.quote.src_token_amount)?,
            dest_token_amount: parse_quantity(&self.quote.dest_token_amount)?,
            estimated_gas: trade_gas + U256::from(approval_gas),
            fetched_at_ms,
            trade,
            estimated_processing_time_secs: self.estimated_processing_time_in_seconds,
        })
    }
}
