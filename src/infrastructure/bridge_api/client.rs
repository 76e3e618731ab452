use super::dto::{FeatureFlagsResponse, QuoteResponseDto, TokenDto};
use crate::config::BridgeConfig;
use crate::errors::error::{AppError, QuoteError};
use crate::models::{BridgeFeatureFlags, BridgeToken, Quote, QuoteRequest};
use crate::services::bridge::traits::{FeatureFlagSource, QuoteProvider, TokenListProvider};
use crate::utils::time::now_ms;
use crate::{log_debug, log_warn};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

/// 桥接报价服务的 HTTP 客户端
pub struct BridgeApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl BridgeApiClient {
    pub fn new(config: &BridgeConfig) -> Result<Self, AppError> {
        let base_url = Url::parse(&config.api_base_url)
            .map_err(|e| AppError::Config(format!("invalid bridge api url: {}", e)))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::Config(format!("invalid endpoint {}: {}", path, e)))
    }
}

/// 报价接口的 HTTP 状态码 -> 报价错误分类
pub(crate) fn classify_status(status: StatusCode) -> QuoteError {
    match status {
        StatusCode::NOT_FOUND => QuoteError::NoRoutesAvailable,
        StatusCode::GONE => QuoteError::Expired,
        other => QuoteError::NetworkError(format!("bridge api responded {}", other)),
    }
}

pub(crate) fn quote_query(request: &QuoteRequest) -> Vec<(&'static str, String)> {
    let mut query = Vec::with_capacity(9);
    if let Some(wallet) = request.wallet_address {
        query.push(("walletAddress", format!("{:#x}", wallet)));
    }
    if let Some(chain_id) = request.src_chain_id {
        query.push(("srcChainId", chain_id.to_string()));
    }
    if let Some(chain_id) = request.dest_chain_id {
        query.push(("destChainId", chain_id.to_string()));
    }
    if let Some(token) = request.src_token_address {
        query.push(("srcTokenAddress", format!("{:#x}", token)));
    }
    if let Some(token) = request.dest_token_address {
        query.push(("destTokenAddress", format!("{:#x}", token)));
    }
    if let Some(amount) = &request.src_token_amount {
        query.push(("srcTokenAmount", amount.clone()));
    }
    query.push(("slippage", request.slippage.to_string()));
    query.push(("insufficientBal", "false".to_string()));
    query.push(("resetApproval", "false".to_string()));
    query
}

#[async_trait]
impl QuoteProvider for BridgeApiClient {
    fn name(&self) -> &str {
        "bridge-api"
    }

    async fn fetch_quotes(&self, request: &QuoteRequest) -> Result<Vec<Quote>, QuoteError> {
        let url = self
            .endpoint("getQuote")
            .map_err(|e| QuoteError::NetworkError(e.to_string()))?;
        let resp = self
            .http
            .get(url)
            .query(&quote_query(request))
            .send()
            .await
            .map_err(|e| QuoteError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(classify_status(resp.status()));
        }

        let body: Vec<QuoteResponseDto> = resp
            .json()
            .await
            .map_err(|e| QuoteError::NetworkError(format!("invalid quote payload: {}", e)))?;

        let fetched_at = now_ms();
        let quotes = body
            .into_iter()
            .filter_map(|dto| match dto.into_quote(fetched_at) {
                Ok(quote) => Some(quote),
                Err(e) => {
                    log_warn!("跳过无法解析的报价: {}", e);
                    None
                }
            })
            .collect::<Vec<_>>();
        log_debug!("bridge api 返回 {} 条报价", quotes.len());
        Ok(quotes)
    }
}

#[async_trait]
impl TokenListProvider for BridgeApiClient {
    async fn fetch_tokens(&self, chain_id: u64) -> Result<Vec<BridgeToken>, AppError> {
        let resp = self
            .http
            .get(self.endpoint("getTokens")?)
            .query(&[("chainId", chain_id.to_string())])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Network(e.to_string()))?;

        let tokens: Vec<TokenDto> = resp
            .json()
            .await
            .map_err(|e| AppError::Network(format!("invalid token payload: {}", e)))?;

        Ok(tokens
            .into_iter()
            .filter_map(|dto| BridgeToken::try_from(dto).ok())
            .collect())
    }
}

#[async_trait]
impl FeatureFlagSource for BridgeApiClient {
    async fn get_bridge_feature_flags(&self) -> Result<BridgeFeatureFlags, AppError> {
        let resp = self
            .http
            .get(self.endpoint("getAllFeatureFlags")?)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Network(e.to_string()))?;

        let flags: FeatureFlagsResponse = resp
            .json()
            .await
            .map_err(|e| AppError::Network(format!("invalid feature flag payload: {}", e)))?;
        Ok(flags.into())
    }
}
