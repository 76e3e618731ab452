use crate::config::flags_config::FeatureFlagContainer;
use crate::errors::error::{AppError, QuoteError};
use crate::models::{BridgeFeatureFlags, BridgeToken, Quote, QuoteRequest};
use async_trait::async_trait;

/// 报价源（聚合器/桥）
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_quotes(&self, request: &QuoteRequest) -> Result<Vec<Quote>, QuoteError>;
}

#[async_trait]
pub trait TokenListProvider: Send + Sync {
    async fn fetch_tokens(&self, chain_id: u64) -> Result<Vec<BridgeToken>, AppError>;
}

#[async_trait]
pub trait FeatureFlagSource: Send + Sync {
    async fn get_bridge_feature_flags(&self) -> Result<BridgeFeatureFlags, AppError>;
}

#[async_trait]
impl FeatureFlagSource for FeatureFlagContainer {
    async fn get_bridge_feature_flags(&self) -> Result<BridgeFeatureFlags, AppError> {
        Ok(self.load().as_ref().clone())
    }
}
