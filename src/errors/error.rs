use ethers_core::types::U256;
use ethers_providers::ProviderError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// 本地校验失败，不会触达网络
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No routes available: {0}")]
    NoRoutesAvailable(String),

    #[error("Quotes expired: {0}")]
    QuotesExpired(String),

    /// 瞬时网络错误，下一轮轮询可重试
    #[error("Network error: {0}")]
    Network(String),

    #[error("Gas simulation failed, raw estimate {gas}")]
    GasSimulationFailed { gas: U256 },

    /// 资产标准不受支持（数据错误，非用户可恢复）
    #[error("Unsupported asset standard: {0}")]
    UnsupportedAssetStandard(String),

    #[error("无效的金额: {0}")]
    InvalidAmount(String),

    #[error("无效的地址: {0}")]
    InvalidAddress(String),

    #[error("无效的hex数据: {0}")]
    InvalidHex(String),

    #[error("无效的provider: {0}")]
    ProviderError(String),

    #[error("配置错误: {0}")]
    Config(String),

    /// 内部不可预期错误（兜底）
    #[error("内部错误: {0}")]
    Internal(String),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::ProviderError(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<hex::FromHexError> for AppError {
    fn from(err: hex::FromHexError) -> Self {
        AppError::InvalidHex(err.to_string())
    }
}

/// 报价源返回的分类错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("no routes available")]
    NoRoutesAvailable,

    #[error("quote request failed: {0}")]
    NetworkError(String),

    #[error("quotes expired")]
    Expired,
}

/// 暴露给状态快照的错误码（不携带细节）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteErrorCode {
    NoRoutesAvailable,
    NetworkError,
    QuotesExpired,
}

impl QuoteError {
    pub fn code(&self) -> QuoteErrorCode {
        match self {
            QuoteError::NoRoutesAvailable => QuoteErrorCode::NoRoutesAvailable,
            QuoteError::NetworkError(_) => QuoteErrorCode::NetworkError,
            QuoteError::Expired => QuoteErrorCode::QuotesExpired,
        }
    }
}

impl From<QuoteError> for AppError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::NoRoutesAvailable => AppError::NoRoutesAvailable(err.to_string()),
            QuoteError::NetworkError(msg) => AppError::Network(msg),
            QuoteError::Expired => AppError::QuotesExpired(err.to_string()),
        }
    }
}

/// eth_estimateGas 的结果分类：模拟失败时仍携带一个原始 gas 数值
#[derive(Error, Debug)]
pub enum GasEstimateError {
    #[error("simulation failed, fallback gas {gas}")]
    SimulationFailed { gas: U256 },

    #[error(transparent)]
    Provider(#[from] AppError),
}

impl From<GasEstimateError> for AppError {
    fn from(err: GasEstimateError) -> Self {
        match err {
            GasEstimateError::SimulationFailed { gas } => AppError::GasSimulationFailed { gas },
            GasEstimateError::Provider(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_errors_map_to_codes() {
        assert_eq!(QuoteError::Expired.code(), QuoteErrorCode::QuotesExpired);
        assert_eq!(
            QuoteError::NetworkError("timeout".into()).code(),
            QuoteErrorCode::NetworkError
        );
        assert_eq!(
            serde_json::to_string(&QuoteErrorCode::NoRoutesAvailable).unwrap(),
            "\"NO_ROUTES_AVAILABLE\""
        );
    }

    #[test]
    fn simulation_failure_keeps_raw_gas() {
        let err: AppError = GasEstimateError::SimulationFailed { gas: U256::from(50_000) }.into();
        assert!(matches!(err, AppError::GasSimulationFailed { gas } if gas == U256::from(50_000)));
    }
}
