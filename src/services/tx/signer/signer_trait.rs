use crate::errors::error::AppError;
use crate::services::tx::types::TransactionParams;
use async_trait::async_trait;
use ethers_core::types::{Address, H256};
use serde::Serialize;

/// 签名器受理交易后返回的句柄
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionHandle {
    pub id: H256,
    pub params: TransactionParams,
}

/// 外部签名/广播器；密钥管理不在本 crate 内
#[async_trait]
pub trait TxSubmitter: Send + Sync {
    async fn submit(&self, params: &TransactionParams) -> Result<SubmissionHandle, AppError>;
    /// 未指定 from 时使用的默认账户
    fn address(&self) -> Address;
}
