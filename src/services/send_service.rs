// services/send_service.rs
use crate::errors::error::AppError;
use crate::log_info;
use crate::services::tx::{DraftTransaction, GasEstimator, SubmissionHandle, TransactionBuilder, TransactionParams, TxSubmitter};
use ethers_core::types::U256;
use std::sync::Arc;

/// 一次发送流程：独占草稿，估算 gas，确认时构建并提交
pub struct SendFlow {
    draft: DraftTransaction,
    estimator: Arc<GasEstimator>,
    submitter: Arc<dyn TxSubmitter>,
    builder: TransactionBuilder,
    chain_id: u64,
    is_non_standard_eth_chain: bool,
}

impl SendFlow {
    pub fn new(
        draft: DraftTransaction,
        estimator: Arc<GasEstimator>,
        submitter: Arc<dyn TxSubmitter>,
        chain_id: u64,
        is_non_standard_eth_chain: bool,
    ) -> Self {
        Self {
            draft,
            estimator,
            submitter,
            builder: TransactionBuilder,
            chain_id,
            is_non_standard_eth_chain,
        }
    }

    pub fn draft(&self) -> &DraftTransaction {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut DraftTransaction {
        &mut self.draft
    }

    /// 估算结果写回草稿的 gas limit
    pub async fn estimate_gas(&mut self) -> Result<U256, AppError> {
        let from = self.draft.from_account.unwrap_or_else(|| self.submitter.address());
        let gas = self
            .estimator
            .estimate_draft(&self.draft, from, self.chain_id, self.is_non_standard_eth_chain)
            .await?;
        self.draft.gas.gas_limit = gas;
        Ok(gas)
    }

    pub fn preview(&self) -> Result<TransactionParams, AppError> {
        self.builder.build(&self.draft, self.submitter.address())
    }

    /// 消费草稿；gas limit 未设置时先估算
    pub async fn confirm(mut self) -> Result<SubmissionHandle, AppError> {
        if self.draft.gas.gas_limit.is_zero() {
            self.estimate_gas().await?;
        }
        let params = self.preview()?;
        log_info!(
            "提交交易: from={:?} to={:?} gas={} fee-market={}",
            params.from,
            params.to,
            params.gas,
            params.fees.is_fee_market()
        );
        self.submitter.submit(&params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::error::GasEstimateError;
    use crate::infrastructure::provider::ProviderTrait;
    use crate::services::tx::{Asset, DryRunSubmitter, FeeFields, GasBufferPolicy};
    use async_trait::async_trait;
    use ethers_core::types::transaction::eip2718::TypedTransaction;
    use ethers_core::types::{Address, Bytes};

    struct ContractChain;

    #[async_trait]
    impl ProviderTrait for ContractChain {
        async fn get_chain_id(&self) -> Result<U256, AppError> {
            Ok(U256::one())
        }
        async fn get_code(&self, _address: Address) -> Result<Bytes, AppError> {
            Ok(Bytes::from(vec![0x60]))
        }
        async fn get_balance(&self, _address: Address) -> Result<U256, AppError> {
            Ok(U256::zero())
        }
        async fn get_block_gas_limit(&self) -> Result<U256, AppError> {
            Ok(U256::from(30_000_000u64))
        }
        async fn call(&self, _tx: &TypedTransaction) -> Result<Bytes, AppError> {
            Ok(Bytes::default())
        }
        async fn estimate_gas(&self, _tx: &TypedTransaction) -> Result<U256, GasEstimateError> {
            Ok(U256::from(40_000u64))
        }
    }

    fn flow(draft: DraftTransaction) -> SendFlow {
        SendFlow::new(
            draft,
            Arc::new(GasEstimator::new(Arc::new(ContractChain), GasBufferPolicy::default())),
            Arc::new(DryRunSubmitter::new(Address::repeat_byte(0x0a), 1)),
            1,
            false,
        )
    }

    #[tokio::test]
    async fn confirm_estimates_then_submits() {
        let mut draft = DraftTransaction::new(
            Asset::Token {
                address: Address::repeat_byte(0xdd),
                decimals: 6,
            },
            true,
        )
        .with_recipient(Address::repeat_byte(0x0b))
        .with_amount(U256::from(1_000u64));
        draft.gas.gas_price = Some(U256::from(7u64));

        let handle = flow(draft).confirm().await.unwrap();
        assert_eq!(handle.params.gas, U256::from(60_000u64));
        assert_eq!(handle.params.from, Address::repeat_byte(0x0a));
        assert_eq!(
            handle.params.fees,
            FeeFields::FeeMarket {
                max_fee_per_gas: Some(U256::from(7u64)),
                max_priority_fee_per_gas: Some(U256::from(7u64)),
            }
        );
    }

    #[tokio::test]
    async fn user_gas_limit_is_not_overwritten_on_confirm() {
        let mut draft = DraftTransaction::new(Asset::Native, false).with_recipient(Address::repeat_byte(0x0b));
        draft.gas.gas_limit = U256::from(99_999u64);
        let handle = flow(draft).confirm().await.unwrap();
        assert_eq!(handle.params.gas, U256::from(99_999u64));
    }

    #[tokio::test]
    async fn explicit_estimate_updates_draft() {
        let mut send = flow(DraftTransaction::new(Asset::Native, false).with_recipient(Address::repeat_byte(0x0b)));
        let gas = send.estimate_gas().await.unwrap();
        assert_eq!(send.draft().gas.gas_limit, gas);
        assert_eq!(send.preview().unwrap().gas, U256::from(60_000u64));
    }

    #[tokio::test]
    async fn missing_recipient_fails_before_submit() {
        let result = flow(DraftTransaction::new(Asset::Native, false)).confirm().await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }
}
