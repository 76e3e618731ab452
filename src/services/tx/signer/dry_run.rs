// services/tx/signer/dry_run.rs

use crate::errors::error::AppError;
use crate::log_info;
use crate::services::tx::signer::{SubmissionHandle, TxSubmitter};
use crate::services::tx::types::TransactionParams;
use async_trait::async_trait;
use ethers_core::types::Address;

/// 不签名、不广播，只计算交易的签名哈希（CLI 预览用）
#[derive(Debug, Clone)]
pub struct DryRunSubmitter {
    address: Address,
    chain_id: u64,
}

impl DryRunSubmitter {
    pub fn new(address: Address, chain_id: u64) -> Self {
        Self { address, chain_id }
    }
}

#[async_trait]
impl TxSubmitter for DryRunSubmitter {
    async fn submit(&self, params: &TransactionParams) -> Result<SubmissionHandle, AppError> {
        let tx = params.to_typed_transaction(Some(self.chain_id));
        let id = tx.sighash();
        log_info!("dry-run 交易: to={:?} value={} sighash={:?}", params.to, params.value, id);
        Ok(SubmissionHandle {
            id,
            params: params.clone(),
        })
    }

    fn address(&self) -> Address {
        self.address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tx::types::FeeFields;
    use ethers_core::types::U256;

    fn params(chain_value: u64) -> TransactionParams {
        TransactionParams {
            from: Address::repeat_byte(1),
            to: Address::repeat_byte(2),
            value: U256::from(chain_value),
            data: None,
            gas: U256::from(21_000u64),
            fees: FeeFields::Legacy {
                gas_price: Some(U256::from(1u64)),
            },
        }
    }

    #[tokio::test]
    async fn sighash_depends_on_params() {
        let submitter = DryRunSubmitter::new(Address::repeat_byte(1), 1);
        let a = submitter.submit(&params(1)).await.unwrap();
        let b = submitter.submit(&params(2)).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.params, params(1));
        assert_eq!(submitter.submit(&params(1)).await.unwrap().id, a.id);
    }
}
