// services/balance_service.rs
use crate::errors::error::AppError;
use crate::infrastructure::provider::ProviderTrait;
use crate::log_debug;
use crate::models::NATIVE_TOKEN_ADDRESS;
use crate::services::tx::calldata::{decode_uint, erc20_balance_of};
use crate::utils::format_token_amount;
use ethers_core::types::{Address, TransactionRequest, U256};
use std::sync::Arc;

/// 展示余额时保留的小数位
const BALANCE_PRECISION: u8 = 6;

/// 余额读取；只能读当前连接的链
pub struct BalanceService {
    provider: Arc<dyn ProviderTrait>,
    current_chain_id: u64,
}

impl BalanceService {
    pub fn new(provider: Arc<dyn ProviderTrait>, current_chain_id: u64) -> Self {
        Self {
            provider,
            current_chain_id,
        }
    }

    /// token 为空或零地址时读原生币余额，否则走 ERC-20 balanceOf
    pub async fn get_balance(&self, owner: Address, token: Option<Address>) -> Result<U256, AppError> {
        match token.filter(|t| *t != NATIVE_TOKEN_ADDRESS) {
            None => self.provider.get_balance(owner).await,
            Some(token) => {
                let tx = TransactionRequest::new()
                    .to(token)
                    .data(erc20_balance_of(owner));
                let output = self.provider.call(&tx.into()).await?;
                decode_uint(&output)
            }
        }
    }

    /// 格式化后的余额；非当前链上的代币返回 "0"
    pub async fn latest_balance(
        &self,
        owner: Address,
        token: Address,
        decimals: u8,
        chain_id: u64,
    ) -> Result<String, AppError> {
        if chain_id != self.current_chain_id {
            log_debug!("链 {} 非当前链 {}，余额按 0 处理", chain_id, self.current_chain_id);
            return Ok("0".to_string());
        }
        let balance = self.get_balance(owner, Some(token)).await?;
        Ok(format_token_amount(balance, decimals, BALANCE_PRECISION.min(decimals)))
    }
}
