// services/tx/gas/gas_estimator.rs

use crate::errors::error::{AppError, GasEstimateError};
use crate::infrastructure::provider::ProviderTrait;
use crate::services::tx::builder::resolve_call;
use crate::services::tx::gas::gas_buffer::{GasBufferPolicy, add_gas_buffer};
use crate::services::tx::types::{Asset, DraftTransaction};
use crate::{log_debug, log_warn};
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{Address, Bytes, TransactionRequest, U256};
use std::sync::Arc;

/// 标准链上无数据的原生币转账
pub const SIMPLE_SEND_GAS: u64 = 21_000;
/// 代币转账但收款地址未知时的保守估计
pub const BASE_TOKEN_ESTIMATE: u64 = 100_000;
/// 原生币金额为空/零时用于估算的占位金额
const PLACEHOLDER_VALUE: u64 = 0xff;

#[derive(Debug, Clone, Default)]
pub struct GasEstimateParams {
    pub from: Option<Address>,
    /// 收款地址（代币转账时是接收者，而不是合约）
    pub to: Option<Address>,
    pub value: Option<U256>,
    pub data: Option<Bytes>,
    pub gas_price: Option<U256>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GasEstimateContext {
    /// 代币合约地址；None 表示原生币
    pub send_token: Option<Address>,
    pub is_non_standard_eth_chain: bool,
    pub chain_id: u64,
}

pub struct GasEstimator {
    provider: Arc<dyn ProviderTrait>,
    policy: GasBufferPolicy,
}

impl GasEstimator {
    pub fn new(provider: Arc<dyn ProviderTrait>, policy: GasBufferPolicy) -> Self {
        Self { provider, policy }
    }

    pub async fn estimate(
        &self,
        params: &GasEstimateParams,
        ctx: &GasEstimateContext,
    ) -> Result<U256, AppError> {
        if ctx.send_token.is_some() && params.to.is_none() {
            return Ok(U256::from(BASE_TOKEN_ESTIMATE));
        }

        let no_payload = params.data.as_ref().is_none_or(|d| d.is_empty());
        let is_simple_send = ctx.send_token.is_none() && no_payload;

        // 没有收款地址时按非合约处理
        let mut is_contract = false;
        if is_simple_send {
            if let Some(to) = params.to {
                is_contract = !self.provider.get_code(to).await?.is_empty();
            }
            if !is_contract && !ctx.is_non_standard_eth_chain {
                log_debug!("{:?} 不是合约，使用固定 gas {}", params.to, SIMPLE_SEND_GAS);
                return Ok(U256::from(SIMPLE_SEND_GAS));
            }
        }

        let tx = self.estimate_request(params, ctx);
        let percent = self.policy.percent(
            ctx.chain_id,
            is_simple_send && !is_contract && ctx.is_non_standard_eth_chain,
        );

        let raw = match self.provider.estimate_gas(&tx).await {
            Ok(gas) => gas,
            // 唯一在本地恢复的错误：用回退值继续套 buffer
            Err(GasEstimateError::SimulationFailed { gas }) => {
                log_warn!("gas 模拟失败，使用回退值 {} 继续估算", gas);
                gas
            }
            Err(GasEstimateError::Provider(e)) => return Err(e),
        };

        let block_gas_limit = self.provider.get_block_gas_limit().await?;
        let gas = add_gas_buffer(raw, block_gas_limit, percent);
        log_debug!("gas 估算: raw={} buffer={}% final={}", raw, percent, gas);
        Ok(gas)
    }

    /// 基于发送草稿估算，代币/NFT 会生成对应的转账调用数据
    pub async fn estimate_draft(
        &self,
        draft: &DraftTransaction,
        from: Address,
        chain_id: u64,
        is_non_standard_eth_chain: bool,
    ) -> Result<U256, AppError> {
        let ctx = GasEstimateContext {
            send_token: draft.asset.contract_address(),
            is_non_standard_eth_chain,
            chain_id,
        };
        let params = match draft.recipient {
            None => GasEstimateParams {
                from: Some(from),
                ..Default::default()
            },
            Some(recipient) => {
                let call = resolve_call(draft, from, recipient);
                GasEstimateParams {
                    from: Some(from),
                    to: Some(recipient),
                    value: match draft.asset {
                        Asset::Native => Some(call.value),
                        _ => None,
                    },
                    data: call.data,
                    gas_price: draft.gas.gas_price.filter(|p| !p.is_zero()),
                }
            }
        };
        self.estimate(&params, &ctx).await
    }

    fn estimate_request(&self, params: &GasEstimateParams, ctx: &GasEstimateContext) -> TypedTransaction {
        let mut tx = TransactionRequest::new();
        if let Some(from) = params.from {
            tx = tx.from(from);
        }
        match ctx.send_token {
            Some(token) => {
                tx = tx.to(token).value(U256::zero());
            }
            None => {
                if let Some(to) = params.to {
                    tx = tx.to(to);
                }
                let value = params
                    .value
                    .filter(|v| !v.is_zero())
                    .unwrap_or_else(|| U256::from(PLACEHOLDER_VALUE));
                tx = tx.value(value);
            }
        }
        if let Some(data) = params.data.clone().filter(|d| !d.is_empty()) {
            tx = tx.data(data);
        }
        if let Some(price) = params.gas_price {
            tx = tx.gas_price(price);
        }
        tx.into()
    }
}
