use super::ethereum_provider::{
    EthereumProvider, ProviderTrait, is_execution_revert, simulation_fallback_gas,
};
use crate::errors::error::{AppError, GasEstimateError};
use crate::log_warn;
use async_trait::async_trait;
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{Address, BlockNumber, Bytes, U256};
use ethers_providers::{Http, Middleware, Provider, ProviderError};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

pub struct RetryAdapter {
    provider: Arc<EthereumProvider>,
    max_retries: usize,
    base_delay: Duration,
}

impl RetryAdapter {
    pub fn new(provider: Arc<EthereumProvider>, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            provider,
            max_retries: max_retries.max(1),
            base_delay,
        }
    }

    /// 指数退避 + 抖动；`retryable` 返回 false 的错误立即返回
    async fn retry_raw<T, Fut, F, R>(&self, mut f: F, retryable: R) -> Result<T, ProviderError>
    where
        F: FnMut(Arc<Provider<Http>>) -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, ProviderError>> + Send,
        R: Fn(&ProviderError) -> bool + Send,
    {
        let mut last_error = None;
        for attempt in 0..self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.base_delay, attempt);
                log_warn!("RPC 尝试失败，正在进行第 {} 次重试，等待 {:?}...", attempt + 1, delay);
                sleep(delay).await;
            }
            match f(self.provider.get_provider()).await {
                Ok(result) => return Ok(result),
                Err(e) if !retryable(&e) => return Err(e),
                Err(e) => {
                    log_warn!("RPC 调用失败 (第 {} 次): {:?}", attempt + 1, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ProviderError::CustomError("no attempt made".into())))
    }

    async fn retry_call<T, Fut, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnMut(Arc<Provider<Http>>) -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, ProviderError>> + Send,
    {
        self.retry_raw(f, |_| true).await.map_err(|e| {
            AppError::ProviderError(format!("重试 {} 次失败，最后错误: {}", self.max_retries, e))
        })
    }
}

fn backoff_delay(base: Duration, attempt: usize) -> Duration {
    // 指数倍数最高 2^10
    let exponent = (attempt.saturating_sub(1)).min(10) as u32;
    let delay_ms = (base.as_millis() as u64).saturating_mul(1u64 << exponent);
    // 0~10% 抖动，避免多个任务同时打到节点
    let jitter = rand::thread_rng().gen_range(0..=(delay_ms / 10 + 1));
    Duration::from_millis(delay_ms + jitter)
}

#[async_trait]
impl ProviderTrait for RetryAdapter {
    async fn get_chain_id(&self) -> Result<U256, AppError> {
        self.retry_call(|p| async move { p.get_chainid().await }).await
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, AppError> {
        self.retry_call(move |p| async move { p.get_code(address, None).await })
            .await
    }

    async fn get_balance(&self, address: Address) -> Result<U256, AppError> {
        self.retry_call(move |p| async move { p.get_balance(address, None).await })
            .await
    }

    async fn get_block_gas_limit(&self) -> Result<U256, AppError> {
        self.retry_call(|p| async move { p.get_block(BlockNumber::Latest).await })
            .await?
            .map(|block| block.gas_limit)
            .ok_or_else(|| AppError::ProviderError("latest block not available".to_string()))
    }

    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes, AppError> {
        self.retry_call(move |p| async move { p.call(tx, None).await })
            .await
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256, GasEstimateError> {
        let result = self
            .retry_raw(
                move |p| async move { p.estimate_gas(tx, None).await },
                |e| !is_execution_revert(e),
            )
            .await;

        match result {
            Ok(gas) => Ok(gas),
            Err(e) if is_execution_revert(&e) => {
                log_warn!("estimate_gas 模拟失败，使用区块 gas 上限回退: {}", e);
                let block_gas_limit = self.get_block_gas_limit().await?;
                Err(GasEstimateError::SimulationFailed {
                    gas: simulation_fallback_gas(block_gas_limit),
                })
            }
            Err(e) => Err(AppError::ProviderError(format!("estimate_gas failed: {}", e)).into()),
        }
    }
}
