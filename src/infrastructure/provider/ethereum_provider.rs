use crate::config::EthereumConfig;
use crate::errors::error::{AppError, GasEstimateError};
use crate::log_info;
use async_trait::async_trait;
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{Address, BlockNumber, Bytes, U256};
use ethers_providers::{Http, Middleware, Provider, ProviderError, RpcError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// 模拟失败时回退的 gas 上限：区块 gas limit 的 95%
const SIMULATION_FALLBACK_PERCENT: u64 = 95;

/// JSON-RPC `execution reverted` 错误码
const EXECUTION_REVERTED_CODE: i64 = 3;

#[async_trait]
pub trait ProviderTrait: Send + Sync {
    async fn get_chain_id(&self) -> Result<U256, AppError>;
    async fn get_code(&self, address: Address) -> Result<Bytes, AppError>;
    async fn get_balance(&self, address: Address) -> Result<U256, AppError>;
    async fn get_block_gas_limit(&self) -> Result<U256, AppError>;
    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes, AppError>;
    /// 交易模拟 revert 时返回 `SimulationFailed`，其余错误原样上抛
    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256, GasEstimateError>;
}

pub struct EthereumProvider {
    providers: Vec<Arc<Provider<Http>>>,
    index: AtomicUsize,
}

impl EthereumProvider {
    pub fn new(config: &EthereumConfig) -> Result<Self, AppError> {
        let providers = config
            .api_keys
            .split(',')
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(|key| build_provider(&config.rpc_url, key))
            .collect::<Result<Vec<_>, _>>()?;

        if providers.is_empty() {
            return Err(AppError::Config("No valid api keys provided".to_string()));
        }
        log_info!("成功初始化 {} 个RPC Provider", providers.len());

        Ok(Self {
            providers,
            index: AtomicUsize::new(0),
        })
    }

    /// 轮询选择一个 Provider
    pub fn get_provider(&self) -> Arc<Provider<Http>> {
        let i = self.index.fetch_add(1, Ordering::Relaxed);
        self.providers[i % self.providers.len()].clone()
    }
}

fn build_provider(rpc_url: &str, key: &str) -> Result<Arc<Provider<Http>>, AppError> {
    let url = if rpc_url.ends_with('/') {
        Url::parse(&format!("{}{}", rpc_url, key))
    } else {
        Url::parse(rpc_url).map(|mut url| {
            url.set_path(&format!("/{}", key));
            url
        })
    }
    .map_err(|e| AppError::Config(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;

    Provider::<Http>::try_from(url.as_str())
        .map(Arc::new)
        .map_err(|e| AppError::Config(format!("Invalid RPC URL {}: {}", url, e)))
}

/// 节点拒绝执行（revert）属于确定性失败，重试没有意义
pub(crate) fn is_execution_revert(err: &ProviderError) -> bool {
    match err.as_error_response() {
        Some(rpc) => rpc.code == EXECUTION_REVERTED_CODE || rpc.message.contains("revert"),
        None => err.to_string().contains("execution reverted"),
    }
}

pub(crate) fn simulation_fallback_gas(block_gas_limit: U256) -> U256 {
    block_gas_limit * U256::from(SIMULATION_FALLBACK_PERCENT) / U256::from(100)
}

#[async_trait]
impl ProviderTrait for EthereumProvider {
    async fn get_chain_id(&self) -> Result<U256, AppError> {
        self.get_provider()
            .get_chainid()
            .await
            .map_err(AppError::from)
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, AppError> {
        self.get_provider()
            .get_code(address, None)
            .await
            .map_err(AppError::from)
    }

    async fn get_balance(&self, address: Address) -> Result<U256, AppError> {
        self.get_provider()
            .get_balance(address, None)
            .await
            .map_err(AppError::from)
    }

    async fn get_block_gas_limit(&self) -> Result<U256, AppError> {
        self.get_provider()
            .get_block(BlockNumber::Latest)
            .await?
            .map(|block| block.gas_limit)
            .ok_or_else(|| AppError::ProviderError("latest block not available".to_string()))
    }

    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes, AppError> {
        self.get_provider()
            .call(tx, None)
            .await
            .map_err(|e| AppError::ProviderError(format!("Call simulation failed: {}", e)))
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256, GasEstimateError> {
        match self.get_provider().estimate_gas(tx, None).await {
            Ok(gas) => Ok(gas),
            Err(e) if is_execution_revert(&e) => {
                let block_gas_limit = self.get_block_gas_limit().await?;
                Err(GasEstimateError::SimulationFailed {
                    gas: simulation_fallback_gas(block_gas_limit),
                })
            }
            Err(e) => Err(AppError::ProviderError(format!("estimate_gas failed: {}", e)).into()),
        }
    }
}
