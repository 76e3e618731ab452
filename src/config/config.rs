use crate::models::Network;
use config::{ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub ethereum: EthereumConfig,
    pub bridge: BridgeConfig,
    pub gas: GasConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EthereumConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    /// 逗号分隔，每个 key 对应一个 RPC Provider
    pub api_keys: String,
    pub max_retries: usize,
    pub base_delay_secs: u64,
    /// 非标准 EVM 链（简单转账 gas 不固定为 21000）
    #[serde(default)]
    pub non_standard_chain: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlagsSource {
    Api,
    File,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BridgeConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub debounce_ms: u64,
    pub refresh_interval_ms: u64,
    pub flags_source: FlagsSource,
    pub flags_path: String,
    #[serde(default = "default_cross_chain_required")]
    pub cross_chain_required: bool,
    /// 用户可选的网络，桥接白名单在此基础上再过滤
    #[serde(default)]
    pub networks: Vec<NetworkConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub name: String,
    #[serde(default)]
    pub rpc_url: Option<String>,
}

impl From<&NetworkConfig> for Network {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            chain_id: config.chain_id,
            name: config.name.clone(),
            rpc_url: config.rpc_url.clone(),
        }
    }
}

impl BridgeConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

fn default_cross_chain_required() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct GasConfig {
    /// 百分比，150 表示 1.5 倍
    pub default_buffer_percent: u64,
    #[serde(default)]
    pub chain_buffers: Vec<ChainBufferConfig>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ChainBufferConfig {
    pub chain_id: u64,
    pub percent: u64,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        config::Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }
}
