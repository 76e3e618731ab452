// services/tx/gas/gas_buffer.rs

use crate::config::GasConfig;
use ethers_core::types::U256;
use std::collections::HashMap;

/// 默认 buffer：1.5 倍
pub const DEFAULT_BUFFER_PERCENT: u64 = 150;
/// 不加 buffer
pub const NO_BUFFER_PERCENT: u64 = 100;
/// 区块 gas 上限中允许单笔交易使用的比例
const BLOCK_GAS_LIMIT_CAP_PERCENT: u64 = 90;

/// gas buffer 策略（纯整数百分比运算）
#[derive(Debug, Clone)]
pub struct GasBufferPolicy {
    default_percent: u64,
    chain_overrides: HashMap<u64, u64>,
}

impl Default for GasBufferPolicy {
    fn default() -> Self {
        // Optimism 与 OP Sepolia 的估算已足够准确
        Self {
            default_percent: DEFAULT_BUFFER_PERCENT,
            chain_overrides: HashMap::from([(10, NO_BUFFER_PERCENT), (11155420, NO_BUFFER_PERCENT)]),
        }
    }
}

impl GasBufferPolicy {
    pub fn from_config(config: &GasConfig) -> Self {
        Self {
            default_percent: config.default_buffer_percent,
            chain_overrides: config
                .chain_buffers
                .iter()
                .map(|c| (c.chain_id, c.percent))
                .collect(),
        }
    }

    /// 非标准链上的简单转账不加 buffer，其次看链级覆盖，最后用默认值
    pub fn percent(&self, chain_id: u64, simple_send_on_non_standard_chain: bool) -> u64 {
        if simple_send_on_non_standard_chain {
            return NO_BUFFER_PERCENT;
        }
        self.chain_overrides
            .get(&chain_id)
            .copied()
            .unwrap_or(self.default_percent)
    }
}

/// 以区块 gas 上限的 90% 为天花板套用 buffer：
/// - 原始值已超过天花板：原样返回
/// - 加 buffer 后仍低于天花板：返回加 buffer 的值
/// - 否则：返回天花板
pub fn add_gas_buffer(raw: U256, block_gas_limit: U256, percent: u64) -> U256 {
    let upper = block_gas_limit.saturating_mul(U256::from(BLOCK_GAS_LIMIT_CAP_PERCENT)) / 100;
    let buffered = raw.saturating_mul(U256::from(percent)) / 100;
    if raw > upper {
        raw
    } else if buffered < upper {
        buffered
    } else {
        upper
    }
}
