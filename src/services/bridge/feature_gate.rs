use crate::models::{BridgeFeatureFlags, Network, QuoteRequest};
use std::collections::HashSet;

/// 支持桥接的链（Mainnet, Optimism, BSC, Polygon, zkSync Era, Base, Arbitrum, Avalanche, Linea）
pub const ALLOWED_BRIDGE_CHAIN_IDS: [u64; 9] = [1, 10, 56, 137, 324, 8453, 42161, 43114, 59144];

/// 基于功能开关与白名单过滤源/目标网络
#[derive(Debug, Clone, Copy, Default)]
pub struct BridgeFeatureGate;

impl BridgeFeatureGate {
    /// 用户已添加的网络中，按 chain id 去重后保留支持桥接的
    pub fn bridgeable_networks(&self, all_networks: &[Network]) -> Vec<Network> {
        let mut seen = HashSet::new();
        all_networks
            .iter()
            .filter(|n| seen.insert(n.chain_id))
            .filter(|n| ALLOWED_BRIDGE_CHAIN_IDS.contains(&n.chain_id))
            .cloned()
            .collect()
    }

    pub fn filter_source_networks(&self, all_networks: &[Network], allow_list: &[u64]) -> Vec<Network> {
        all_networks
            .iter()
            .filter(|n| allow_list.contains(&n.chain_id))
            .cloned()
            .collect()
    }

    /// 目标网络永远不能是当前源网络
    pub fn filter_destination_networks(
        &self,
        all_networks: &[Network],
        allow_list: &[u64],
        exclude_chain_id: u64,
    ) -> Vec<Network> {
        all_networks
            .iter()
            .filter(|n| n.chain_id != exclude_chain_id && allow_list.contains(&n.chain_id))
            .cloned()
            .collect()
    }

    /// 当前链不在白名单时仍作为源网络返回，保证选择永不为空
    pub fn resolve_source_network(&self, source_networks: &[Network], current: &Network) -> Network {
        source_networks
            .iter()
            .find(|n| n.chain_id == current.chain_id)
            .unwrap_or(current)
            .clone()
    }

    pub fn resolve_destination_network(
        &self,
        destination_networks: &[Network],
        dest_chain_id: Option<u64>,
    ) -> Option<Network> {
        let dest_chain_id = dest_chain_id?;
        destination_networks
            .iter()
            .find(|n| n.chain_id == dest_chain_id)
            .cloned()
    }

    /// 报价请求是否被当前开关允许
    pub fn permits(&self, request: &QuoteRequest, flags: &BridgeFeatureFlags) -> bool {
        if !flags.extension_support {
            return false;
        }
        let src_allowed = request
            .src_chain_id
            .is_some_and(|id| flags.src_network_allowlist.contains(&id));
        let dest_allowed = request
            .dest_chain_id
            .is_some_and(|id| flags.dest_network_allowlist.contains(&id));
        src_allowed && dest_allowed
    }

    pub fn is_bridge_tx(&self, from: &Network, to: Option<&Network>, bridge_enabled: bool) -> bool {
        bridge_enabled && to.is_some_and(|to| to.chain_id != from.chain_id)
    }
}
