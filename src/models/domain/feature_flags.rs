use serde::{Deserialize, Serialize};

/// 桥接功能开关与网络白名单
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeFeatureFlags {
    #[serde(default)]
    pub extension_support: bool,
    #[serde(default)]
    pub src_network_allowlist: Vec<u64>,
    #[serde(default)]
    pub dest_network_allowlist: Vec<u64>,
}
