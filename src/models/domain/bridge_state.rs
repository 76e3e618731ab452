use crate::errors::QuoteErrorCode;
use crate::models::domain::{BridgeFeatureFlags, BridgeToken, Network, Quote, QuoteRequest, RequestStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 对外暴露给 UI/存储层的会话状态快照
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeState {
    pub bridge_feature_flags: BridgeFeatureFlags,
    pub src_network: Option<Network>,
    pub dest_network: Option<Network>,
    /// 按小写地址索引
    pub src_tokens: BTreeMap<String, BridgeToken>,
    pub dest_tokens: BTreeMap<String, BridgeToken>,
    pub quotes: Vec<Quote>,
    pub quote_request: QuoteRequest,
    pub quotes_last_fetched: Option<i64>,
    pub quotes_loading_status: Option<RequestStatus>,
    pub quotes_error: Option<QuoteErrorCode>,
}
