use crate::errors::error::AppError;
use crate::models::{BridgeFeatureFlags, BridgeState, BridgeToken, Network, Quote, QuoteRequest, QuoteRequestUpdate};
use crate::services::bridge::feature_gate::BridgeFeatureGate;
use crate::services::bridge::quote_aggregator::{AggregatorSettings, QuoteAggregator, SubmitOutcome};
use crate::services::bridge::quote_request_model::QuoteRequestModel;
use crate::services::bridge::quote_selector::QuoteSelector;
use crate::services::bridge::traits::{FeatureFlagSource, QuoteProvider, TokenListProvider};
use crate::{log_debug, log_info};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct SessionState {
    flags: BridgeFeatureFlags,
    src_network: Option<Network>,
    dest_network: Option<Network>,
    src_tokens: BTreeMap<String, BridgeToken>,
    dest_tokens: BTreeMap<String, BridgeToken>,
    quote_request: QuoteRequest,
}

/// 一次桥接会话：功能开关、代币列表、可编辑的报价请求和报价聚合
pub struct BridgeController {
    flag_source: Arc<dyn FeatureFlagSource>,
    token_source: Arc<dyn TokenListProvider>,
    /// 用户已添加的网络
    networks: Vec<Network>,
    aggregator: QuoteAggregator,
    model: QuoteRequestModel,
    gate: BridgeFeatureGate,
    selector: QuoteSelector,
    state: RwLock<SessionState>,
}

impl BridgeController {
    pub fn new(
        flag_source: Arc<dyn FeatureFlagSource>,
        token_source: Arc<dyn TokenListProvider>,
        providers: Vec<Arc<dyn QuoteProvider>>,
        networks: Vec<Network>,
        model: QuoteRequestModel,
        settings: AggregatorSettings,
    ) -> Self {
        Self {
            flag_source,
            token_source,
            networks,
            aggregator: QuoteAggregator::new(providers, model, settings),
            model,
            gate: BridgeFeatureGate,
            selector: QuoteSelector,
            state: RwLock::new(SessionState::default()),
        }
    }

    pub async fn set_feature_flags(&self) -> Result<BridgeFeatureFlags, AppError> {
        let flags = self.flag_source.get_bridge_feature_flags().await?;
        log_info!(
            "桥接开关已更新 | extension_support={} src={:?} dest={:?}",
            flags.extension_support,
            flags.src_network_allowlist,
            flags.dest_network_allowlist
        );
        self.state.write().await.flags = flags.clone();
        Ok(flags)
    }

    /// 可作为源的网络：支持桥接且在源白名单内
    pub async fn source_networks(&self) -> Vec<Network> {
        let flags = self.state.read().await.flags.clone();
        self.gate.filter_source_networks(
            &self.gate.bridgeable_networks(&self.networks),
            &flags.src_network_allowlist,
        )
    }

    /// 可作为目标的网络，永远不包含当前源链
    pub async fn destination_networks(&self) -> Vec<Network> {
        let state = self.state.read().await;
        let src_chain_id = state.quote_request.src_chain_id.unwrap_or_default();
        self.gate.filter_destination_networks(
            &self.gate.bridgeable_networks(&self.networks),
            &state.flags.dest_network_allowlist,
            src_chain_id,
        )
    }

    /// 以当前所在链作为源；不在白名单时仍保留当前链
    pub async fn select_src_network(&self, current: &Network) -> Result<SubmitOutcome, AppError> {
        let source = self
            .gate
            .resolve_source_network(&self.source_networks().await, current);
        let tokens = self.load_tokens(source.chain_id).await?;
        {
            let mut state = self.state.write().await;
            state.src_tokens = tokens;
            if state
                .dest_network
                .as_ref()
                .is_some_and(|dest| dest.chain_id == source.chain_id)
            {
                log_debug!("目标链与新的源链相同，已清空目标链 {}", source.chain_id);
                state.dest_network = None;
                state.dest_tokens.clear();
                state.quote_request.dest_chain_id = None;
            }
            state.src_network = Some(source.clone());
        }
        self.update_quote_params(QuoteRequestUpdate {
            src_chain_id: Some(source.chain_id),
            ..Default::default()
        })
        .await
    }

    pub async fn select_dest_network(&self, chain_id: u64) -> Result<SubmitOutcome, AppError> {
        let destination = self
            .gate
            .resolve_destination_network(&self.destination_networks().await, Some(chain_id))
            .ok_or_else(|| AppError::InvalidRequest(format!("链 {} 不能作为桥接目标", chain_id)))?;
        let tokens = self.load_tokens(chain_id).await?;
        {
            let mut state = self.state.write().await;
            state.dest_tokens = tokens;
            state.dest_network = Some(destination);
        }
        self.update_quote_params(QuoteRequestUpdate {
            dest_chain_id: Some(chain_id),
            ..Default::default()
        })
        .await
    }

    /// 合并参数；只有完整且被开关允许的请求才会进入聚合器
    pub async fn update_quote_params(&self, update: QuoteRequestUpdate) -> Result<SubmitOutcome, AppError> {
        let (request, flags) = {
            let mut state = self.state.write().await;
            state.quote_request = self.model.update(&state.quote_request, update);
            (state.quote_request.clone(), state.flags.clone())
        };
        Ok(self.dispatch(request, &flags).await)
    }

    /// 交换源和目标（链、代币、代币列表），金额清空
    pub async fn switch_tokens(&self) -> SubmitOutcome {
        let (request, flags) = {
            let mut state = self.state.write().await;
            state.quote_request = self.model.switch_tokens(&state.quote_request);
            let SessionState {
                src_network,
                dest_network,
                src_tokens,
                dest_tokens,
                ..
            } = &mut *state;
            std::mem::swap(src_network, dest_network);
            std::mem::swap(src_tokens, dest_tokens);
            (state.quote_request.clone(), state.flags.clone())
        };
        self.dispatch(request, &flags).await
    }

    pub async fn reset_state(&self) {
        self.aggregator.reset().await;
        let mut state = self.state.write().await;
        state.quote_request = self.model.reset();
        state.src_network = None;
        state.dest_network = None;
        state.src_tokens.clear();
        state.dest_tokens.clear();
        log_debug!("桥接会话已重置");
    }

    /// 流程结束（页面关闭等）：停止轮询，保留状态
    pub async fn deactivate(&self) {
        self.aggregator.stop().await;
    }

    pub async fn state(&self) -> BridgeState {
        let snapshot = self.aggregator.snapshot().await;
        let state = self.state.read().await;
        BridgeState {
            bridge_feature_flags: state.flags.clone(),
            src_network: state.src_network.clone(),
            dest_network: state.dest_network.clone(),
            src_tokens: state.src_tokens.clone(),
            dest_tokens: state.dest_tokens.clone(),
            quotes: snapshot.quote_set.quotes,
            quote_request: state.quote_request.clone(),
            quotes_last_fetched: snapshot.quote_set.last_fetched_ms,
            quotes_loading_status: snapshot.quote_set.status,
            quotes_error: snapshot.quote_set.error,
        }
    }

    pub async fn recommended_quote(&self) -> Option<Quote> {
        let snapshot = self.aggregator.snapshot().await;
        self.selector.recommended(&snapshot.quote_set.quotes).cloned()
    }

    pub fn selector(&self) -> &QuoteSelector {
        &self.selector
    }

    async fn dispatch(&self, request: QuoteRequest, flags: &BridgeFeatureFlags) -> SubmitOutcome {
        if self.model.is_valid(&request) && !self.gate.permits(&request, flags) {
            log_debug!(
                "桥接开关不允许 {:?} -> {:?}，不拉取报价",
                request.src_chain_id,
                request.dest_chain_id
            );
            self.aggregator.withdraw().await;
            return SubmitOutcome::Ignored;
        }
        self.aggregator.submit(request).await
    }

    async fn load_tokens(&self, chain_id: u64) -> Result<BTreeMap<String, BridgeToken>, AppError> {
        let tokens = self.token_source.fetch_tokens(chain_id).await?;
        log_debug!("链 {} 共 {} 个可桥接代币", chain_id, tokens.len());
        Ok(tokens
            .into_iter()
            .map(|token| (format!("{:#x}", token.address), token))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::error::QuoteError;
    use crate::models::{NATIVE_TOKEN_ADDRESS, QuoteAsset, RequestStatus};
    use async_trait::async_trait;
    use ethers_core::types::{Address, U256};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    struct StaticFlags(BridgeFeatureFlags);

    #[async_trait]
    impl FeatureFlagSource for StaticFlags {
        async fn get_bridge_feature_flags(&self) -> Result<BridgeFeatureFlags, AppError> {
            Ok(self.0.clone())
        }
    }

    struct StaticTokens;

    #[async_trait]
    impl TokenListProvider for StaticTokens {
        async fn fetch_tokens(&self, chain_id: u64) -> Result<Vec<BridgeToken>, AppError> {
            Ok(vec![BridgeToken {
                address: Address::repeat_byte(chain_id as u8),
                chain_id,
                symbol: format!("TKN{}", chain_id),
                decimals: 6,
                name: None,
                icon_url: None,
            }])
        }
    }

    #[derive(Default)]
    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QuoteProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        async fn fetch_quotes(&self, _request: &QuoteRequest) -> Result<Vec<Quote>, QuoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let asset = |chain_id| QuoteAsset {
                address: NATIVE_TOKEN_ADDRESS,
                chain_id,
                decimals: 6,
                symbol: "USDC".to_string(),
            };
            Ok(vec![
                quote_with(asset(1), asset(10), 900),
                quote_with(asset(1), asset(10), 990),
            ])
        }
    }

    fn quote_with(src: QuoteAsset, dest: QuoteAsset, dest_amount: u64) -> Quote {
        Quote {
            request_id: format!("q{}", dest_amount),
            aggregator_id: "counting".to_string(),
            src_asset: src,
            dest_asset: dest,
            src_token_amount: U256::from(1_000u64),
            dest_token_amount: U256::from(dest_amount),
            estimated_gas: U256::from(50_000u64),
            fetched_at_ms: 0,
            trade: None,
            estimated_processing_time_secs: None,
        }
    }

    fn enabled_flags() -> BridgeFeatureFlags {
        BridgeFeatureFlags {
            extension_support: true,
            src_network_allowlist: vec![1, 10],
            dest_network_allowlist: vec![1, 10],
        }
    }

    fn controller(flags: BridgeFeatureFlags, provider: Arc<CountingProvider>) -> BridgeController {
        BridgeController::new(
            Arc::new(StaticFlags(flags)),
            Arc::new(StaticTokens),
            vec![provider],
            vec![
                Network::new(1, "Ethereum"),
                Network::new(10, "Optimism"),
                Network::new(137, "Polygon"),
            ],
            QuoteRequestModel::bridge(),
            AggregatorSettings::default(),
        )
    }

    fn complete_update() -> QuoteRequestUpdate {
        QuoteRequestUpdate {
            wallet_address: Some(Address::repeat_byte(0x11)),
            src_chain_id: Some(1),
            dest_chain_id: Some(10),
            src_token_address: Some(NATIVE_TOKEN_ADDRESS),
            dest_token_address: Some(NATIVE_TOKEN_ADDRESS),
            src_token_amount: Some("1000".to_string()),
            slippage: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn permitted_request_fetches_and_recommends() {
        let provider = Arc::new(CountingProvider::default());
        let ctrl = controller(enabled_flags(), provider.clone());
        ctrl.set_feature_flags().await.unwrap();

        let outcome = ctrl.update_quote_params(complete_update()).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Scheduled { .. }));
        sleep(Duration::from_millis(1100)).await;

        let state = ctrl.state().await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.quotes.len(), 2);
        assert_eq!(state.quotes_loading_status, Some(RequestStatus::Fetched));
        assert!(state.bridge_feature_flags.extension_support);
        assert_eq!(ctrl.recommended_quote().await.unwrap().request_id, "q990");
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_flags_block_fetching() {
        let provider = Arc::new(CountingProvider::default());
        let ctrl = controller(BridgeFeatureFlags::default(), provider.clone());
        ctrl.set_feature_flags().await.unwrap();

        let outcome = ctrl.update_quote_params(complete_update()).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Ignored);
        sleep(Duration::from_secs(2)).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        // 请求本身仍然被记录
        assert_eq!(ctrl.state().await.quote_request.src_chain_id, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_networks_loads_token_lists() {
        let provider = Arc::new(CountingProvider::default());
        let ctrl = controller(enabled_flags(), provider);
        ctrl.set_feature_flags().await.unwrap();
        ctrl.select_src_network(&Network::new(1, "Ethereum")).await.unwrap();
        ctrl.select_dest_network(10).await.unwrap();

        let state = ctrl.state().await;
        assert_eq!(state.dest_network.map(|n| n.name), Some("Optimism".to_string()));
        assert_eq!(state.src_tokens.len(), 1);
        let key = format!("{:#x}", Address::repeat_byte(10));
        assert_eq!(state.dest_tokens[&key].symbol, "TKN10");
        assert_eq!(state.quote_request.src_chain_id, Some(1));
        assert_eq!(state.quote_request.dest_chain_id, Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn switch_tokens_swaps_lists_and_clears_amount() {
        let provider = Arc::new(CountingProvider::default());
        let ctrl = controller(enabled_flags(), provider);
        ctrl.set_feature_flags().await.unwrap();
        ctrl.select_src_network(&Network::new(1, "Ethereum")).await.unwrap();
        ctrl.select_dest_network(10).await.unwrap();
        ctrl.update_quote_params(complete_update()).await.unwrap();

        assert_eq!(ctrl.switch_tokens().await, SubmitOutcome::Ignored);
        let state = ctrl.state().await;
        assert_eq!(state.quote_request.src_chain_id, Some(10));
        assert_eq!(state.quote_request.src_token_amount, None);
        assert!(state.src_tokens.values().all(|t| t.chain_id == 10));
        assert_eq!(state.src_network.map(|n| n.chain_id), Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_restores_defaults() {
        let provider = Arc::new(CountingProvider::default());
        let ctrl = controller(enabled_flags(), provider);
        ctrl.set_feature_flags().await.unwrap();
        ctrl.select_src_network(&Network::new(1, "Ethereum")).await.unwrap();
        ctrl.update_quote_params(complete_update()).await.unwrap();
        sleep(Duration::from_millis(1100)).await;

        ctrl.reset_state().await;
        let state = ctrl.state().await;
        assert_eq!(state.quote_request, QuoteRequest::default());
        assert!(state.quotes.is_empty());
        assert!(state.src_tokens.is_empty());
        assert_eq!(state.src_network, None);
        assert_eq!(state.quotes_loading_status, None);
        // 开关不属于会话数据
        assert!(state.bridge_feature_flags.extension_support);
    }

    #[tokio::test(start_paused = true)]
    async fn current_chain_outside_allowlist_is_kept_as_source() {
        let provider = Arc::new(CountingProvider::default());
        let ctrl = controller(enabled_flags(), provider);
        ctrl.set_feature_flags().await.unwrap();

        let ids: Vec<u64> = ctrl.source_networks().await.iter().map(|n| n.chain_id).collect();
        assert_eq!(ids, vec![1, 10]);

        let polygon = Network::new(137, "Polygon");
        ctrl.select_src_network(&polygon).await.unwrap();
        let state = ctrl.state().await;
        assert_eq!(state.src_network, Some(polygon));
        assert_eq!(state.quote_request.src_chain_id, Some(137));
        assert!(state.src_tokens.values().all(|t| t.chain_id == 137));
    }

    #[tokio::test(start_paused = true)]
    async fn destination_never_targets_source_or_unlisted_chain() {
        let provider = Arc::new(CountingProvider::default());
        let ctrl = controller(enabled_flags(), provider);
        ctrl.set_feature_flags().await.unwrap();
        ctrl.select_src_network(&Network::new(1, "Ethereum")).await.unwrap();

        let ids: Vec<u64> = ctrl.destination_networks().await.iter().map(|n| n.chain_id).collect();
        assert_eq!(ids, vec![10]);
        assert!(matches!(ctrl.select_dest_network(1).await, Err(AppError::InvalidRequest(_))));
        assert!(matches!(ctrl.select_dest_network(137).await, Err(AppError::InvalidRequest(_))));
        assert_eq!(ctrl.state().await.quote_request.dest_chain_id, None);

        // 源链切到已选目标链时，目标被清空
        ctrl.select_dest_network(10).await.unwrap();
        ctrl.select_src_network(&Network::new(10, "Optimism")).await.unwrap();
        let state = ctrl.state().await;
        assert_eq!(state.dest_network, None);
        assert_eq!(state.quote_request.dest_chain_id, None);
        assert!(state.dest_tokens.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn refused_route_does_not_stay_loading() {
        let provider = Arc::new(CountingProvider::default());
        let ctrl = controller(enabled_flags(), provider.clone());
        ctrl.set_feature_flags().await.unwrap();

        let outcome = ctrl.update_quote_params(complete_update()).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Scheduled { .. }));
        assert_eq!(ctrl.state().await.quotes_loading_status, Some(RequestStatus::Loading));

        let refused = ctrl
            .update_quote_params(QuoteRequestUpdate {
                dest_chain_id: Some(137),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(refused, SubmitOutcome::Ignored);
        sleep(Duration::from_secs(120)).await;

        let state = ctrl.state().await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert_eq!(state.quotes_loading_status, None);
        assert!(state.quotes.is_empty());
    }
}
