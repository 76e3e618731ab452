use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::cli::{BalanceArgs, QuoteArgs, SendArgs};
use crate::config::flags_config::FeatureFlagContainer;
use crate::config::{Config, FlagsSource};
use crate::errors::error::AppError;
use crate::infrastructure::bridge_api::BridgeApiClient;
use crate::infrastructure::provider::ethereum_provider::EthereumProvider;
use crate::infrastructure::provider::{ProviderTrait, RetryAdapter};
use crate::models::{NATIVE_TOKEN_ADDRESS, Network, QuoteRequestUpdate, RequestStatus};
use crate::services::bridge::{
    AggregatorSettings, BridgeController, FeatureFlagSource, QuoteProvider, QuoteRequestModel, SubmitOutcome,
};
use crate::services::tx::{DraftTransaction, DryRunSubmitter, GasBufferPolicy, GasEstimator};
use crate::services::{BalanceService, SendFlow};
use crate::{log_info, log_warn};

/// 状态轮询的打印间隔
const STATUS_TICK: Duration = Duration::from_millis(500);

/// 应用程序启动与管理（CLI 进程，无 HTTP API）
pub struct Application {
    config: Config,
    provider: Arc<dyn ProviderTrait>,
    bridge_api: Arc<BridgeApiClient>,
    flag_source: Arc<dyn FeatureFlagSource>,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl Application {
    /// 初始化 RPC / 桥接 API / 开关来源，不发起任何请求
    pub async fn build(config: Config) -> Result<Self> {
        let eth_provider = Arc::new(EthereumProvider::new(&config.ethereum)?);
        let provider = Arc::new(RetryAdapter::new(
            eth_provider,
            config.ethereum.max_retries,
            Duration::from_secs(config.ethereum.base_delay_secs),
        )) as Arc<dyn ProviderTrait>;

        let bridge_api = Arc::new(BridgeApiClient::new(&config.bridge)?);
        let flag_source: Arc<dyn FeatureFlagSource> = match config.bridge.flags_source {
            FlagsSource::Api => bridge_api.clone() as Arc<dyn FeatureFlagSource>,
            FlagsSource::File => {
                let container = FeatureFlagContainer::new(&config.bridge.flags_path)?;
                container.spawn_watcher();
                info!("桥接开关从文件加载: {}", config.bridge.flags_path);
                container as Arc<dyn FeatureFlagSource>
            }
        };

        Ok(Self {
            config,
            provider,
            bridge_api,
            flag_source,
        })
    }

    fn controller(&self) -> BridgeController {
        let providers: Vec<Arc<dyn QuoteProvider>> = vec![self.bridge_api.clone() as Arc<dyn QuoteProvider>];
        BridgeController::new(
            self.flag_source.clone(),
            self.bridge_api.clone(),
            providers,
            self.networks(),
            QuoteRequestModel::new(self.config.bridge.cross_chain_required),
            AggregatorSettings {
                debounce: self.config.bridge.debounce(),
                refresh_interval: self.config.bridge.refresh_interval(),
            },
        )
    }

    fn networks(&self) -> Vec<Network> {
        self.config.bridge.networks.iter().map(Network::from).collect()
    }

    /// 当前所在链；配置中没有时用 chain id 命名
    fn current_network(&self, chain_id: u64) -> Network {
        self.networks()
            .into_iter()
            .find(|n| n.chain_id == chain_id)
            .unwrap_or_else(|| Network::new(chain_id, format!("chain {}", chain_id)))
    }

    fn gas_estimator(&self) -> Arc<GasEstimator> {
        Arc::new(GasEstimator::new(
            self.provider.clone(),
            GasBufferPolicy::from_config(&self.config.gas),
        ))
    }

    /// 持续拉取报价，直到 Ctrl+C（或 `--once` 拿到第一轮结果）
    pub async fn run_quotes(self, args: QuoteArgs) -> anyhow::Result<()> {
        let controller = self.controller();
        controller.set_feature_flags().await?;

        // 代币列表只用于展示，失败不影响报价
        let current = self.current_network(args.src_chain);
        if let Err(e) = controller.select_src_network(&current).await {
            log_warn!("源链 {} 代币列表加载失败: {}", args.src_chain, e);
        }
        if let Err(e) = controller.select_dest_network(args.dest_chain).await {
            log_warn!("目标链 {} 代币列表加载失败: {}", args.dest_chain, e);
        }

        let outcome = controller
            .update_quote_params(QuoteRequestUpdate {
                wallet_address: Some(args.wallet),
                src_chain_id: Some(args.src_chain),
                dest_chain_id: Some(args.dest_chain),
                src_token_address: Some(args.src_token()),
                dest_token_address: Some(args.dest_token()),
                src_token_amount: Some(args.base_amount()?),
                slippage: Some(args.slippage),
            })
            .await?;
        if outcome == SubmitOutcome::Ignored {
            anyhow::bail!(
                "route {} -> {} is incomplete or not enabled by bridge feature flags",
                args.src_chain,
                args.dest_chain
            );
        }
        log_info!("✔️ 报价轮询已启动 {:?}", outcome);

        let mut ticker = tokio::time::interval(STATUS_TICK);
        let mut last_seen = None;
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    log_info!("⚠️  Received shutdown signal, exiting...");
                    break;
                }
                _ = ticker.tick() => {
                    let state = controller.state().await;
                    let marker = (state.quotes_loading_status, state.quotes_last_fetched, state.quotes_error);
                    if last_seen == Some(marker) {
                        continue;
                    }
                    last_seen = Some(marker);

                    match state.quotes_loading_status {
                        Some(RequestStatus::Fetched) => {
                            for quote in controller.selector().sorted(&state.quotes) {
                                println!(
                                    "{:<20} {} {} -> {} {}",
                                    quote.aggregator_id,
                                    quote.src_asset.symbol,
                                    quote.src_token_amount,
                                    controller.selector().to_amount(std::slice::from_ref(&quote)).unwrap_or_default(),
                                    quote.dest_asset.symbol,
                                );
                            }
                            if args.preview_tx {
                                self.preview_recommended(&controller, &args).await;
                            }
                        }
                        Some(RequestStatus::Error) => {
                            tracing::error!("报价拉取失败: {:?}", state.quotes_error);
                        }
                        _ => continue,
                    }
                    if args.once {
                        break;
                    }
                }
            }
        }

        controller.deactivate().await;
        Ok(())
    }

    async fn preview_recommended(&self, controller: &BridgeController, args: &QuoteArgs) {
        let Some(trade) = controller.recommended_quote().await.and_then(|q| q.trade) else {
            log_warn!("推荐报价没有附带交易");
            return;
        };
        let draft = DraftTransaction::from_trade(&trade, true);
        let flow = SendFlow::new(
            draft,
            self.gas_estimator(),
            Arc::new(DryRunSubmitter::new(args.wallet, args.src_chain)),
            args.src_chain,
            self.config.ethereum.non_standard_chain,
        );
        let rendered = flow
            .preview()
            .map_err(anyhow::Error::from)
            .and_then(|params| serde_json::to_string_pretty(&params).map_err(anyhow::Error::from));
        match rendered {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("交易预览失败: {}", e),
        }
    }

    pub async fn send(self, args: SendArgs) -> anyhow::Result<()> {
        let chain_id = self.config.ethereum.chain_id;
        let flow = SendFlow::new(
            args.to_draft()?,
            self.gas_estimator(),
            Arc::new(DryRunSubmitter::new(args.from, chain_id)),
            chain_id,
            self.config.ethereum.non_standard_chain,
        );
        let handle = flow.confirm().await?;
        println!("{}", serde_json::to_string_pretty(&handle)?);
        Ok(())
    }

    pub async fn balance(self, args: BalanceArgs) -> anyhow::Result<()> {
        let current_chain_id = self.config.ethereum.chain_id;
        let service = BalanceService::new(self.provider.clone(), current_chain_id);
        let balance = service
            .latest_balance(
                args.address,
                args.token.unwrap_or(NATIVE_TOKEN_ADDRESS),
                args.decimals,
                args.chain_id.unwrap_or(current_chain_id),
            )
            .await?;
        println!("{}", balance);
        Ok(())
    }
}
