//! 报价拉取生命周期：防抖、定时轮询、按序号丢弃过期响应。
//!
//! 每次提交、每次真正发出的拉取、以及 stop/reset 都会推进同一个序号；
//! 响应只有在其序号仍是最新值时才会写入状态，慢的旧响应永远不会覆盖新结果。
use crate::errors::error::QuoteError;
use crate::models::{Quote, QuoteRequest, QuoteSetState, RequestStatus};
use crate::services::bridge::quote_request_model::QuoteRequestModel;
use crate::services::bridge::traits::QuoteProvider;
use crate::utils::time::now_ms;
use crate::{log_debug, log_info, log_warn};
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, sleep};

pub const DEBOUNCE_MS: u64 = 1000;
pub const REFRESH_INTERVAL_MS: u64 = 30 * 1000;

#[derive(Debug, Clone, Copy)]
pub struct AggregatorSettings {
    /// 输入停止多久后才发起请求
    pub debounce: Duration,
    pub refresh_interval: Duration,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEBOUNCE_MS),
            refresh_interval: Duration::from_millis(REFRESH_INTERVAL_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 请求不完整，未发起网络调用
    Ignored,
    /// 与当前生效请求相同，沿用现有轮询
    Unchanged,
    Scheduled { sequence: u64 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteSnapshot {
    pub request: Option<QuoteRequest>,
    pub quote_set: QuoteSetState,
}

#[derive(Default)]
struct Session {
    request: Option<QuoteRequest>,
    quote_set: QuoteSetState,
    /// 最近一次进入 LOADING 之前的状态
    settled: Option<RequestStatus>,
}

struct Shared {
    providers: Vec<Arc<dyn QuoteProvider>>,
    settings: AggregatorSettings,
    sequence: AtomicU64,
    session: RwLock<Session>,
}

/// 每个会话一个实例，防抖计时器/轮询任务归实例所有
pub struct QuoteAggregator {
    shared: Arc<Shared>,
    model: QuoteRequestModel,
    lifecycle: Mutex<Option<JoinHandle<()>>>,
}

impl QuoteAggregator {
    pub fn new(
        providers: Vec<Arc<dyn QuoteProvider>>,
        model: QuoteRequestModel,
        settings: AggregatorSettings,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                providers,
                settings,
                sequence: AtomicU64::new(0),
                session: RwLock::new(Session::default()),
            }),
            model,
            lifecycle: Mutex::new(None),
        }
    }

    pub async fn submit(&self, request: QuoteRequest) -> SubmitOutcome {
        let mut lifecycle = self.lifecycle.lock().await;

        if !self.model.is_valid(&request) {
            // 请求失效即停止轮询，但不改动已有报价状态
            if let Some(handle) = lifecycle.take() {
                handle.abort();
                log_debug!("报价请求不完整，已取消待执行的拉取");
            }
            return SubmitOutcome::Ignored;
        }

        let running = lifecycle.as_ref().is_some_and(|h| !h.is_finished());
        if running && self.shared.session.read().await.request.as_ref() == Some(&request) {
            return SubmitOutcome::Unchanged;
        }

        if let Some(handle) = lifecycle.take() {
            handle.abort();
            log_debug!("新的报价请求取代了待执行的拉取");
        }
        let sequence = self.shared.next_sequence();
        {
            let mut session = self.shared.session.write().await;
            session.request = Some(request.clone());
            session.settled = None;
            session.quote_set.status = Some(RequestStatus::Loading);
            session.quote_set.quotes.clear();
            session.quote_set.error = None;
        }
        log_debug!("报价请求已排队 seq={}，{:?} 后发起", sequence, self.shared.settings.debounce);

        let shared = Arc::clone(&self.shared);
        *lifecycle = Some(tokio::spawn(async move {
            sleep(shared.settings.debounce).await;
            shared.poll_loop(request).await;
        }));
        SubmitOutcome::Scheduled { sequence }
    }

    /// 跳过防抖，立即按固定间隔轮询当前请求；无有效请求时返回 false
    pub async fn poll(&self) -> bool {
        let mut lifecycle = self.lifecycle.lock().await;
        let request = self.shared.session.read().await.request.clone();
        let Some(request) = request.filter(|r| self.model.is_valid(r)) else {
            return false;
        };
        if let Some(handle) = lifecycle.take() {
            handle.abort();
        }
        let shared = Arc::clone(&self.shared);
        *lifecycle = Some(tokio::spawn(shared.poll_loop(request)));
        true
    }

    /// 流程结束：取消计时器与轮询，在途响应全部作废
    pub async fn stop(&self) {
        if let Some(handle) = self.lifecycle.lock().await.take() {
            handle.abort();
        }
        self.shared.next_sequence();
        log_debug!("报价轮询已停止");
    }

    /// 请求被拒绝（如开关不允许）：停止拉取，LOADING 回退到之前的状态
    pub async fn withdraw(&self) {
        self.stop().await;
        let mut session = self.shared.session.write().await;
        if session.quote_set.status == Some(RequestStatus::Loading) {
            session.quote_set.status = session.settled.take();
            log_debug!("报价请求已撤回，状态回退为 {:?}", session.quote_set.status);
        }
    }

    pub async fn reset(&self) {
        self.stop().await;
        *self.shared.session.write().await = Session::default();
    }

    pub async fn is_polling(&self) -> bool {
        self.lifecycle
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    pub async fn snapshot(&self) -> QuoteSnapshot {
        let session = self.shared.session.read().await;
        QuoteSnapshot {
            request: session.request.clone(),
            quote_set: session.quote_set.clone(),
        }
    }
}

impl Drop for QuoteAggregator {
    fn drop(&mut self) {
        if let Some(handle) = self.lifecycle.get_mut().take() {
            handle.abort();
        }
        self.shared.next_sequence();
    }
}

impl Shared {
    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, sequence: u64) -> bool {
        self.sequence.load(Ordering::SeqCst) == sequence
    }

    async fn poll_loop(self: Arc<Self>, request: QuoteRequest) {
        let period = self.settings.refresh_interval.max(Duration::from_millis(1));
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let sequence = self.next_sequence();
            // 拉取任务不随轮询一起 abort，迟到的响应由序号校验丢弃
            tokio::spawn(Arc::clone(&self).fetch_and_apply(sequence, request.clone()));
        }
    }

    async fn fetch_and_apply(self: Arc<Self>, sequence: u64, request: QuoteRequest) {
        {
            let mut session = self.session.write().await;
            if !self.is_current(sequence) {
                return;
            }
            session.settled = session.quote_set.status.filter(|s| *s != RequestStatus::Loading);
            session.quote_set.status = Some(RequestStatus::Loading);
        }

        let outcome = self.fetch_all(&request).await;

        let mut session = self.session.write().await;
        if !self.is_current(sequence) {
            log_debug!("丢弃过期的报价响应 seq={}", sequence);
            return;
        }
        match outcome {
            Ok(quotes) => {
                log_info!("报价拉取成功 seq={}，共 {} 条", sequence, quotes.len());
                session.quote_set = QuoteSetState {
                    status: Some(RequestStatus::Fetched),
                    quotes,
                    last_fetched_ms: Some(now_ms()),
                    error: None,
                };
            }
            Err(e) => {
                log_warn!("报价拉取失败 seq={}: {}", sequence, e);
                // 保留之前的报价，直到新的有效请求提交
                session.quote_set.status = Some(RequestStatus::Error);
                session.quote_set.error = Some(e.code());
            }
        }
    }

    /// 并发请求所有报价源，结果按到达顺序拼接
    async fn fetch_all(&self, request: &QuoteRequest) -> Result<Vec<Quote>, QuoteError> {
        let mut pending = self
            .providers
            .iter()
            .map(|provider| async move { (provider.name(), provider.fetch_quotes(request).await) })
            .collect::<FuturesUnordered<_>>();

        let mut quotes = Vec::new();
        let mut errors = Vec::new();
        while let Some((name, result)) = pending.next().await {
            match result {
                Ok(mut batch) => quotes.append(&mut batch),
                Err(e) => {
                    log_warn!("报价源 {} 失败: {}", name, e);
                    errors.push(e);
                }
            }
        }

        if quotes.is_empty() {
            Err(classify_failures(&errors))
        } else {
            Ok(quotes)
        }
    }
}

/// 没有任何报价时的错误归类：网络错误优先（可在下轮重试），其次过期，否则无路由
fn classify_failures(errors: &[QuoteError]) -> QuoteError {
    if let Some(network) = errors
        .iter()
        .find(|e| matches!(e, QuoteError::NetworkError(_)))
    {
        return network.clone();
    }
    if errors.contains(&QuoteError::Expired) {
        return QuoteError::Expired;
    }
    QuoteError::NoRoutesAvailable
}
