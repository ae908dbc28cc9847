use crate::domain::event::DomainEvent;
use crate::domain::event_bus::{EventHandler, HandlerError};
use crate::domain::port::{EventBus, EventBusError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{mpsc, Mutex, RwLock};

/// デッドレターキューエントリ
/// リトライしても処理できなかったイベント
#[derive(Debug, Clone)]
pub struct DeadLetterEntry {
    pub event: DomainEvent,
    pub handler_name: String,
    pub error: String,
    pub attempt_count: u32,
    pub is_retryable: bool,
    pub added_at: SystemTime,
}

/// イベントバス設定
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// 最大試行回数
    pub max_retry_attempts: u32,
    /// リトライ間隔
    pub retry_delay: Duration,
    /// デッドレターキューの最大サイズ
    pub dead_letter_queue_max_size: usize,
    /// ハンドラータイムアウト
    pub handler_timeout: Duration,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: 3,
            retry_delay: Duration::from_millis(200),
            dead_letter_queue_max_size: 1000,
            handler_timeout: Duration::from_secs(5),
        }
    }
}

/// インメモリイベントバス実装
/// 登録順にハンドラーへ配信し、失敗したものはデッドレターキューに残す
#[derive(Clone)]
pub struct InMemoryEventBus {
    handlers: Arc<RwLock<Vec<Arc<dyn EventHandler>>>>,
    dead_letter_queue: Arc<Mutex<VecDeque<DeadLetterEntry>>>,
    config: EventBusConfig,
}

impl InMemoryEventBus {
    /// 設定を指定してインメモリイベントバスを作成
    ///
    /// # 例
    /// ```
    /// use cinema_seat_reservation::adapter::driven::{EventBusConfig, InMemoryEventBus};
    ///
    /// let config = EventBusConfig {
    ///     max_retry_attempts: 5,
    ///     retry_delay: std::time::Duration::from_millis(50),
    ///     ..EventBusConfig::default()
    /// };
    /// let event_bus = InMemoryEventBus::new(config);
    /// ```
    pub fn new(config: EventBusConfig) -> Self {
        Self {
            handlers: Arc::new(RwLock::new(Vec::new())),
            dead_letter_queue: Arc::new(Mutex::new(VecDeque::new())),
            config,
        }
    }

    /// ハンドラーを登録
    pub async fn subscribe<H>(&self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.write().await.push(Arc::new(handler));
    }

    /// デッドレターキューの内容を取得
    pub async fn dead_letters(&self) -> Vec<DeadLetterEntry> {
        self.dead_letter_queue.lock().await.iter().cloned().collect()
    }

    /// ハンドラーの実行（タイムアウトとリトライ付き）
    async fn execute_handler_with_retry(
        &self,
        handler: &dyn EventHandler,
        event: &DomainEvent,
    ) -> Result<(), (HandlerError, u32)> {
        let mut attempts = 0;
        let mut last_error = HandlerError::ProcessingFailed("not executed".to_string());

        while attempts < self.config.max_retry_attempts {
            attempts += 1;

            match tokio::time::timeout(self.config.handler_timeout, handler.handle(event)).await {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(HandlerError::PermanentError(msg))) => {
                    return Err((HandlerError::PermanentError(msg), attempts));
                }
                Ok(Err(handler_error)) => last_error = handler_error,
                Err(_) => {
                    last_error = HandlerError::TransientError("Handler timeout".to_string());
                }
            }

            if attempts < self.config.max_retry_attempts {
                tracing::debug!(
                    handler = handler.handler_name(),
                    attempt = attempts,
                    error = %last_error,
                    "retrying event handler"
                );
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        Err((last_error, attempts))
    }

    /// 失敗したイベントをデッドレターキューに追加
    async fn add_to_dead_letter_queue(
        &self,
        event: &DomainEvent,
        handler_name: &str,
        error: &HandlerError,
        attempt_count: u32,
    ) {
        let mut dlq = self.dead_letter_queue.lock().await;
        if dlq.len() >= self.config.dead_letter_queue_max_size {
            dlq.pop_front();
        }
        dlq.push_back(DeadLetterEntry {
            event: event.clone(),
            handler_name: handler_name.to_string(),
            error: error.to_string(),
            attempt_count,
            is_retryable: !matches!(error, HandlerError::PermanentError(_)),
            added_at: SystemTime::now(),
        });
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError> {
        let handlers: Vec<Arc<dyn EventHandler>> = self
            .handlers
            .read()
            .await
            .iter()
            .filter(|handler| handler.can_handle(&event))
            .cloned()
            .collect();

        for handler in handlers {
            if let Err((error, attempts)) =
                self.execute_handler_with_retry(handler.as_ref(), &event).await
            {
                tracing::warn!(
                    handler = handler.handler_name(),
                    event_type = event.event_type(),
                    event_id = %event.event_id(),
                    attempts,
                    error = %error,
                    "event handler failed; moved to dead letter queue"
                );
                self.add_to_dead_letter_queue(&event, handler.handler_name(), &error, attempts)
                    .await;
            }
        }

        Ok(())
    }
}

/// バックグラウンド配信のイベントバス
/// 発行はキューに積むだけで、単一のワーカーが発行順に内側のバスへ配信する
/// 遅いハンドラーがあっても発行元の応答は待たされない
pub struct QueuedEventBus {
    sender: mpsc::UnboundedSender<DomainEvent>,
}

impl QueuedEventBus {
    /// 配信ワーカーを起動する（tokioランタイム内で呼び出すこと）
    /// 全ての送信側が破棄されるとワーカーは残りを配信してから終了する
    pub fn spawn(inner: Arc<dyn EventBus>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<DomainEvent>();
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                let event_id = event.event_id();
                let event_type = event.event_type();
                if let Err(e) = inner.publish(event).await {
                    tracing::warn!(event_type, %event_id, error = %e, "background delivery failed");
                }
            }
            tracing::debug!("event delivery worker stopped");
        });
        Self { sender }
    }
}

#[async_trait]
impl EventBus for QueuedEventBus {
    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError> {
        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishingFailed(format!("delivery worker stopped: {}", e)))
    }
}
