use crate::domain::event::DomainEvent;
use async_trait::async_trait;

/// イベントハンドラーエラー
#[derive(Debug, Clone, thiserror::Error)]
pub enum HandlerError {
    #[error("Handler processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Transient error (retryable): {0}")]
    TransientError(String),
    #[error("Permanent error (not retryable): {0}")]
    PermanentError(String),
}

/// イベントハンドラートレイト
/// イベントバスに登録され、対応するイベントを処理する
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// イベントを処理する
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError>;

    /// このハンドラーが処理するイベントか
    fn can_handle(&self, _event: &DomainEvent) -> bool {
        true
    }

    /// ログ出力用のハンドラー名
    fn handler_name(&self) -> &str;
}
