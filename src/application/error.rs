use crate::domain::error::DomainError;
use crate::domain::port::RepositoryError;

/// 呼び出し側に公開するエラー分類
/// それぞれ別の結果として扱い、互いに読み替えない
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// リクエストの内容が不正（在庫チェック前に拒否）
    Validation,
    /// 指定座席が有効な予約と重複している
    SeatUnavailable,
    /// 上映回・予約が存在しない
    NotFound,
    /// 終端状態などから許可されていない遷移
    InvalidTransition,
    /// 競合による再試行回数の上限に達した（一時的な失敗）
    ConflictRetryExhausted,
    /// 永続化・配信などの内部エラー
    Internal,
}

/// アプリケーション層のエラー型
/// ドメインエラー、リポジトリエラーをラップする
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    /// ドメインエラー（ビジネスルール違反）
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),
    /// リポジトリエラー（永続化の失敗）
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
    /// エンティティが見つからない
    #[error("Not found: {0}")]
    NotFound(String),
    /// 条件付き書き込みの競合が再試行上限を超えて続いた
    #[error("Conflict retry exhausted after {attempts} attempts")]
    ConflictRetryExhausted { attempts: u32 },
    /// イベントバス発行エラー
    #[error("Event publishing failed: {0}")]
    EventPublishingFailed(String),
}

impl ApplicationError {
    /// エラー分類を取得
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplicationError::DomainError(err) if err.is_validation() => ErrorKind::Validation,
            ApplicationError::DomainError(DomainError::SeatUnavailable(_)) => {
                ErrorKind::SeatUnavailable
            }
            ApplicationError::DomainError(_) => ErrorKind::InvalidTransition,
            ApplicationError::NotFound(_) => ErrorKind::NotFound,
            ApplicationError::ConflictRetryExhausted { .. } => ErrorKind::ConflictRetryExhausted,
            ApplicationError::RepositoryError(_) | ApplicationError::EventPublishingFailed(_) => {
                ErrorKind::Internal
            }
        }
    }
}
