use crate::domain::port::RepositoryError;

/// データベースエラー型
/// データベース操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatabaseError {
    /// データベース接続エラー
    #[error("Database connection error: {0}")]
    ConnectionError(String),
    /// SQLクエリエラー
    #[error("Database query error: {0}")]
    QueryError(String),
    /// マイグレーションエラー
    #[error("Migration error: {0}")]
    MigrationError(String),
    /// 保存されている値をドメインモデルに変換できない
    #[error("Corrupted row: {0}")]
    CorruptedRow(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => DatabaseError::ConnectionError(err.to_string()),
            other => DatabaseError::QueryError(other.to_string()),
        }
    }
}

impl From<DatabaseError> for RepositoryError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConnectionError(msg) => RepositoryError::ConnectionFailed(msg),
            DatabaseError::QueryError(msg) | DatabaseError::MigrationError(msg) => {
                RepositoryError::OperationFailed(msg)
            }
            DatabaseError::CorruptedRow(msg) => RepositoryError::FetchFailed(msg),
        }
    }
}

/// クエリ失敗を台帳・カタログのエラーに変換する`map_err`用の関数を返す
/// 接続系のエラーは接続エラーのまま扱い、それ以外には失敗した操作名を付ける
pub(crate) fn query_failed(action: &'static str) -> impl FnOnce(sqlx::Error) -> RepositoryError {
    move |e| match DatabaseError::from(e) {
        DatabaseError::QueryError(msg) => {
            DatabaseError::QueryError(format!("{}に失敗しました: {}", action, msg)).into()
        }
        other => other.into(),
    }
}

/// 保存されている値の解析失敗
pub(crate) fn corrupted(what: &str, e: impl std::fmt::Display) -> RepositoryError {
    DatabaseError::CorruptedRow(format!("{}の解析に失敗しました: {}", what, e)).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_to_repository_error() {
        assert_eq!(
            RepositoryError::from(DatabaseError::ConnectionError("x".to_string())),
            RepositoryError::ConnectionFailed("x".to_string())
        );
        assert_eq!(
            RepositoryError::from(DatabaseError::CorruptedRow("seat".to_string())),
            RepositoryError::FetchFailed("seat".to_string())
        );
    }

    #[test]
    fn test_pool_timeout_is_connection_error() {
        let err = DatabaseError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DatabaseError::ConnectionError(_)));
    }

    #[test]
    fn test_query_failed_names_the_action() {
        let err = query_failed("予約の取得")(sqlx::Error::RowNotFound);
        match err {
            RepositoryError::OperationFailed(msg) => assert!(msg.starts_with("予約の取得に失敗しました")),
            other => panic!("unexpected error: {:?}", other),
        }

        let err = query_failed("予約の取得")(sqlx::Error::PoolClosed);
        assert!(matches!(err, RepositoryError::ConnectionFailed(_)));
    }

    #[test]
    fn test_corrupted_is_fetch_failure() {
        let err = corrupted("座席ID", "Z");
        assert_eq!(
            err,
            RepositoryError::FetchFailed("座席IDの解析に失敗しました: Z".to_string())
        );
    }
}
