// アプリケーション層
// ユースケースを実装し、ドメインと外部ポートを協調させる

pub mod error;
pub mod service;

pub use error::{ApplicationError, ErrorKind};
