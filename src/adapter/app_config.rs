use crate::adapter::database_config::{env_or, ConfigError};
use crate::application::service::DEFAULT_MAX_ATTEMPTS;
use std::env;
use std::fmt;
use std::str::FromStr;

/// 開発用のチケット署名鍵（TICKET_SECRET未設定時）
const DEVELOPMENT_TICKET_SECRET: &str = "development-ticket-secret";

/// 予約台帳・カタログの保存先
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    MySql,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(StorageBackend::MySql),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown backend '{}' (expected mysql or memory)", other)),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::MySql => write!(f, "mysql"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

/// 真偽値の環境変数（true/false/1/0/yes/no）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Flag(bool);

impl FromStr for Flag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Flag(true)),
            "false" | "0" | "no" | "" => Ok(Flag(false)),
            other => Err(format!("'{}' is not a boolean", other)),
        }
    }
}

/// アプリケーション設定
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub storage_backend: StorageBackend,
    /// 条件付き書き込みの最大試行回数（1以上）
    pub reserve_max_attempts: u32,
    pub ticket_secret: String,
    pub seed_on_start: bool,
}

impl AppConfig {
    /// 環境変数から設定を読み取る
    /// 環境変数が設定されていない場合はデフォルト値を使用
    pub fn from_env() -> Result<Self, ConfigError> {
        let reserve_max_attempts: u32 = env_or("RESERVE_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?;
        if reserve_max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "RESERVE_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        let ticket_secret = match env::var("TICKET_SECRET") {
            Ok(secret) if secret.trim().is_empty() => {
                return Err(ConfigError::InvalidValue(
                    "TICKET_SECRET must not be empty".to_string(),
                ))
            }
            Ok(secret) => secret,
            Err(_) => DEVELOPMENT_TICKET_SECRET.to_string(),
        };

        Ok(Self {
            server_port: env_or("SERVER_PORT", 3000)?,
            storage_backend: env_or("STORAGE_BACKEND", StorageBackend::MySql)?,
            reserve_max_attempts,
            ticket_secret,
            seed_on_start: env_or("SEED_ON_START", Flag(false))?.0,
        })
    }

    /// 開発用の署名鍵を使っているか
    pub fn uses_development_secret(&self) -> bool {
        self.ticket_secret == DEVELOPMENT_TICKET_SECRET
    }
}

// テスト間の環境変数の競合を防ぐためのロック
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&str; 5] = [
        "SERVER_PORT",
        "STORAGE_BACKEND",
        "RESERVE_MAX_ATTEMPTS",
        "TICKET_SECRET",
        "SEED_ON_START",
    ];

    fn clear() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_from_env_with_defaults() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear();

        let config = AppConfig::from_env().unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.storage_backend, StorageBackend::MySql);
        assert_eq!(config.reserve_max_attempts, 5);
        assert!(config.uses_development_secret());
        assert!(!config.seed_on_start);
    }

    #[test]
    fn test_from_env_with_all_variables() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear();
        env::set_var("SERVER_PORT", "8080");
        env::set_var("STORAGE_BACKEND", "Memory");
        env::set_var("RESERVE_MAX_ATTEMPTS", "3");
        env::set_var("TICKET_SECRET", "s3cr3t");
        env::set_var("SEED_ON_START", "true");

        let config = AppConfig::from_env().unwrap();
        clear();

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.reserve_max_attempts, 3);
        assert_eq!(config.ticket_secret, "s3cr3t");
        assert!(config.seed_on_start);
    }

    #[test]
    fn test_invalid_values_fail() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        let cases = [
            ("RESERVE_MAX_ATTEMPTS", "0"),
            ("RESERVE_MAX_ATTEMPTS", "many"),
            ("STORAGE_BACKEND", "postgres"),
            ("TICKET_SECRET", "  "),
            ("SEED_ON_START", "maybe"),
            ("SERVER_PORT", "70000"),
        ];
        for (key, value) in cases {
            clear();
            env::set_var(key, value);
            let result = AppConfig::from_env();
            assert!(
                matches!(result, Err(ConfigError::InvalidValue(_))),
                "{}={}",
                key,
                value
            );
        }
        clear();
    }
}
