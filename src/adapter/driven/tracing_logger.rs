use crate::domain::port::Logger;
use std::collections::HashMap;
use uuid::Uuid;

/// 追加コンテキストをキー順の`key=value`形式にまとめる
fn format_context(context: Option<HashMap<String, String>>) -> String {
    let Some(context) = context else {
        return String::new();
    };
    let mut pairs: Vec<(String, String)> = context.into_iter().collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_correlation_id(correlation_id: Option<Uuid>) -> String {
    correlation_id.map(|id| id.to_string()).unwrap_or_default()
}

/// tracingによるログ実装
/// 出力先・フォーマット・レベルの絞り込みはtracing-subscriber側で設定する
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn debug(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        tracing::debug!(
            component,
            correlation_id = %format_correlation_id(correlation_id),
            context = %format_context(context),
            "{}",
            message
        );
    }

    fn info(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        tracing::info!(
            component,
            correlation_id = %format_correlation_id(correlation_id),
            context = %format_context(context),
            "{}",
            message
        );
    }

    fn warn(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        tracing::warn!(
            component,
            correlation_id = %format_correlation_id(correlation_id),
            context = %format_context(context),
            "{}",
            message
        );
    }

    fn error(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        tracing::error!(
            component,
            correlation_id = %format_correlation_id(correlation_id),
            context = %format_context(context),
            "{}",
            message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_context_is_sorted() {
        let mut context = HashMap::new();
        context.insert("seats".to_string(), "A1,A2".to_string());
        context.insert("attempt".to_string(), "2".to_string());

        assert_eq!(format_context(Some(context)), "attempt=2, seats=A1,A2");
        assert_eq!(format_context(None), "");
    }

    #[test]
    fn test_logging_without_subscriber() {
        // サブスクライバー未設定でも出力呼び出しは失敗しない
        let logger = TracingLogger::new();
        logger.info("TestComponent", "message", Some(Uuid::new_v4()), None);
        logger.error("TestComponent", "message", None, Some(HashMap::new()));
    }
}
