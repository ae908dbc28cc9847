// イベントハンドラー
// 予約台帳への書き込みが確定した後の副作用を扱う

use crate::domain::event::DomainEvent;
use crate::domain::event_bus::{EventHandler, HandlerError};
use crate::domain::model::SeatId;
use crate::domain::port::Logger;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// 予約アクティビティハンドラー
/// 予約の確定・キャンセル・チェックインを構造化ログとして記録する
pub struct ReservationActivityHandler {
    logger: Arc<dyn Logger>,
}

impl ReservationActivityHandler {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

fn join_seats(seats: &[SeatId]) -> String {
    seats
        .iter()
        .map(SeatId::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl EventHandler for ReservationActivityHandler {
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        let mut context = HashMap::new();
        context.insert("reservation_id".to_string(), event.reservation_id().to_string());
        context.insert("showtime_id".to_string(), event.showtime_id().to_string());

        let message = match event {
            DomainEvent::ReservationConfirmed(e) => {
                context.insert("holder_id".to_string(), e.holder_id.to_string());
                context.insert("seats".to_string(), join_seats(&e.seats));
                context.insert("total_price".to_string(), e.total_price.amount().to_string());
                "予約が確定しました"
            }
            DomainEvent::ReservationCancelled(e) => {
                context.insert("released_seats".to_string(), join_seats(&e.released_seats));
                "予約がキャンセルされ座席が解放されました"
            }
            DomainEvent::ReservationCheckedIn(e) => {
                context.insert("checked_in_at".to_string(), e.checked_in_at.to_rfc3339());
                "予約がチェックインされました"
            }
        };

        self.logger.info(
            self.handler_name(),
            message,
            Some(event.event_id()),
            Some(context),
        );
        Ok(())
    }

    fn handler_name(&self) -> &str {
        "ReservationActivityHandler"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::ReservationCancelled;
    use crate::domain::model::{ReservationId, ShowtimeId};
    use std::sync::Mutex;
    use uuid::Uuid;

    // テスト用のロガー（出力内容を記録する）
    #[derive(Default)]
    struct RecordingLogger {
        entries: Mutex<Vec<(String, HashMap<String, String>)>>,
    }

    impl Logger for RecordingLogger {
        fn debug(&self, _: &str, _: &str, _: Option<Uuid>, _: Option<HashMap<String, String>>) {}

        fn info(
            &self,
            _component: &str,
            message: &str,
            _correlation_id: Option<Uuid>,
            context: Option<HashMap<String, String>>,
        ) {
            self.entries
                .lock()
                .unwrap()
                .push((message.to_string(), context.unwrap_or_default()));
        }

        fn warn(&self, _: &str, _: &str, _: Option<Uuid>, _: Option<HashMap<String, String>>) {}

        fn error(&self, _: &str, _: &str, _: Option<Uuid>, _: Option<HashMap<String, String>>) {}
    }

    #[tokio::test]
    async fn test_cancelled_event_logs_released_seats() {
        let logger = Arc::new(RecordingLogger::default());
        let handler = ReservationActivityHandler::new(logger.clone());

        let event = DomainEvent::ReservationCancelled(ReservationCancelled::new(
            ReservationId::new(),
            ShowtimeId::new(),
            vec![SeatId::parse("A1").unwrap(), SeatId::parse("A2").unwrap()],
        ));

        handler.handle(&event).await.unwrap();

        let entries = logger.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].1.get("released_seats").map(String::as_str),
            Some("A1,A2")
        );
    }
}
