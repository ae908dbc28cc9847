use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::event::DomainEvent;
use crate::domain::model::{
    CheckInOutcome, ContactDetails, HolderId, Money, Reservation, ReservationId,
    ReservationStatus, SeatId, SeatLayout, Showtime, ShowtimeId, ShowtimeSeatInventory,
    TicketReference,
};
use crate::domain::port::{
    Catalog, ConditionalWrite, EventBus, Logger, ReservationLedger, TicketEncoder, WriteOutcome,
};
use chrono::{DateTime, SubsecRound, Utc};
use std::collections::HashMap;
use std::sync::Arc;

mod reservation_query_service;

pub use reservation_query_service::ReservationQueryService;

/// 条件付き書き込みの既定の試行回数
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

const COMPONENT: &str = "ReservationApplicationService";

/// 現在時刻を保存先の精度（マイクロ秒）に切り詰める
/// 返した値と読み直した値が一致するようにする
fn current_time() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// 座席予約コマンド
#[derive(Debug, Clone)]
pub struct ReserveCommand {
    pub showtime_id: ShowtimeId,
    pub holder_id: HolderId,
    /// 指定順を保持する
    pub seats: Vec<SeatId>,
    pub total_price: Money,
    pub contact: ContactDetails,
}

/// 上映回と座席レイアウトを取得する
/// どちらかが存在しない場合はNotFound
pub(crate) async fn load_showtime(
    catalog: &dyn Catalog,
    showtime_id: ShowtimeId,
) -> Result<(Showtime, SeatLayout), ApplicationError> {
    let showtime = catalog
        .find_showtime(showtime_id)
        .await?
        .ok_or_else(|| {
            ApplicationError::NotFound(format!("上映回が見つかりません: {}", showtime_id))
        })?;
    let layout = catalog
        .venue_seat_layout(showtime.venue_id())
        .await?
        .ok_or_else(|| {
            ApplicationError::NotFound(format!(
                "座席レイアウトが見つかりません: {}",
                showtime.venue_id()
            ))
        })?;
    Ok((showtime, layout))
}

fn seat_list(seats: &[SeatId]) -> String {
    seats
        .iter()
        .map(SeatId::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

/// 予約アプリケーションサービス
/// 上映回の予約集合に書き込む唯一の経路
///
/// 書き込みはすべて予約台帳の条件付き書き込みで確定する
/// 競合した場合はスナップショットを読み直して判定からやり直す
pub struct ReservationApplicationService {
    ledger: Arc<dyn ReservationLedger>,
    catalog: Arc<dyn Catalog>,
    ticket_encoder: Arc<dyn TicketEncoder>,
    event_bus: Arc<dyn EventBus>,
    logger: Arc<dyn Logger>,
    max_attempts: u32,
}

impl ReservationApplicationService {
    /// 新しいアプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `ledger` - 予約台帳
    /// * `catalog` - 上映回・座席レイアウトのカタログ
    /// * `ticket_encoder` - チケットエンコーダー
    /// * `event_bus` - イベントバス
    /// * `logger` - ロガー
    pub fn new(
        ledger: Arc<dyn ReservationLedger>,
        catalog: Arc<dyn Catalog>,
        ticket_encoder: Arc<dyn TicketEncoder>,
        event_bus: Arc<dyn EventBus>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            ledger,
            catalog,
            ticket_encoder,
            event_bus,
            logger,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// 競合時の試行回数を設定（最低1回）
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// 座席を予約する
    ///
    /// # Arguments
    /// * `command` - 上映回、予約者、座席、合計金額、連絡先
    ///
    /// # Returns
    /// * `Ok((Reservation, TicketReference))` - 確定した予約とチケット参照
    /// * `Err(ApplicationError)` - 検証エラー、座席の重複、競合の上限到達など
    pub async fn reserve(
        &self,
        command: ReserveCommand,
    ) -> Result<(Reservation, TicketReference), ApplicationError> {
        let (showtime, layout) = load_showtime(self.catalog.as_ref(), command.showtime_id).await?;

        let reservation_id = self.ledger.next_identity();
        let ticket_reference = self.ticket_encoder.encode(reservation_id);

        for attempt in 1..=self.max_attempts {
            let snapshot = self.ledger.snapshot(command.showtime_id).await?;
            let inventory =
                ShowtimeSeatInventory::from_snapshot(showtime.clone(), layout.clone(), &snapshot);

            let claimed = inventory.claim(
                reservation_id,
                command.holder_id,
                command.seats.clone(),
                command.total_price,
                ticket_reference.clone(),
                command.contact.clone(),
                current_time(),
            );
            let mut reservation = match claimed {
                Ok(reservation) => reservation,
                Err(err) => {
                    if let DomainError::SeatUnavailable(ref taken) = err {
                        let mut context = HashMap::new();
                        context.insert("showtime_id".to_string(), command.showtime_id.to_string());
                        context.insert("seats".to_string(), seat_list(taken));
                        self.logger
                            .info(COMPONENT, "座席が既に予約されています", None, Some(context));
                    }
                    return Err(err.into());
                }
            };

            let events = reservation.take_domain_events();
            let write = ConditionalWrite::Insert {
                expected_version: inventory.version(),
                reservation: &reservation,
            };
            match self.ledger.compare_and_set(write).await? {
                WriteOutcome::Committed(version) => {
                    let mut context = HashMap::new();
                    context.insert("showtime_id".to_string(), command.showtime_id.to_string());
                    context.insert("seats".to_string(), seat_list(reservation.seats()));
                    context.insert("version".to_string(), version.to_string());
                    context.insert("attempt".to_string(), attempt.to_string());
                    self.logger.info(
                        COMPONENT,
                        "座席の予約が確定しました",
                        Some(reservation_id.as_uuid()),
                        Some(context),
                    );

                    self.publish_events(events).await;
                    return Ok((reservation, ticket_reference));
                }
                WriteOutcome::Conflict => {
                    let mut context = HashMap::new();
                    context.insert("showtime_id".to_string(), command.showtime_id.to_string());
                    context.insert("expected_version".to_string(), inventory.version().to_string());
                    context.insert("attempt".to_string(), attempt.to_string());
                    self.logger.debug(
                        COMPONENT,
                        "上映回の版数が変わったため再試行します",
                        Some(reservation_id.as_uuid()),
                        Some(context),
                    );
                }
            }
        }

        self.exhausted(command.showtime_id.to_string())
    }

    /// 予約をキャンセルする
    /// キャンセルされた座席はすぐに再予約できる
    ///
    /// # Returns
    /// * `Ok(Reservation)` - キャンセル後の予約
    /// * `Err(ApplicationError)` - 予約が存在しない、Confirmed以外からの遷移など
    pub async fn cancel(&self, reservation_id: ReservationId) -> Result<Reservation, ApplicationError> {
        self.modify(reservation_id, "予約をキャンセルしました", |reservation| {
            reservation.cancel()?;
            Ok(true)
        })
        .await
    }

    /// 予約をチェックインする
    /// チェックイン済みの予約は変更せずにそのまま返す
    pub async fn check_in(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Reservation, ApplicationError> {
        let now = current_time();
        self.modify(reservation_id, "予約をチェックインしました", |reservation| {
            Ok(reservation.check_in(now)? == CheckInOutcome::CheckedIn)
        })
        .await
    }

    /// スキャンしたチケット参照でチェックインする
    /// 署名が一致しない参照は検証エラー
    pub async fn check_in_by_ticket(
        &self,
        reference: &TicketReference,
    ) -> Result<Reservation, ApplicationError> {
        let reservation_id = self.ticket_encoder.decode(reference).ok_or_else(|| {
            DomainError::InvalidValue(format!("無効なチケット参照です: {}", reference))
        })?;
        self.check_in(reservation_id).await
    }

    /// 予約の連絡先を更新する
    /// 座席・ステータス・金額は変更しない
    pub async fn update_contact(
        &self,
        reservation_id: ReservationId,
        name: Option<String>,
        phone: Option<String>,
    ) -> Result<Reservation, ApplicationError> {
        self.modify(reservation_id, "連絡先を更新しました", |reservation| {
            reservation.update_contact(name.clone(), phone.clone())?;
            Ok(true)
        })
        .await
    }

    /// チケット参照を再発行する
    /// 確定済み（Confirmed）の予約のみ
    pub async fn issue_ticket(
        &self,
        reservation_id: ReservationId,
    ) -> Result<TicketReference, ApplicationError> {
        let reservation = self.find(reservation_id).await?;
        if reservation.status() != ReservationStatus::Confirmed {
            return Err(DomainError::InvalidTransition {
                from: reservation.status(),
                to: ReservationStatus::Confirmed,
            }
            .into());
        }
        Ok(self.ticket_encoder.encode(reservation_id))
    }

    async fn find(&self, reservation_id: ReservationId) -> Result<Reservation, ApplicationError> {
        self.ledger.get(reservation_id).await?.ok_or_else(|| {
            ApplicationError::NotFound(format!("予約が見つかりません: {}", reservation_id))
        })
    }

    /// 既存の予約を変更して条件付きで書き戻す
    /// `apply`がfalseを返した場合は状態が変わっていないので書き込まない
    async fn modify<F>(
        &self,
        reservation_id: ReservationId,
        message: &str,
        mut apply: F,
    ) -> Result<Reservation, ApplicationError>
    where
        F: FnMut(&mut Reservation) -> Result<bool, DomainError>,
    {
        for attempt in 1..=self.max_attempts {
            let mut reservation = self.find(reservation_id).await?;
            let expected = reservation.state();

            if !apply(&mut reservation)? {
                return Ok(reservation);
            }
            let events = reservation.take_domain_events();

            let write = ConditionalWrite::Update {
                expected: expected.clone(),
                reservation: &reservation,
            };
            match self.ledger.compare_and_set(write).await? {
                WriteOutcome::Committed(version) => {
                    let mut context = HashMap::new();
                    context.insert("showtime_id".to_string(), reservation.showtime_id().to_string());
                    context.insert("status".to_string(), reservation.status().to_string());
                    context.insert("version".to_string(), version.to_string());
                    self.logger.info(
                        COMPONENT,
                        message,
                        Some(reservation_id.as_uuid()),
                        Some(context),
                    );

                    self.publish_events(events).await;
                    return Ok(reservation);
                }
                WriteOutcome::Conflict => {
                    let mut context = HashMap::new();
                    context.insert("expected_status".to_string(), expected.status.to_string());
                    context.insert("attempt".to_string(), attempt.to_string());
                    self.logger.debug(
                        COMPONENT,
                        "予約が読み取り後に変更されたため再試行します",
                        Some(reservation_id.as_uuid()),
                        Some(context),
                    );
                }
            }
        }

        self.exhausted(reservation_id.to_string())
    }

    fn exhausted<T>(&self, target: String) -> Result<T, ApplicationError> {
        let mut context = HashMap::new();
        context.insert("target".to_string(), target);
        context.insert("attempts".to_string(), self.max_attempts.to_string());
        self.logger.warn(
            COMPONENT,
            "競合が続いたため再試行を打ち切りました",
            None,
            Some(context),
        );
        Err(ApplicationError::ConflictRetryExhausted {
            attempts: self.max_attempts,
        })
    }

    /// 確定後のイベントを発行する
    /// 発行に失敗しても確定済みの操作は失敗にしない
    async fn publish_events(&self, events: Vec<DomainEvent>) {
        for event in events {
            let event_id = event.event_id();
            let event_type = event.event_type();
            if let Err(e) = self.event_bus.publish(event).await {
                let error = ApplicationError::EventPublishingFailed(e.to_string());
                let mut context = HashMap::new();
                context.insert("event_type".to_string(), event_type.to_string());
                context.insert("error".to_string(), error.to_string());
                self.logger.warn(
                    COMPONENT,
                    "イベントの発行に失敗しました",
                    Some(event_id),
                    Some(context),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_current_time_has_microsecond_precision() {
        for _ in 0..100 {
            assert_eq!(current_time().nanosecond() % 1_000, 0);
        }
    }
}
