use crate::domain::model::{HolderId, Money, ReservationId, SeatId, ShowtimeId};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// ドメインイベント列挙型
/// 予約のライフサイクル上の重要な出来事を表現する
/// 台帳への条件付き書き込みが成功した後にのみ発行される
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// 予約が確定された
    ReservationConfirmed(ReservationConfirmed),
    /// 予約がキャンセルされ、座席が解放された
    ReservationCancelled(ReservationCancelled),
    /// 予約がチェックインされた
    ReservationCheckedIn(ReservationCheckedIn),
}

impl DomainEvent {
    /// イベント種別名
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::ReservationConfirmed(_) => "ReservationConfirmed",
            DomainEvent::ReservationCancelled(_) => "ReservationCancelled",
            DomainEvent::ReservationCheckedIn(_) => "ReservationCheckedIn",
        }
    }

    /// イベントID
    pub fn event_id(&self) -> Uuid {
        match self {
            DomainEvent::ReservationConfirmed(e) => e.event_id,
            DomainEvent::ReservationCancelled(e) => e.event_id,
            DomainEvent::ReservationCheckedIn(e) => e.event_id,
        }
    }

    /// 対象の予約ID
    pub fn reservation_id(&self) -> ReservationId {
        match self {
            DomainEvent::ReservationConfirmed(e) => e.reservation_id,
            DomainEvent::ReservationCancelled(e) => e.reservation_id,
            DomainEvent::ReservationCheckedIn(e) => e.reservation_id,
        }
    }

    /// 対象の上映回ID
    pub fn showtime_id(&self) -> ShowtimeId {
        match self {
            DomainEvent::ReservationConfirmed(e) => e.showtime_id,
            DomainEvent::ReservationCancelled(e) => e.showtime_id,
            DomainEvent::ReservationCheckedIn(e) => e.showtime_id,
        }
    }
}

/// 予約確定イベント
#[derive(Debug, Clone)]
pub struct ReservationConfirmed {
    pub event_id: Uuid,
    pub reservation_id: ReservationId,
    pub showtime_id: ShowtimeId,
    pub holder_id: HolderId,
    /// 確保された座席
    pub seats: Vec<SeatId>,
    pub total_price: Money,
    pub occurred_at: DateTime<Utc>,
}

impl ReservationConfirmed {
    pub fn new(
        reservation_id: ReservationId,
        showtime_id: ShowtimeId,
        holder_id: HolderId,
        seats: Vec<SeatId>,
        total_price: Money,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            reservation_id,
            showtime_id,
            holder_id,
            seats,
            total_price,
            occurred_at: Utc::now(),
        }
    }
}

/// 予約キャンセルイベント
#[derive(Debug, Clone)]
pub struct ReservationCancelled {
    pub event_id: Uuid,
    pub reservation_id: ReservationId,
    pub showtime_id: ShowtimeId,
    /// 再び予約可能になった座席
    pub released_seats: Vec<SeatId>,
    pub occurred_at: DateTime<Utc>,
}

impl ReservationCancelled {
    pub fn new(
        reservation_id: ReservationId,
        showtime_id: ShowtimeId,
        released_seats: Vec<SeatId>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            reservation_id,
            showtime_id,
            released_seats,
            occurred_at: Utc::now(),
        }
    }
}

/// チェックインイベント
#[derive(Debug, Clone)]
pub struct ReservationCheckedIn {
    pub event_id: Uuid,
    pub reservation_id: ReservationId,
    pub showtime_id: ShowtimeId,
    pub checked_in_at: DateTime<Utc>,
}

impl ReservationCheckedIn {
    pub fn new(
        reservation_id: ReservationId,
        showtime_id: ShowtimeId,
        checked_in_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            reservation_id,
            showtime_id,
            checked_in_at,
        }
    }
}
