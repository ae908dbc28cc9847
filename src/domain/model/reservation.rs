use crate::domain::error::DomainError;
use crate::domain::event::{
    DomainEvent, ReservationCancelled, ReservationCheckedIn, ReservationConfirmed,
};
use crate::domain::model::{
    ContactDetails, HolderId, Money, ReservationId, ReservationStatus, SeatId, ShowtimeId,
    TicketReference,
};
use chrono::{DateTime, Utc};

/// チェックインの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInOutcome {
    /// 今回の呼び出しでチェックインした
    CheckedIn,
    /// 既にチェックイン済み（状態は変化しない）
    AlreadyCheckedIn,
}

/// 予約の変更可能な部分
/// 条件付き更新で書き込み前の状態と比較する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationState {
    pub status: ReservationStatus,
    pub contact: ContactDetails,
}

/// Reservation集約
/// 座席を保持する唯一の可変エンティティ
/// 座席リストは作成後に変更できない
#[derive(Debug, Clone)]
pub struct Reservation {
    id: ReservationId,
    showtime_id: ShowtimeId,
    holder_id: HolderId,
    seats: Vec<SeatId>,
    total_price: Money,
    status: ReservationStatus,
    ticket_reference: TicketReference,
    contact: ContactDetails,
    created_at: DateTime<Utc>,
    checked_in_at: Option<DateTime<Utc>>,
    domain_events: Vec<DomainEvent>,
}

impl Reservation {
    /// 確定済みの予約を作成
    /// 座席の妥当性と空き状況の確認はShowtimeSeatInventoryが行う
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn confirm(
        id: ReservationId,
        showtime_id: ShowtimeId,
        holder_id: HolderId,
        seats: Vec<SeatId>,
        total_price: Money,
        ticket_reference: TicketReference,
        contact: ContactDetails,
        created_at: DateTime<Utc>,
    ) -> Self {
        let event = ReservationConfirmed::new(id, showtime_id, holder_id, seats.clone(), total_price);
        Self {
            id,
            showtime_id,
            holder_id,
            seats,
            total_price,
            status: ReservationStatus::Confirmed,
            ticket_reference,
            contact,
            created_at,
            checked_in_at: None,
            domain_events: vec![DomainEvent::ReservationConfirmed(event)],
        }
    }

    /// データベースから取得したデータで予約を再構築
    /// リポジトリでの使用を想定
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: ReservationId,
        showtime_id: ShowtimeId,
        holder_id: HolderId,
        seats: Vec<SeatId>,
        total_price: Money,
        status: ReservationStatus,
        ticket_reference: TicketReference,
        contact: ContactDetails,
        created_at: DateTime<Utc>,
        checked_in_at: Option<DateTime<Utc>>,
    ) -> Result<Self, DomainError> {
        if seats.is_empty() {
            return Err(DomainError::EmptySeatSelection);
        }
        if status == ReservationStatus::CheckedIn && checked_in_at.is_none() {
            return Err(DomainError::InvalidValue(
                "チェックイン済みの予約にはチェックイン日時が必要です".to_string(),
            ));
        }
        Ok(Self {
            id,
            showtime_id,
            holder_id,
            seats,
            total_price,
            status,
            ticket_reference,
            contact,
            created_at,
            checked_in_at,
            domain_events: Vec::new(),
        })
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }

    pub fn showtime_id(&self) -> ShowtimeId {
        self.showtime_id
    }

    pub fn holder_id(&self) -> HolderId {
        self.holder_id
    }

    /// 予約した座席（指定順）
    pub fn seats(&self) -> &[SeatId] {
        &self.seats
    }

    pub fn total_price(&self) -> Money {
        self.total_price
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn ticket_reference(&self) -> &TicketReference {
        &self.ticket_reference
    }

    pub fn contact(&self) -> &ContactDetails {
        &self.contact
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn checked_in_at(&self) -> Option<DateTime<Utc>> {
        self.checked_in_at
    }

    pub fn state(&self) -> ReservationState {
        ReservationState {
            status: self.status,
            contact: self.contact.clone(),
        }
    }

    /// 座席を保持しているか（キャンセル済みでない）
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// ドメインイベントを取得してクリア
    pub fn take_domain_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.domain_events)
    }

    /// 予約をキャンセル
    /// 事前条件:
    /// - ステータスがConfirmed
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if self.status != ReservationStatus::Confirmed {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: ReservationStatus::Cancelled,
            });
        }

        self.status = ReservationStatus::Cancelled;

        let event = ReservationCancelled::new(self.id, self.showtime_id, self.seats.clone());
        self.domain_events
            .push(DomainEvent::ReservationCancelled(event));

        Ok(())
    }

    /// 予約をチェックイン
    /// 事前条件:
    /// - ステータスがConfirmed（CheckedInの場合は何もしない）
    pub fn check_in(&mut self, at: DateTime<Utc>) -> Result<CheckInOutcome, DomainError> {
        match self.status {
            ReservationStatus::Confirmed => {}
            ReservationStatus::CheckedIn => return Ok(CheckInOutcome::AlreadyCheckedIn),
            ReservationStatus::Cancelled => {
                return Err(DomainError::InvalidTransition {
                    from: self.status,
                    to: ReservationStatus::CheckedIn,
                })
            }
        }

        self.status = ReservationStatus::CheckedIn;
        self.checked_in_at = Some(at);

        let event = ReservationCheckedIn::new(self.id, self.showtime_id, at);
        self.domain_events
            .push(DomainEvent::ReservationCheckedIn(event));

        Ok(CheckInOutcome::CheckedIn)
    }

    /// 連絡先を更新
    /// 指定された項目のみ置き換える
    pub fn update_contact(
        &mut self,
        name: Option<String>,
        phone: Option<String>,
    ) -> Result<(), DomainError> {
        let name = name.or_else(|| self.contact.name().map(str::to_string));
        let phone = phone.or_else(|| self.contact.phone().map(str::to_string));
        self.contact = ContactDetails::new(name, phone)?;
        Ok(())
    }
}
