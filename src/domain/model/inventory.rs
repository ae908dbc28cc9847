use crate::domain::error::DomainError;
use crate::domain::model::{
    ContactDetails, HolderId, Money, Reservation, ReservationId, SeatId, SeatLayout, Showtime,
    TicketReference,
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// 上映回ごとの予約集合の版数
/// 予約の追加・状態変更が確定するたびに1つ進む
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ShowtimeVersion(u64);

impl ShowtimeVersion {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// 次の版数
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ShowtimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// 予約台帳から一貫して読み出した上映回の状態
#[derive(Debug, Clone)]
pub struct ShowtimeSnapshot {
    pub version: ShowtimeVersion,
    /// キャンセルされていない予約
    pub active_reservations: Vec<Reservation>,
}

/// 上映回の座席在庫
/// 座席レイアウトと有効な予約から導出される読み取り専用のビュー
/// 空き状況を別途保存することはしない
#[derive(Debug, Clone)]
pub struct ShowtimeSeatInventory {
    showtime: Showtime,
    layout: SeatLayout,
    version: ShowtimeVersion,
    held: HashMap<SeatId, ReservationId>,
}

impl ShowtimeSeatInventory {
    /// スナップショットから在庫を構築
    /// キャンセル済みの予約が混ざっていても無視する
    pub fn from_snapshot(
        showtime: Showtime,
        layout: SeatLayout,
        snapshot: &ShowtimeSnapshot,
    ) -> Self {
        let held = snapshot
            .active_reservations
            .iter()
            .filter(|reservation| reservation.is_active())
            .flat_map(|reservation| {
                reservation
                    .seats()
                    .iter()
                    .map(move |seat| (seat.clone(), reservation.id()))
            })
            .collect();

        Self {
            showtime,
            layout,
            version: snapshot.version,
            held,
        }
    }

    pub fn showtime(&self) -> &Showtime {
        &self.showtime
    }

    pub fn layout(&self) -> &SeatLayout {
        &self.layout
    }

    /// 構築元のスナップショットの版数
    pub fn version(&self) -> ShowtimeVersion {
        self.version
    }

    /// 空席をレイアウト順に取得
    pub fn available(&self) -> Vec<SeatId> {
        self.layout
            .seats()
            .filter(|seat| !self.held.contains_key(*seat))
            .cloned()
            .collect()
    }

    /// 有効な予約に保持されている座席をレイアウト順に取得
    pub fn held(&self) -> Vec<SeatId> {
        self.layout
            .seats()
            .filter(|seat| self.held.contains_key(*seat))
            .cloned()
            .collect()
    }

    /// 指定座席のうち有効な予約に保持されているもの（指定順）
    pub fn unavailable(&self, seats: &[SeatId]) -> Vec<SeatId> {
        seats
            .iter()
            .filter(|seat| self.held.contains_key(*seat))
            .cloned()
            .collect()
    }

    /// 座席指定を検証する
    /// - 1つ以上
    /// - 重複なし
    /// - すべてレイアウトに存在する
    pub fn validate_selection(&self, seats: &[SeatId]) -> Result<(), DomainError> {
        if seats.is_empty() {
            return Err(DomainError::EmptySeatSelection);
        }

        let mut seen = HashSet::with_capacity(seats.len());
        for seat in seats {
            if !self.layout.contains(seat) {
                return Err(DomainError::InvalidSeat(seat.to_string()));
            }
            if !seen.insert(seat) {
                return Err(DomainError::DuplicateSeat(seat.clone()));
            }
        }

        Ok(())
    }

    /// 座席を確保した新しい予約を作成する
    /// この在庫が表す版数の時点で座席が空いている場合のみ成功する
    /// 実際の確定は台帳への条件付き書き込みで行う
    #[allow(clippy::too_many_arguments)]
    pub fn claim(
        &self,
        reservation_id: ReservationId,
        holder_id: HolderId,
        seats: Vec<SeatId>,
        total_price: Money,
        ticket_reference: TicketReference,
        contact: ContactDetails,
        now: DateTime<Utc>,
    ) -> Result<Reservation, DomainError> {
        self.validate_selection(&seats)?;

        let taken = self.unavailable(&seats);
        if !taken.is_empty() {
            return Err(DomainError::SeatUnavailable(taken));
        }

        Ok(Reservation::confirm(
            reservation_id,
            self.showtime.id(),
            holder_id,
            seats,
            total_price,
            ticket_reference,
            contact,
            now,
        ))
    }
}
