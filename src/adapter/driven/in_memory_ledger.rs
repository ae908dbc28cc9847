use crate::domain::model::{
    HolderId, Reservation, ReservationId, ReservationState, ShowtimeId, ShowtimeSnapshot,
    ShowtimeVersion,
};
use crate::domain::port::{ConditionalWrite, RepositoryError, ReservationLedger, WriteOutcome};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// 上映回ごとの予約集合
/// 登録順（作成日時の昇順）に保持する
#[derive(Debug, Default)]
struct ShowtimeRecords {
    version: ShowtimeVersion,
    reservations: Vec<Reservation>,
}

fn poisoned<T>(_: PoisonError<T>) -> RepositoryError {
    RepositoryError::OperationFailed("予約台帳のロックが破損しています".to_string())
}

/// 保存用のコピー（未発行のドメインイベントを持たない）
fn stored_copy(reservation: &Reservation) -> Reservation {
    let mut stored = reservation.clone();
    stored.take_domain_events();
    stored
}

/// インメモリ予約台帳
/// 上映回ごとに独立したロックを持ち、異なる上映回の書き込みは互いに待たない
/// ロックはawaitをまたいで保持しない
#[derive(Default)]
pub struct InMemoryReservationLedger {
    showtimes: RwLock<HashMap<ShowtimeId, Arc<Mutex<ShowtimeRecords>>>>,
    index: RwLock<HashMap<ReservationId, ShowtimeId>>,
}

impl InMemoryReservationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(
        &self,
        showtime_id: ShowtimeId,
    ) -> Result<Option<Arc<Mutex<ShowtimeRecords>>>, RepositoryError> {
        let showtimes = self.showtimes.read().map_err(poisoned)?;
        Ok(showtimes.get(&showtime_id).cloned())
    }

    fn records_or_create(
        &self,
        showtime_id: ShowtimeId,
    ) -> Result<Arc<Mutex<ShowtimeRecords>>, RepositoryError> {
        if let Some(records) = self.records(showtime_id)? {
            return Ok(records);
        }
        let mut showtimes = self.showtimes.write().map_err(poisoned)?;
        Ok(showtimes.entry(showtime_id).or_default().clone())
    }

    fn showtime_of(&self, reservation_id: ReservationId) -> Result<Option<ShowtimeId>, RepositoryError> {
        let index = self.index.read().map_err(poisoned)?;
        Ok(index.get(&reservation_id).copied())
    }

    fn lock(records: &Mutex<ShowtimeRecords>) -> Result<MutexGuard<'_, ShowtimeRecords>, RepositoryError> {
        records.lock().map_err(poisoned)
    }

    fn insert(
        &self,
        expected_version: ShowtimeVersion,
        reservation: &Reservation,
    ) -> Result<WriteOutcome, RepositoryError> {
        if self.showtime_of(reservation.id())?.is_some() {
            return Err(RepositoryError::OperationFailed(format!(
                "予約IDが重複しています: {}",
                reservation.id()
            )));
        }

        let records = self.records_or_create(reservation.showtime_id())?;
        let mut records = Self::lock(&records)?;
        if records.version != expected_version {
            return Ok(WriteOutcome::Conflict);
        }

        records.reservations.push(stored_copy(reservation));
        records.version = records.version.next();

        let mut index = self.index.write().map_err(poisoned)?;
        index.insert(reservation.id(), reservation.showtime_id());

        Ok(WriteOutcome::Committed(records.version))
    }

    fn update(
        &self,
        expected: &ReservationState,
        reservation: &Reservation,
    ) -> Result<WriteOutcome, RepositoryError> {
        let Some(showtime_id) = self.showtime_of(reservation.id())? else {
            return Ok(WriteOutcome::Conflict);
        };
        let Some(records) = self.records(showtime_id)? else {
            return Ok(WriteOutcome::Conflict);
        };

        let mut records = Self::lock(&records)?;
        let Some(current) = records
            .reservations
            .iter_mut()
            .find(|r| r.id() == reservation.id())
        else {
            return Ok(WriteOutcome::Conflict);
        };
        if current.state() != *expected {
            return Ok(WriteOutcome::Conflict);
        }

        *current = stored_copy(reservation);
        records.version = records.version.next();
        Ok(WriteOutcome::Committed(records.version))
    }
}

#[async_trait]
impl ReservationLedger for InMemoryReservationLedger {
    async fn get(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Option<Reservation>, RepositoryError> {
        let Some(showtime_id) = self.showtime_of(reservation_id)? else {
            return Ok(None);
        };
        let Some(records) = self.records(showtime_id)? else {
            return Ok(None);
        };
        let records = Self::lock(&records)?;
        Ok(records
            .reservations
            .iter()
            .find(|r| r.id() == reservation_id)
            .cloned())
    }

    async fn list_by_holder(
        &self,
        holder_id: HolderId,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let all: Vec<Arc<Mutex<ShowtimeRecords>>> = {
            let showtimes = self.showtimes.read().map_err(poisoned)?;
            showtimes.values().cloned().collect()
        };

        let mut found = Vec::new();
        for records in all {
            let records = Self::lock(&records)?;
            found.extend(
                records
                    .reservations
                    .iter()
                    .filter(|r| r.holder_id() == holder_id)
                    .cloned(),
            );
        }
        found.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(found)
    }

    async fn list_by_showtime(
        &self,
        showtime_id: ShowtimeId,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let Some(records) = self.records(showtime_id)? else {
            return Ok(Vec::new());
        };
        let mut reservations = Self::lock(&records)?.reservations.clone();
        reservations.sort_by_key(Reservation::created_at);
        Ok(reservations)
    }

    async fn snapshot(&self, showtime_id: ShowtimeId) -> Result<ShowtimeSnapshot, RepositoryError> {
        let Some(records) = self.records(showtime_id)? else {
            return Ok(ShowtimeSnapshot {
                version: ShowtimeVersion::default(),
                active_reservations: Vec::new(),
            });
        };
        let records = Self::lock(&records)?;
        Ok(ShowtimeSnapshot {
            version: records.version,
            active_reservations: records
                .reservations
                .iter()
                .filter(|r| r.is_active())
                .cloned()
                .collect(),
        })
    }

    async fn compare_and_set(
        &self,
        write: ConditionalWrite<'_>,
    ) -> Result<WriteOutcome, RepositoryError> {
        match write {
            ConditionalWrite::Insert {
                expected_version,
                reservation,
            } => self.insert(expected_version, reservation),
            ConditionalWrite::Update {
                expected,
                reservation,
            } => self.update(&expected, reservation),
        }
    }
}
