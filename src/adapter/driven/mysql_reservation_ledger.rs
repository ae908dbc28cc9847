use crate::adapter::database_error::{corrupted, query_failed, DatabaseError};
use crate::domain::model::{
    ContactDetails, HolderId, Money, Reservation, ReservationId, ReservationState,
    ReservationStatus, SeatId, ShowtimeId, ShowtimeSnapshot, ShowtimeVersion, TicketReference,
};
use crate::domain::port::{ConditionalWrite, RepositoryError, ReservationLedger, WriteOutcome};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row, Transaction};

/// 予約と座席をJOINして取得するSELECT句
const SELECT_RESERVATIONS: &str = r#"
    SELECT
        r.id, r.showtime_id, r.holder_id, r.total_price, r.currency, r.status,
        r.ticket_reference, r.contact_name, r.contact_phone, r.created_at, r.checked_in_at,
        s.seat_id
    FROM reservations r
    LEFT JOIN reservation_seats s ON r.id = s.reservation_id
"#;

/// JOINした行から予約を再構築する
/// 行は予約ごとに連続し、座席は登録順に並んでいる前提
fn build_reservations(rows: &[MySqlRow]) -> Result<Vec<Reservation>, RepositoryError> {
    let mut groups: Vec<(String, Vec<&MySqlRow>)> = Vec::new();
    for row in rows {
        let id: String = row.get("id");
        match groups.last_mut() {
            Some((last_id, group)) if *last_id == id => group.push(row),
            _ => groups.push((id, vec![row])),
        }
    }

    groups
        .into_iter()
        .map(|(id, group)| build_reservation(&id, &group))
        .collect()
}

fn build_reservation(id: &str, rows: &[&MySqlRow]) -> Result<Reservation, RepositoryError> {
    let first = rows[0];

    let reservation_id = ReservationId::from_string(id).map_err(|e| corrupted("予約ID", e))?;
    let showtime_id = ShowtimeId::from_string(first.get("showtime_id"))
        .map_err(|e| corrupted("上映回ID", e))?;
    let holder_id =
        HolderId::from_string(first.get("holder_id")).map_err(|e| corrupted("予約者ID", e))?;
    let total_price = Money::new(first.get("total_price"), first.get("currency"))
        .map_err(|e| corrupted("金額", e))?;
    let status =
        ReservationStatus::from_string(first.get("status")).map_err(|e| corrupted("ステータス", e))?;
    let contact = ContactDetails::new(first.get("contact_name"), first.get("contact_phone"))
        .map_err(|e| corrupted("連絡先", e))?;
    let created_at: NaiveDateTime = first.get("created_at");
    let checked_in_at: Option<NaiveDateTime> = first.get("checked_in_at");

    let mut seats = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(seat) = row.get::<Option<String>, _>("seat_id") {
            seats.push(SeatId::parse(&seat).map_err(|e| corrupted("座席ID", e))?);
        }
    }

    Reservation::reconstruct(
        reservation_id,
        showtime_id,
        holder_id,
        seats,
        total_price,
        status,
        TicketReference::new(first.get("ticket_reference")),
        contact,
        created_at.and_utc(),
        checked_in_at.map(|at| at.and_utc()),
    )
    .map_err(|e| corrupted("予約集約", e))
}

/// MySQL予約台帳
/// showtimes.versionを上映回の版数として条件付き書き込みに使う
pub struct MySqlReservationLedger {
    pool: Pool<MySql>,
}

impl MySqlReservationLedger {
    /// 新しいMySQL予約台帳を作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'_, MySql>, RepositoryError> {
        self.pool.begin().await.map_err(|e| {
            DatabaseError::ConnectionError(format!("トランザクション開始に失敗しました: {}", e))
                .into()
        })
    }

    async fn commit(tx: Transaction<'_, MySql>) -> Result<(), RepositoryError> {
        tx.commit()
            .await
            .map_err(query_failed("トランザクションのコミット"))
    }

    async fn rollback(tx: Transaction<'_, MySql>) -> Result<WriteOutcome, RepositoryError> {
        tx.rollback()
            .await
            .map_err(query_failed("トランザクションのロールバック"))?;
        Ok(WriteOutcome::Conflict)
    }

    /// 上映回の版数が一致する場合のみ予約を追加する
    async fn insert(
        &self,
        expected_version: ShowtimeVersion,
        reservation: &Reservation,
    ) -> Result<WriteOutcome, RepositoryError> {
        let mut tx = self.begin().await?;

        // 版数を進める（一致しなければ0行）
        let bumped = sqlx::query(
            "UPDATE showtimes SET version = version + 1 WHERE id = ? AND version = ?",
        )
        .bind(reservation.showtime_id().to_string())
        .bind(expected_version.value())
        .execute(&mut *tx)
        .await
        .map_err(query_failed("上映回の版数の更新"))?;

        if bumped.rows_affected() == 0 {
            return Self::rollback(tx).await;
        }

        sqlx::query(
            r#"
            INSERT INTO reservations (
                id, showtime_id, holder_id, total_price, currency, status,
                ticket_reference, contact_name, contact_phone, created_at, checked_in_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(reservation.id().to_string())
        .bind(reservation.showtime_id().to_string())
        .bind(reservation.holder_id().to_string())
        .bind(reservation.total_price().amount())
        .bind(reservation.total_price().currency())
        .bind(reservation.status().to_string())
        .bind(reservation.ticket_reference().as_str())
        .bind(reservation.contact().name())
        .bind(reservation.contact().phone())
        .bind(reservation.created_at().naive_utc())
        .bind(reservation.checked_in_at().map(|at| at.naive_utc()))
        .execute(&mut *tx)
        .await
        .map_err(query_failed("予約の保存"))?;

        for (position, seat) in reservation.seats().iter().enumerate() {
            sqlx::query(
                "INSERT INTO reservation_seats (reservation_id, seat_id, position) VALUES (?, ?, ?)",
            )
            .bind(reservation.id().to_string())
            .bind(seat.as_str())
            .bind(position as u32)
            .execute(&mut *tx)
            .await
            .map_err(query_failed("予約座席の保存"))?;
        }

        Self::commit(tx).await?;
        Ok(WriteOutcome::Committed(expected_version.next()))
    }

    /// 予約の状態が読み取り時と一致する場合のみ予約を更新する
    async fn update(
        &self,
        expected: &ReservationState,
        reservation: &Reservation,
    ) -> Result<WriteOutcome, RepositoryError> {
        let mut tx = self.begin().await?;

        // 行ロックを取ってから現在の状態を確認する
        let current = sqlx::query(
            "SELECT status, contact_name, contact_phone FROM reservations WHERE id = ? FOR UPDATE",
        )
        .bind(reservation.id().to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_failed("予約のロック"))?;

        let Some(current) = current else {
            return Self::rollback(tx).await;
        };
        let current = ReservationState {
            status: ReservationStatus::from_string(current.get("status"))
                .map_err(|e| corrupted("ステータス", e))?,
            contact: ContactDetails::new(current.get("contact_name"), current.get("contact_phone"))
                .map_err(|e| corrupted("連絡先", e))?,
        };
        if current != *expected {
            return Self::rollback(tx).await;
        }

        sqlx::query(
            r#"
            UPDATE reservations
            SET status = ?, checked_in_at = ?, contact_name = ?, contact_phone = ?
            WHERE id = ?
            "#,
        )
        .bind(reservation.status().to_string())
        .bind(reservation.checked_in_at().map(|at| at.naive_utc()))
        .bind(reservation.contact().name())
        .bind(reservation.contact().phone())
        .bind(reservation.id().to_string())
        .execute(&mut *tx)
        .await
        .map_err(query_failed("予約の更新"))?;

        sqlx::query("UPDATE showtimes SET version = version + 1 WHERE id = ?")
            .bind(reservation.showtime_id().to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_failed("上映回の版数の更新"))?;

        let version: u64 = sqlx::query("SELECT version FROM showtimes WHERE id = ?")
            .bind(reservation.showtime_id().to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(query_failed("上映回の版数の取得"))?
            .get("version");

        Self::commit(tx).await?;
        Ok(WriteOutcome::Committed(ShowtimeVersion::new(version)))
    }
}

#[async_trait]
impl ReservationLedger for MySqlReservationLedger {
    async fn get(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Option<Reservation>, RepositoryError> {
        let sql = format!("{} WHERE r.id = ? ORDER BY s.position", SELECT_RESERVATIONS);
        let rows = sqlx::query(&sql)
            .bind(reservation_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("予約の取得"))?;

        Ok(build_reservations(&rows)?.into_iter().next())
    }

    async fn list_by_holder(
        &self,
        holder_id: HolderId,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let sql = format!(
            "{} WHERE r.holder_id = ? ORDER BY r.created_at DESC, r.id, s.position",
            SELECT_RESERVATIONS
        );
        let rows = sqlx::query(&sql)
            .bind(holder_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("予約者別予約一覧の取得"))?;

        build_reservations(&rows)
    }

    async fn list_by_showtime(
        &self,
        showtime_id: ShowtimeId,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let sql = format!(
            "{} WHERE r.showtime_id = ? ORDER BY r.created_at, r.id, s.position",
            SELECT_RESERVATIONS
        );
        let rows = sqlx::query(&sql)
            .bind(showtime_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("上映回別予約一覧の取得"))?;

        build_reservations(&rows)
    }

    async fn snapshot(&self, showtime_id: ShowtimeId) -> Result<ShowtimeSnapshot, RepositoryError> {
        let mut tx = self.begin().await?;

        // 共有ロックで版数を固定し、同じトランザクション内で有効な予約を読む
        let version = sqlx::query("SELECT version FROM showtimes WHERE id = ? LOCK IN SHARE MODE")
            .bind(showtime_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_failed("上映回の版数の取得"))?
            .map(|row| ShowtimeVersion::new(row.get("version")))
            .unwrap_or_default();

        let sql = format!(
            "{} WHERE r.showtime_id = ? AND r.status <> ? ORDER BY r.created_at, r.id, s.position",
            SELECT_RESERVATIONS
        );
        let rows = sqlx::query(&sql)
            .bind(showtime_id.to_string())
            .bind(ReservationStatus::Cancelled.to_string())
            .fetch_all(&mut *tx)
            .await
            .map_err(query_failed("有効な予約の取得"))?;

        Self::commit(tx).await?;

        Ok(ShowtimeSnapshot {
            version,
            active_reservations: build_reservations(&rows)?,
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
            } => self.insert(expected_version, reservation).await,
            ConditionalWrite::Update {
                expected,
                reservation,
            } => self.update(&expected, reservation).await,
        }
    }
}
