use crate::adapter::database_error::{corrupted, query_failed, DatabaseError};
use crate::adapter::seed::CatalogRegistry;
use crate::domain::model::{MovieId, SeatId, SeatLayout, Showtime, ShowtimeId, VenueId};
use crate::domain::port::{Catalog, RepositoryError};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{MySql, Pool, Row};

/// MySQLカタログ
/// 上映回と劇場の座席レイアウトを参照する
pub struct MySqlCatalog {
    pool: Pool<MySql>,
}

impl MySqlCatalog {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Catalog for MySqlCatalog {
    async fn find_showtime(
        &self,
        showtime_id: ShowtimeId,
    ) -> Result<Option<Showtime>, RepositoryError> {
        let row = sqlx::query("SELECT id, movie_id, venue_id, starts_at FROM showtimes WHERE id = ?")
            .bind(showtime_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("上映回の取得"))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let movie_id =
            MovieId::from_string(row.get("movie_id")).map_err(|e| corrupted("映画ID", e))?;
        let venue_id =
            VenueId::from_string(row.get("venue_id")).map_err(|e| corrupted("劇場ID", e))?;
        let starts_at: NaiveDateTime = row.get("starts_at");

        Ok(Some(Showtime::new(
            showtime_id,
            movie_id,
            venue_id,
            starts_at.and_utc(),
        )))
    }

    async fn venue_seat_layout(
        &self,
        venue_id: VenueId,
    ) -> Result<Option<SeatLayout>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT seat_id, row_index
            FROM venue_seats
            WHERE venue_id = ?
            ORDER BY row_index, column_index
            "#,
        )
        .bind(venue_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed("座席レイアウトの取得"))?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut seat_rows: Vec<(u32, Vec<SeatId>)> = Vec::new();
        for row in &rows {
            let row_index: u32 = row.get("row_index");
            let seat = SeatId::parse(row.get("seat_id")).map_err(|e| corrupted("座席ID", e))?;
            match seat_rows.last_mut() {
                Some((index, seats)) if *index == row_index => seats.push(seat),
                _ => seat_rows.push((row_index, vec![seat])),
            }
        }

        let layout = SeatLayout::new(
            venue_id,
            seat_rows.into_iter().map(|(_, seats)| seats).collect(),
        )
        .map_err(|e| corrupted("座席レイアウト", e))?;
        Ok(Some(layout))
    }
}

#[async_trait]
impl CatalogRegistry for MySqlCatalog {
    async fn register_venue(&self, layout: &SeatLayout) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            RepositoryError::from(DatabaseError::ConnectionError(format!(
                "トランザクション開始に失敗しました: {}",
                e
            )))
        })?;

        let inserted = sqlx::query("INSERT IGNORE INTO venues (id) VALUES (?)")
            .bind(layout.venue_id().to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_failed("劇場の登録"))?;

        if inserted.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(query_failed("トランザクションのロールバック"))?;
            return Ok(false);
        }

        for (row_index, row) in layout.rows().iter().enumerate() {
            for (column_index, seat) in row.iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO venue_seats (venue_id, seat_id, row_index, column_index)
                    VALUES (?, ?, ?, ?)
                    "#,
                )
                .bind(layout.venue_id().to_string())
                .bind(seat.as_str())
                .bind(row_index as u32)
                .bind(column_index as u32)
                .execute(&mut *tx)
                .await
                .map_err(query_failed("座席の登録"))?;
            }
        }

        tx.commit()
            .await
            .map_err(query_failed("トランザクションのコミット"))?;
        Ok(true)
    }

    async fn register_showtime(&self, showtime: &Showtime) -> Result<bool, RepositoryError> {
        let inserted = sqlx::query(
            "INSERT IGNORE INTO showtimes (id, movie_id, venue_id, starts_at) VALUES (?, ?, ?, ?)",
        )
        .bind(showtime.id().to_string())
        .bind(showtime.movie_id().to_string())
        .bind(showtime.venue_id().to_string())
        .bind(showtime.starts_at().naive_utc())
        .execute(&self.pool)
        .await
        .map_err(query_failed("上映回の登録"))?;

        Ok(inserted.rows_affected() == 1)
    }
}
