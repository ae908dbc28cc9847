// デモデータの投入
// 起動時にSEED_ON_START=trueの場合のみ実行する

use crate::domain::model::{MovieId, SeatLayout, Showtime, ShowtimeId, VenueId};
use crate::domain::port::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use uuid::Uuid;

/// デモ劇場の数
pub const DEMO_VENUES: u128 = 4;
/// デモ映画の数
pub const DEMO_MOVIES: u128 = 5;
/// デモ劇場の行数（A〜J）
pub const DEMO_ROWS: u8 = 10;
/// デモ劇場の列数
pub const DEMO_COLUMNS: u16 = 12;
/// 1日の上映開始時刻（0時からの分）
const DEMO_START_MINUTES: [i64; 4] = [10 * 60, 13 * 60, 16 * 60 + 30, 20 * 60];

/// カタログへの登録（デモデータ投入用）
/// 既に登録済みの場合は何もせずfalseを返す
#[async_trait]
pub trait CatalogRegistry: Send + Sync {
    async fn register_venue(&self, layout: &SeatLayout) -> Result<bool, RepositoryError>;

    async fn register_showtime(&self, showtime: &Showtime) -> Result<bool, RepositoryError>;
}

/// 投入結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub venues_created: usize,
    pub showtimes_created: usize,
}

/// デモ劇場のID（何度実行しても同じ値）
pub fn demo_venue_id(index: u128) -> VenueId {
    VenueId::from_uuid(Uuid::from_u128(0x1000 + index))
}

/// デモ上映回のID（何度実行しても同じ値）
pub fn demo_showtime_id(venue_index: u128, slot: u128) -> ShowtimeId {
    ShowtimeId::from_uuid(Uuid::from_u128(0x2000 + venue_index * 0x10 + slot))
}

fn demo_movie_id(index: u128) -> MovieId {
    MovieId::from_uuid(Uuid::from_u128(0x3000 + index % DEMO_MOVIES))
}

/// 翌日の0時（UTC）
fn tomorrow_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    (now + Duration::days(1))
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// デモデータを投入する
/// 劇場ごとに10行12列（A1〜J12）の座席と翌日の上映回を登録する
/// IDが固定なので、2回目以降は既存データを残して何も追加しない
pub async fn seed_demo_catalog(
    registry: &dyn CatalogRegistry,
) -> Result<SeedSummary, RepositoryError> {
    let mut summary = SeedSummary::default();
    let midnight = tomorrow_midnight(Utc::now());

    for venue_index in 0..DEMO_VENUES {
        let venue_id = demo_venue_id(venue_index);
        let layout = SeatLayout::grid(venue_id, DEMO_ROWS, DEMO_COLUMNS)
            .map_err(|e| RepositoryError::OperationFailed(e.to_string()))?;
        if registry.register_venue(&layout).await? {
            summary.venues_created += 1;
        }

        for (slot, minutes) in DEMO_START_MINUTES.iter().enumerate() {
            let slot = slot as u128;
            let showtime = Showtime::new(
                demo_showtime_id(venue_index, slot),
                demo_movie_id(venue_index + slot),
                venue_id,
                midnight + Duration::minutes(*minutes),
            );
            if registry.register_showtime(&showtime).await? {
                summary.showtimes_created += 1;
            }
        }
    }

    tracing::info!(
        venues_created = summary.venues_created,
        showtimes_created = summary.showtimes_created,
        "demo catalog seeded"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::driven::InMemoryCatalog;
    use crate::domain::port::Catalog;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let catalog = InMemoryCatalog::new();

        let first = seed_demo_catalog(&catalog).await.unwrap();
        assert_eq!(first.venues_created, 4);
        assert_eq!(first.showtimes_created, 16);

        let second = seed_demo_catalog(&catalog).await.unwrap();
        assert_eq!(second, SeedSummary::default());
    }

    #[tokio::test]
    async fn test_seeded_venue_has_full_grid() {
        let catalog = InMemoryCatalog::new();
        seed_demo_catalog(&catalog).await.unwrap();

        let showtime = catalog
            .find_showtime(demo_showtime_id(0, 0))
            .await
            .unwrap()
            .unwrap();
        let layout = catalog
            .venue_seat_layout(showtime.venue_id())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(layout.capacity(), 120);
        assert_eq!(layout.seats().next().map(|s| s.as_str()), Some("A1"));
        assert_eq!(layout.seats().last().map(|s| s.as_str()), Some("J12"));
    }
}
