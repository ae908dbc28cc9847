use crate::domain::model::{MovieId, ShowtimeId, VenueId};
use chrono::{DateTime, Utc};

/// 上映回
/// カタログから提供される読み取り専用の情報
/// 座席の空き状況は保持せず、予約台帳から都度導出する
#[derive(Debug, Clone, PartialEq)]
pub struct Showtime {
    id: ShowtimeId,
    movie_id: MovieId,
    venue_id: VenueId,
    starts_at: DateTime<Utc>,
}

impl Showtime {
    pub fn new(
        id: ShowtimeId,
        movie_id: MovieId,
        venue_id: VenueId,
        starts_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            movie_id,
            venue_id,
            starts_at,
        }
    }

    pub fn id(&self) -> ShowtimeId {
        self.id
    }

    pub fn movie_id(&self) -> MovieId {
        self.movie_id
    }

    pub fn venue_id(&self) -> VenueId {
        self.venue_id
    }

    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }
}
