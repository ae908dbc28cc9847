use crate::adapter::seed::CatalogRegistry;
use crate::domain::model::{SeatLayout, Showtime, ShowtimeId, VenueId};
use crate::domain::port::{Catalog, RepositoryError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

fn poisoned<T>(_: PoisonError<T>) -> RepositoryError {
    RepositoryError::OperationFailed("カタログのロックが破損しています".to_string())
}

/// インメモリカタログ
/// 開発・テスト用。登録済みのものは上書きしない
#[derive(Default)]
pub struct InMemoryCatalog {
    showtimes: RwLock<HashMap<ShowtimeId, Showtime>>,
    layouts: RwLock<HashMap<VenueId, SeatLayout>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn find_showtime(
        &self,
        showtime_id: ShowtimeId,
    ) -> Result<Option<Showtime>, RepositoryError> {
        let showtimes = self.showtimes.read().map_err(poisoned)?;
        Ok(showtimes.get(&showtime_id).cloned())
    }

    async fn venue_seat_layout(
        &self,
        venue_id: VenueId,
    ) -> Result<Option<SeatLayout>, RepositoryError> {
        let layouts = self.layouts.read().map_err(poisoned)?;
        Ok(layouts.get(&venue_id).cloned())
    }
}

#[async_trait]
impl CatalogRegistry for InMemoryCatalog {
    async fn register_venue(&self, layout: &SeatLayout) -> Result<bool, RepositoryError> {
        let mut layouts = self.layouts.write().map_err(poisoned)?;
        if layouts.contains_key(&layout.venue_id()) {
            return Ok(false);
        }
        layouts.insert(layout.venue_id(), layout.clone());
        Ok(true)
    }

    async fn register_showtime(&self, showtime: &Showtime) -> Result<bool, RepositoryError> {
        let has_venue = self
            .layouts
            .read()
            .map_err(poisoned)?
            .contains_key(&showtime.venue_id());
        if !has_venue {
            return Err(RepositoryError::OperationFailed(format!(
                "劇場が登録されていません: {}",
                showtime.venue_id()
            )));
        }

        let mut showtimes = self.showtimes.write().map_err(poisoned)?;
        if showtimes.contains_key(&showtime.id()) {
            return Ok(false);
        }
        showtimes.insert(showtime.id(), showtime.clone());
        Ok(true)
    }
}
