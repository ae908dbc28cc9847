use super::load_showtime;
use crate::application::ApplicationError;
use crate::domain::model::{HolderId, Reservation, ReservationId, ShowtimeId, ShowtimeSeatInventory};
use crate::domain::port::{Catalog, ReservationLedger};
use std::sync::Arc;

/// 予約クエリサービス
/// 読み取り専用の予約・空席操作を提供する
pub struct ReservationQueryService {
    ledger: Arc<dyn ReservationLedger>,
    catalog: Arc<dyn Catalog>,
}

impl ReservationQueryService {
    /// 新しい予約クエリサービスを作成
    ///
    /// # Arguments
    /// * `ledger` - 予約台帳
    /// * `catalog` - 上映回・座席レイアウトのカタログ
    pub fn new(ledger: Arc<dyn ReservationLedger>, catalog: Arc<dyn Catalog>) -> Self {
        Self { ledger, catalog }
    }

    /// 予約IDで予約を取得
    ///
    /// # Returns
    /// * `Ok(Some(Reservation))` - 予約が見つかった
    /// * `Ok(None)` - 予約が見つからなかった
    /// * `Err(ApplicationError)` - 取得失敗
    pub async fn get_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Option<Reservation>, ApplicationError> {
        self.ledger
            .get(reservation_id)
            .await
            .map_err(ApplicationError::from)
    }

    /// 予約者の予約を取得
    /// 作成日時の降順で並べて返す
    pub async fn list_by_holder(
        &self,
        holder_id: HolderId,
    ) -> Result<Vec<Reservation>, ApplicationError> {
        self.ledger
            .list_by_holder(holder_id)
            .await
            .map_err(ApplicationError::from)
    }

    /// 上映回の予約（キャンセル済みを含む）を取得
    /// 作成日時の昇順で並べて返す
    pub async fn list_by_showtime(
        &self,
        showtime_id: ShowtimeId,
    ) -> Result<Vec<Reservation>, ApplicationError> {
        load_showtime(self.catalog.as_ref(), showtime_id).await?;
        self.ledger
            .list_by_showtime(showtime_id)
            .await
            .map_err(ApplicationError::from)
    }

    /// 上映回の座席在庫を取得
    /// 表示用の値であり、予約の可否判定には使わない
    pub async fn availability(
        &self,
        showtime_id: ShowtimeId,
    ) -> Result<ShowtimeSeatInventory, ApplicationError> {
        let (showtime, layout) = load_showtime(self.catalog.as_ref(), showtime_id).await?;
        let snapshot = self.ledger.snapshot(showtime_id).await?;
        Ok(ShowtimeSeatInventory::from_snapshot(
            showtime, layout, &snapshot,
        ))
    }
}
