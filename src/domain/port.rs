// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::event::DomainEvent;
use crate::domain::model::{
    HolderId, Reservation, ReservationId, ReservationState, SeatLayout, Showtime, ShowtimeId,
    ShowtimeSnapshot, ShowtimeVersion, TicketReference, VenueId,
};
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

/// ロガートレイト
/// ログ出力を抽象化するポート
pub trait Logger: Send + Sync {
    /// デバッグレベルのログを出力
    fn debug(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// 情報レベルのログを出力
    fn info(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// 警告レベルのログを出力
    fn warn(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// エラーレベルのログを出力
    fn error(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );
}

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum RepositoryError {
    /// データベース接続に失敗
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// 操作に失敗
    #[error("Operation failed: {0}")]
    OperationFailed(String),
    /// データの取得に失敗
    #[error("Fetch failed: {0}")]
    FetchFailed(String),
}

/// 条件付き書き込み
/// 期待した状態が書き込み直前まで変わっていない場合にのみ適用される
#[derive(Debug, Clone)]
pub enum ConditionalWrite<'a> {
    /// 上映回の版数が一致する場合のみ新しい予約を追加する
    Insert {
        expected_version: ShowtimeVersion,
        reservation: &'a Reservation,
    },
    /// 予約の現在の状態（ステータスと連絡先）が読み取り時と一致する場合のみ予約を更新する
    Update {
        expected: ReservationState,
        reservation: &'a Reservation,
    },
}

impl ConditionalWrite<'_> {
    /// 書き込み対象の予約
    pub fn reservation(&self) -> &Reservation {
        match self {
            ConditionalWrite::Insert { reservation, .. } => reservation,
            ConditionalWrite::Update { reservation, .. } => reservation,
        }
    }
}

/// 条件付き書き込みの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// 書き込みが確定した（上映回の版数は新しい値に進んだ）
    Committed(ShowtimeVersion),
    /// 期待した状態と一致しなかったため何も書き込まなかった
    Conflict,
}

/// 予約台帳トレイト
/// 予約レコードの永続化を抽象化する
/// 座席の重複や遷移の妥当性といった業務ルールは判断しない
#[async_trait]
pub trait ReservationLedger: Send + Sync {
    /// 予約IDで予約を検索する
    ///
    /// # Returns
    /// * `Ok(Some(Reservation))` - 予約が見つかった
    /// * `Ok(None)` - 予約が見つからなかった
    /// * `Err(RepositoryError)` - 検索失敗
    async fn get(&self, reservation_id: ReservationId)
        -> Result<Option<Reservation>, RepositoryError>;

    /// 予約者の予約を作成日時の降順で取得する
    async fn list_by_holder(&self, holder_id: HolderId)
        -> Result<Vec<Reservation>, RepositoryError>;

    /// 上映回の予約（キャンセル済みを含む）を作成日時の昇順で取得する
    async fn list_by_showtime(
        &self,
        showtime_id: ShowtimeId,
    ) -> Result<Vec<Reservation>, RepositoryError>;

    /// 上映回の版数と有効な予約を一貫した状態で読み出す
    /// 予約が1件もない上映回は版数0の空スナップショットを返す
    async fn snapshot(&self, showtime_id: ShowtimeId) -> Result<ShowtimeSnapshot, RepositoryError>;

    /// 条件付き書き込み（compare-and-swap）
    ///
    /// # Returns
    /// * `Ok(WriteOutcome::Committed(_))` - 書き込み成功
    /// * `Ok(WriteOutcome::Conflict)` - 期待した状態と異なるため未適用
    /// * `Err(RepositoryError)` - 永続化の失敗
    async fn compare_and_set(
        &self,
        write: ConditionalWrite<'_>,
    ) -> Result<WriteOutcome, RepositoryError>;

    /// 新しい一意の予約IDを生成する
    fn next_identity(&self) -> ReservationId {
        ReservationId::new()
    }
}

/// カタログトレイト
/// 上映回と座席レイアウトの参照を抽象化する（読み取り専用）
#[async_trait]
pub trait Catalog: Send + Sync {
    /// 上映回を検索する
    async fn find_showtime(&self, showtime_id: ShowtimeId)
        -> Result<Option<Showtime>, RepositoryError>;

    /// 劇場の座席レイアウトを取得する
    async fn venue_seat_layout(&self, venue_id: VenueId)
        -> Result<Option<SeatLayout>, RepositoryError>;
}

/// チケットエンコーダートレイト
/// 予約IDからスキャン可能なチケット参照を導出する
/// 同じ予約IDに対しては常に同じ参照を返す
pub trait TicketEncoder: Send + Sync {
    /// 予約IDをチケット参照にエンコードする
    fn encode(&self, reservation_id: ReservationId) -> TicketReference;

    /// チケット参照をデコードする
    /// 改ざんされた参照や形式が不正な参照はNoneを返す
    fn decode(&self, reference: &TicketReference) -> Option<ReservationId>;
}

/// イベントバスエラー
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event publishing failed: {0}")]
    PublishingFailed(String),
}

/// イベントバストレイト
/// イベントの発行と配信を管理するポート
#[async_trait]
pub trait EventBus: Send + Sync {
    /// イベントを発行し、登録されたハンドラーに配信
    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError>;
}
