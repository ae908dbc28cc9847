use cinema_seat_reservation::adapter::driven::{
    EventBusConfig, InMemoryCatalog, InMemoryEventBus, InMemoryReservationLedger, MySqlCatalog,
    MySqlReservationLedger, QueuedEventBus, SignedTicketEncoder, TracingLogger,
};
use cinema_seat_reservation::adapter::driver::rest_api::{create_router, AppState};
use cinema_seat_reservation::adapter::seed::{seed_demo_catalog, CatalogRegistry};
use cinema_seat_reservation::adapter::{
    AppConfig, ConfigError, DatabaseConfig, DatabaseMigration, StorageBackend,
};
use cinema_seat_reservation::application::service::{
    ReservationApplicationService, ReservationQueryService,
};
use cinema_seat_reservation::domain::handler::ReservationActivityHandler;
use cinema_seat_reservation::domain::port::{Catalog, ReservationLedger};

use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// 保存先ごとに組み立てた台帳・カタログ
struct Storage {
    ledger: Arc<dyn ReservationLedger>,
    catalog: Arc<dyn Catalog>,
    registry: Arc<dyn CatalogRegistry>,
}

async fn build_storage(backend: StorageBackend) -> Result<Storage, Box<dyn std::error::Error>> {
    match backend {
        StorageBackend::MySql => {
            // データベース設定を読み込む
            let config = DatabaseConfig::from_env()?;
            tracing::info!(host = %config.host, port = config.port, "データベース設定を読み込みました");

            // 接続プールを作成
            let pool = MySqlPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(&config.connection_string())
                .await?;

            // マイグレーションを実行
            DatabaseMigration::new(pool.clone()).run().await?;

            let catalog = Arc::new(MySqlCatalog::new(pool.clone()));
            Ok(Storage {
                ledger: Arc::new(MySqlReservationLedger::new(pool)),
                catalog: catalog.clone(),
                registry: catalog,
            })
        }
        StorageBackend::Memory => {
            let catalog = Arc::new(InMemoryCatalog::new());
            Ok(Storage {
                ledger: Arc::new(InMemoryReservationLedger::new()),
                catalog: catalog.clone(),
                registry: catalog,
            })
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        backend = %config.storage_backend,
        port = config.server_port,
        max_attempts = config.reserve_max_attempts,
        "映画館座席予約API を起動します"
    );
    if config.uses_development_secret() {
        tracing::warn!("TICKET_SECRET が未設定のため開発用の署名鍵を使用します");
    }

    let storage = build_storage(config.storage_backend).await?;

    if config.seed_on_start {
        seed_demo_catalog(storage.registry.as_ref()).await?;
    }

    let logger = Arc::new(TracingLogger::new());

    // イベントバスを作成してハンドラーを登録
    let event_bus = Arc::new(InMemoryEventBus::new(EventBusConfig::default()));
    event_bus
        .subscribe(ReservationActivityHandler::new(logger.clone()))
        .await;
    // ハンドラーの配信はリクエストの応答と切り離す
    let event_bus = Arc::new(QueuedEventBus::spawn(event_bus));

    let ticket_encoder = SignedTicketEncoder::new(&config.ticket_secret)
        .map_err(|e| ConfigError::InvalidValue(format!("TICKET_SECRET: {}", e)))?;

    // アプリケーションサービスを作成
    let reservation_service = ReservationApplicationService::new(
        storage.ledger.clone(),
        storage.catalog.clone(),
        Arc::new(ticket_encoder),
        event_bus,
        logger,
    )
    .with_max_attempts(config.reserve_max_attempts);
    let query_service = ReservationQueryService::new(storage.ledger, storage.catalog);

    let app_state = AppState {
        reservation_service: Arc::new(reservation_service),
        query_service: Arc::new(query_service),
    };

    // REST APIルーターを作成
    let app = create_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state);

    // サーバーを起動
    let address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(%address, "REST APIサーバーが起動しました");

    axum::serve(listener, app).await?;

    Ok(())
}
