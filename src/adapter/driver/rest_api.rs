use async_trait::async_trait;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequestParts, Path, State,
    },
    http::{request::Parts, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::adapter::driver::request_dto::{
    CreateReservationRequest, ReservationPatchRequest, TicketCheckInRequest,
};
use crate::adapter::driver::response_dto::{
    AvailabilityResponse, CreateReservationResponse, ReservationResponse, TicketResponse,
};
use crate::application::service::{ReservationApplicationService, ReservationQueryService};
use crate::application::{ApplicationError, ErrorKind};
use crate::domain::error::DomainError;
use crate::domain::model::{HolderId, ReservationId, ShowtimeId, TicketReference};

/// 認証済みの予約者IDを渡すヘッダー
pub const HOLDER_ID_HEADER: &str = "x-holder-id";

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    /// 座席が取れなかった場合の対象座席
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seats: Option<Vec<String>>,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: error.into(),
            code: code.to_string(),
            seats: None,
        }),
    )
}

// アプリケーションサービスを含む状態
#[derive(Clone)]
pub struct AppState {
    pub reservation_service: Arc<ReservationApplicationService>,
    pub query_service: Arc<ReservationQueryService>,
}

/// 認証済みの予約者
/// 認証自体は外部で行われ、ヘッダーで予約者IDが渡される
pub struct AuthenticatedHolder(pub HolderId);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedHolder
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ApiError>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(HOLDER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| HolderId::from_string(value.trim()).ok())
            .map(AuthenticatedHolder)
            .ok_or_else(|| {
                api_error(
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHENTICATED",
                    "予約者IDが指定されていないか形式が不正です",
                )
            })
    }
}

// REST APIルーターを作成
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/reservations",
            post(create_reservation).get(list_my_reservations),
        )
        .route(
            "/reservations/:reservation_id",
            get(get_reservation).patch(patch_reservation),
        )
        .route("/reservations/:reservation_id/cancel", post(cancel_reservation))
        .route("/reservations/:reservation_id/checkin", post(check_in_reservation))
        .route("/reservations/:reservation_id/ticket", get(get_ticket))
        .route("/tickets/checkin", post(check_in_by_ticket))
        .route("/showtimes/:showtime_id/seats", get(get_showtime_seats))
        .route(
            "/showtimes/:showtime_id/reservations",
            get(list_showtime_reservations),
        )
}

fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value).map_err(|rejection| {
        api_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            format!("無効なリクエストです: {}", rejection.body_text()),
        )
    })
}

fn parse_id(path: Result<Path<Uuid>, PathRejection>) -> ApiResult<Uuid> {
    path.map(|Path(id)| id).map_err(|_| {
        api_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "無効なID形式です",
        )
    })
}

// ヘルスチェックエンドポイント
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// 予約作成エンドポイント
async fn create_reservation(
    State(state): State<AppState>,
    AuthenticatedHolder(holder_id): AuthenticatedHolder,
    body: Result<Json<CreateReservationRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreateReservationResponse>)> {
    let request = parse_body(body)?;
    let command = request
        .into_command(holder_id)
        .map_err(|e| map_application_error(e.into()))?;

    let (reservation, ticket_reference) = state
        .reservation_service
        .reserve(command)
        .await
        .map_err(map_application_error)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateReservationResponse::new(&reservation, &ticket_reference)),
    ))
}

// 予約者の予約一覧取得エンドポイント
async fn list_my_reservations(
    State(state): State<AppState>,
    AuthenticatedHolder(holder_id): AuthenticatedHolder,
) -> ApiResult<Json<Vec<ReservationResponse>>> {
    let reservations = state
        .query_service
        .list_by_holder(holder_id)
        .await
        .map_err(map_application_error)?;

    Ok(Json(
        reservations
            .iter()
            .map(ReservationResponse::from_reservation)
            .collect(),
    ))
}

// 予約詳細取得エンドポイント
async fn get_reservation(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ReservationResponse>> {
    let reservation_id = ReservationId::from_uuid(parse_id(path)?);

    match state.query_service.get_reservation(reservation_id).await {
        Ok(Some(reservation)) => Ok(Json(ReservationResponse::from_reservation(&reservation))),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "指定された予約が見つかりません",
        )),
        Err(err) => Err(map_application_error(err)),
    }
}

// 連絡先更新エンドポイント
async fn patch_reservation(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ReservationPatchRequest>, JsonRejection>,
) -> ApiResult<Json<ReservationResponse>> {
    let reservation_id = ReservationId::from_uuid(parse_id(path)?);
    let patch = parse_body(body)?;
    if patch.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "更新する項目がありません",
        ));
    }

    let reservation = state
        .reservation_service
        .update_contact(reservation_id, patch.name, patch.phone)
        .await
        .map_err(map_application_error)?;

    Ok(Json(ReservationResponse::from_reservation(&reservation)))
}

// 予約キャンセルエンドポイント
async fn cancel_reservation(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ReservationResponse>> {
    let reservation_id = ReservationId::from_uuid(parse_id(path)?);

    let reservation = state
        .reservation_service
        .cancel(reservation_id)
        .await
        .map_err(map_application_error)?;

    Ok(Json(ReservationResponse::from_reservation(&reservation)))
}

// チェックインエンドポイント
async fn check_in_reservation(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ReservationResponse>> {
    let reservation_id = ReservationId::from_uuid(parse_id(path)?);

    let reservation = state
        .reservation_service
        .check_in(reservation_id)
        .await
        .map_err(map_application_error)?;

    Ok(Json(ReservationResponse::from_reservation(&reservation)))
}

// チケット再発行エンドポイント
async fn get_ticket(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<TicketResponse>> {
    let reservation_id = ReservationId::from_uuid(parse_id(path)?);

    let ticket_reference = state
        .reservation_service
        .issue_ticket(reservation_id)
        .await
        .map_err(map_application_error)?;

    Ok(Json(TicketResponse {
        reservation_id: reservation_id.to_string(),
        ticket_reference: ticket_reference.to_string(),
    }))
}

// チケットスキャンによるチェックインエンドポイント
async fn check_in_by_ticket(
    State(state): State<AppState>,
    body: Result<Json<TicketCheckInRequest>, JsonRejection>,
) -> ApiResult<Json<ReservationResponse>> {
    let request = parse_body(body)?;
    let reference = TicketReference::new(request.ticket_reference);

    let reservation = state
        .reservation_service
        .check_in_by_ticket(&reference)
        .await
        .map_err(map_application_error)?;

    Ok(Json(ReservationResponse::from_reservation(&reservation)))
}

// 空席状況取得エンドポイント
async fn get_showtime_seats(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<AvailabilityResponse>> {
    let showtime_id = ShowtimeId::from_uuid(parse_id(path)?);

    let inventory = state
        .query_service
        .availability(showtime_id)
        .await
        .map_err(map_application_error)?;

    Ok(Json(AvailabilityResponse::from_inventory(&inventory)))
}

// 上映回の予約一覧取得エンドポイント
async fn list_showtime_reservations(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Vec<ReservationResponse>>> {
    let showtime_id = ShowtimeId::from_uuid(parse_id(path)?);

    let reservations = state
        .query_service
        .list_by_showtime(showtime_id)
        .await
        .map_err(map_application_error)?;

    Ok(Json(
        reservations
            .iter()
            .map(ReservationResponse::from_reservation)
            .collect(),
    ))
}

// アプリケーションエラーをHTTPエラーにマッピング
// エラー分類ごとに異なるステータスとコードを返す
pub fn map_application_error(err: ApplicationError) -> (StatusCode, Json<ApiError>) {
    let (status, code) = match (&err, err.kind()) {
        (ApplicationError::DomainError(DomainError::InvalidSeat(_)), _) => {
            (StatusCode::BAD_REQUEST, "INVALID_SEAT")
        }
        (_, ErrorKind::Validation) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        (_, ErrorKind::SeatUnavailable) => (StatusCode::CONFLICT, "SEAT_UNAVAILABLE"),
        (_, ErrorKind::NotFound) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        (_, ErrorKind::InvalidTransition) => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
        (_, ErrorKind::ConflictRetryExhausted) => {
            (StatusCode::SERVICE_UNAVAILABLE, "CONFLICT_RETRY_EXHAUSTED")
        }
        (ApplicationError::EventPublishingFailed(_), _) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "EVENT_PUBLISHING_ERROR")
        }
        (_, ErrorKind::Internal) => (StatusCode::INTERNAL_SERVER_ERROR, "REPOSITORY_ERROR"),
    };

    if status.is_server_error() {
        tracing::error!(code, error = %err, "request failed");
    }

    let seats = match &err {
        ApplicationError::DomainError(DomainError::SeatUnavailable(seats)) => Some(
            seats.iter().map(|seat| seat.as_str().to_string()).collect(),
        ),
        _ => None,
    };
    let message = match err {
        ApplicationError::DomainError(domain_err) => domain_err.to_string(),
        ApplicationError::NotFound(msg) => msg,
        other => other.to_string(),
    };

    (
        status,
        Json(ApiError {
            error: message,
            code: code.to_string(),
            seats,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ReservationStatus, SeatId};
    use crate::domain::port::RepositoryError;

    #[test]
    fn test_map_application_error_codes() {
        let cases = vec![
            (
                ApplicationError::from(DomainError::InvalidSeat("Z99".to_string())),
                StatusCode::BAD_REQUEST,
                "INVALID_SEAT",
            ),
            (
                ApplicationError::from(DomainError::EmptySeatSelection),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                ApplicationError::from(DomainError::InvalidTransition {
                    from: ReservationStatus::CheckedIn,
                    to: ReservationStatus::Cancelled,
                }),
                StatusCode::CONFLICT,
                "INVALID_TRANSITION",
            ),
            (
                ApplicationError::NotFound("予約が見つかりません".to_string()),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                ApplicationError::ConflictRetryExhausted { attempts: 5 },
                StatusCode::SERVICE_UNAVAILABLE,
                "CONFLICT_RETRY_EXHAUSTED",
            ),
            (
                ApplicationError::from(RepositoryError::FetchFailed("db".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "REPOSITORY_ERROR",
            ),
        ];

        for (err, status, code) in cases {
            let (actual_status, Json(api_error)) = map_application_error(err);
            assert_eq!(actual_status, status);
            assert_eq!(api_error.code, code);
        }
    }

    #[test]
    fn test_seat_unavailable_lists_seats() {
        let err = ApplicationError::from(DomainError::SeatUnavailable(vec![
            SeatId::parse("A2").unwrap(),
        ]));

        let (status, Json(api_error)) = map_application_error(err);

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(api_error.code, "SEAT_UNAVAILABLE");
        assert_eq!(api_error.seats, Some(vec!["A2".to_string()]));
    }

    #[test]
    fn test_api_error_omits_empty_seats() {
        let (_, Json(api_error)) = map_application_error(ApplicationError::NotFound(
            "リソースが見つかりません".to_string(),
        ));

        let json = serde_json::to_string(&api_error).unwrap();
        assert!(!json.contains("seats"));
        assert!(json.contains("リソースが見つかりません"));
    }
}
