use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use cinema_seat_reservation::adapter::driven::{
    InMemoryCatalog, InMemoryEventBus, InMemoryReservationLedger, SignedTicketEncoder,
    TracingLogger,
};
use cinema_seat_reservation::adapter::driver::response_dto::{
    AvailabilityResponse, CreateReservationResponse, ReservationResponse, TicketResponse,
};
use cinema_seat_reservation::adapter::driver::rest_api::{create_router, ApiError, AppState};
use cinema_seat_reservation::adapter::seed::{demo_showtime_id, seed_demo_catalog};
use cinema_seat_reservation::application::service::{
    ReservationApplicationService, ReservationQueryService,
};
use cinema_seat_reservation::domain::model::HolderId;
use serde_json::json;
use std::sync::Arc;

async fn test_server() -> TestServer {
    let ledger = Arc::new(InMemoryReservationLedger::new());
    let catalog = Arc::new(InMemoryCatalog::new());
    seed_demo_catalog(catalog.as_ref()).await.unwrap();

    let reservation_service = ReservationApplicationService::new(
        ledger.clone(),
        catalog.clone(),
        Arc::new(SignedTicketEncoder::new("rest-api-secret").unwrap()),
        Arc::new(InMemoryEventBus::default()),
        Arc::new(TracingLogger::new()),
    );
    let state = AppState {
        reservation_service: Arc::new(reservation_service),
        query_service: Arc::new(ReservationQueryService::new(ledger, catalog)),
    };

    TestServer::new(create_router().with_state(state)).unwrap()
}

fn holder_header(holder_id: HolderId) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-holder-id"),
        HeaderValue::from_str(&holder_id.to_string()).unwrap(),
    )
}

async fn reserve(
    server: &TestServer,
    holder_id: HolderId,
    seats: &[&str],
) -> CreateReservationResponse {
    let (name, value) = holder_header(holder_id);
    let response = server
        .post("/reservations")
        .add_header(name, value)
        .json(&json!({
            "showtime_id": demo_showtime_id(0, 0).to_string(),
            "seats": seats,
            "total_price": 1800 * seats.len() as i64,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<CreateReservationResponse>()
}

#[tokio::test]
async fn test_health_check() {
    let server = test_server().await;

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_create_and_fetch_reservation() {
    let server = test_server().await;
    let holder_id = HolderId::new();

    let created = reserve(&server, holder_id, &["a1", "A2", "A3"]).await;
    assert_eq!(created.reservation.seats, vec!["A1", "A2", "A3"]);
    assert_eq!(created.reservation.status, "Confirmed");
    assert_eq!(created.reservation.holder_id, holder_id.to_string());

    let response = server
        .get(&format!("/reservations/{}", created.reservation.reservation_id))
        .await;
    response.assert_status_ok();
    let fetched = response.json::<ReservationResponse>();
    assert_eq!(fetched.seats, vec!["A1", "A2", "A3"]);
    assert_eq!(fetched.ticket_reference, created.ticket_reference);

    let (name, value) = holder_header(holder_id);
    let mine = server
        .get("/reservations")
        .add_header(name, value)
        .await
        .json::<Vec<ReservationResponse>>();
    assert_eq!(mine.len(), 1);
}

#[tokio::test]
async fn test_create_requires_holder_header() {
    let server = test_server().await;

    let response = server
        .post("/reservations")
        .json(&json!({
            "showtime_id": demo_showtime_id(0, 0).to_string(),
            "seats": ["A1"],
            "total_price": 1800,
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<ApiError>().code, "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_seat_outside_layout_is_invalid_seat() {
    let server = test_server().await;
    let (name, value) = holder_header(HolderId::new());

    let response = server
        .post("/reservations")
        .add_header(name, value)
        .json(&json!({
            "showtime_id": demo_showtime_id(0, 0).to_string(),
            "seats": ["Z99"],
            "total_price": 1800,
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<ApiError>().code, "INVALID_SEAT");
}

#[tokio::test]
async fn test_malformed_body_is_validation_error() {
    let server = test_server().await;
    let (name, value) = holder_header(HolderId::new());

    let response = server
        .post("/reservations")
        .add_header(name, value)
        .json(&json!({ "seats": "A1" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<ApiError>().code, "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_taken_seat_is_conflict_with_seat_list() {
    let server = test_server().await;
    reserve(&server, HolderId::new(), &["B1", "B2"]).await;
    let (name, value) = holder_header(HolderId::new());

    let response = server
        .post("/reservations")
        .add_header(name, value)
        .json(&json!({
            "showtime_id": demo_showtime_id(0, 0).to_string(),
            "seats": ["B2", "B3"],
            "total_price": 3600,
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let error = response.json::<ApiError>();
    assert_eq!(error.code, "SEAT_UNAVAILABLE");
    assert_eq!(error.seats, Some(vec!["B2".to_string()]));
}

#[tokio::test]
async fn test_cancel_then_check_in_is_invalid_transition() {
    let server = test_server().await;
    let created = reserve(&server, HolderId::new(), &["C5"]).await;
    let id = created.reservation.reservation_id;

    // 取り消しはPOSTのみ受け付ける
    let response = server.delete(&format!("/reservations/{}", id)).await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);

    let response = server.post(&format!("/reservations/{}/cancel", id)).await;
    response.assert_status_ok();
    assert_eq!(response.json::<ReservationResponse>().status, "Cancelled");

    let response = server.post(&format!("/reservations/{}/checkin", id)).await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<ApiError>().code, "INVALID_TRANSITION");

    let response = server.post(&format!("/reservations/{}/cancel", id)).await;
    response.assert_status(StatusCode::CONFLICT);

    // 解放された座席は空席として表示される
    let availability = server
        .get(&format!("/showtimes/{}/seats", demo_showtime_id(0, 0)))
        .await
        .json::<AvailabilityResponse>();
    assert!(availability.available.contains(&"C5".to_string()));
    assert_eq!(availability.capacity, 120);
    assert_eq!(availability.seats_available, 120);
}

#[tokio::test]
async fn test_ticket_scan_check_in() {
    let server = test_server().await;
    let created = reserve(&server, HolderId::new(), &["D7"]).await;
    let id = created.reservation.reservation_id;

    let ticket = server
        .get(&format!("/reservations/{}/ticket", id))
        .await
        .json::<TicketResponse>();
    assert_eq!(ticket.ticket_reference, created.ticket_reference);

    let response = server
        .post("/tickets/checkin")
        .json(&json!({ "ticket_reference": ticket.ticket_reference }))
        .await;
    response.assert_status_ok();
    let checked_in = response.json::<ReservationResponse>();
    assert_eq!(checked_in.status, "CheckedIn");
    assert!(checked_in.checked_in_at.is_some());

    let response = server
        .post("/tickets/checkin")
        .json(&json!({ "ticket_reference": "not-a-ticket" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_patch_updates_contact_only() {
    let server = test_server().await;
    let created = reserve(&server, HolderId::new(), &["E1"]).await;
    let id = created.reservation.reservation_id;

    let response = server
        .patch(&format!("/reservations/{}", id))
        .json(&json!({ "name": "高橋", "phone": "080-1111-2222" }))
        .await;
    response.assert_status_ok();
    let updated = response.json::<ReservationResponse>();
    assert_eq!(updated.contact_name.as_deref(), Some("高橋"));
    assert_eq!(updated.seats, vec!["E1"]);

    let response = server
        .patch(&format!("/reservations/{}", id))
        .json(&json!({ "seats": ["E2"] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .patch(&format!("/reservations/{}", id))
        .json(&json!({}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<ApiError>().code, "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unknown_ids() {
    let server = test_server().await;

    let response = server
        .get("/reservations/00000000-0000-0000-0000-000000000000")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = server.get("/reservations/not-a-uuid").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<ApiError>().code, "VALIDATION_ERROR");

    let response = server
        .get("/showtimes/00000000-0000-0000-0000-000000000000/reservations")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<ApiError>().code, "NOT_FOUND");
}

#[tokio::test]
async fn test_showtime_reservations_include_cancelled() {
    let server = test_server().await;
    let first = reserve(&server, HolderId::new(), &["F1"]).await;
    reserve(&server, HolderId::new(), &["F2"]).await;
    server
        .post(&format!(
            "/reservations/{}/cancel",
            first.reservation.reservation_id
        ))
        .await
        .assert_status_ok();

    let reservations = server
        .get(&format!("/showtimes/{}/reservations", demo_showtime_id(0, 0)))
        .await
        .json::<Vec<ReservationResponse>>();

    assert_eq!(reservations.len(), 2);
    assert_eq!(reservations[0].status, "Cancelled");
    assert_eq!(reservations[1].status, "Confirmed");
}

#[tokio::test]
async fn test_check_in_is_not_reachable_by_get() {
    let server = test_server().await;
    let created = reserve(&server, HolderId::new(), &["G3"]).await;
    let id = created.reservation.reservation_id;

    let response = server.get(&format!("/reservations/checkin/{}", id)).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let response = server.get(&format!("/reservations/{}/checkin", id)).await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);

    let fetched = server
        .get(&format!("/reservations/{}", id))
        .await
        .json::<ReservationResponse>();
    assert_eq!(fetched.status, "Confirmed");
}
