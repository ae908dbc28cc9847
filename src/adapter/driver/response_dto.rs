use crate::domain::model::{Reservation, SeatId, ShowtimeSeatInventory, TicketReference};
use serde::{Deserialize, Serialize};

fn seat_strings(seats: &[SeatId]) -> Vec<String> {
    seats.iter().map(|seat| seat.as_str().to_string()).collect()
}

/// 予約用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct ReservationResponse {
    pub reservation_id: String,
    pub showtime_id: String,
    pub holder_id: String,
    pub seats: Vec<String>,
    pub total_price: i64,
    pub currency: String,
    pub status: String,
    pub ticket_reference: String,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub created_at: String,
    pub checked_in_at: Option<String>,
}

impl ReservationResponse {
    /// ドメインオブジェクトからReservationResponseを作成
    pub fn from_reservation(reservation: &Reservation) -> Self {
        Self {
            reservation_id: reservation.id().to_string(),
            showtime_id: reservation.showtime_id().to_string(),
            holder_id: reservation.holder_id().to_string(),
            seats: seat_strings(reservation.seats()),
            total_price: reservation.total_price().amount(),
            currency: reservation.total_price().currency(),
            status: reservation.status().to_string(),
            ticket_reference: reservation.ticket_reference().to_string(),
            contact_name: reservation.contact().name().map(str::to_string),
            contact_phone: reservation.contact().phone().map(str::to_string),
            created_at: reservation.created_at().to_rfc3339(),
            checked_in_at: reservation.checked_in_at().map(|at| at.to_rfc3339()),
        }
    }
}

/// 予約作成用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateReservationResponse {
    pub reservation: ReservationResponse,
    pub ticket_reference: String,
}

impl CreateReservationResponse {
    pub fn new(reservation: &Reservation, ticket_reference: &TicketReference) -> Self {
        Self {
            reservation: ReservationResponse::from_reservation(reservation),
            ticket_reference: ticket_reference.to_string(),
        }
    }
}

/// チケット再発行用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct TicketResponse {
    pub reservation_id: String,
    pub ticket_reference: String,
}

/// 上映回の空席状況用のレスポンスDTO
/// seats_availableは表示用の値で、予約の可否判定には使わない
#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub showtime_id: String,
    pub venue_id: String,
    pub starts_at: String,
    pub capacity: usize,
    pub seats_available: usize,
    pub available: Vec<String>,
    pub held: Vec<String>,
}

impl AvailabilityResponse {
    pub fn from_inventory(inventory: &ShowtimeSeatInventory) -> Self {
        let available = seat_strings(&inventory.available());
        Self {
            showtime_id: inventory.showtime().id().to_string(),
            venue_id: inventory.showtime().venue_id().to_string(),
            starts_at: inventory.showtime().starts_at().to_rfc3339(),
            capacity: inventory.layout().capacity(),
            seats_available: available.len(),
            available,
            held: seat_strings(&inventory.held()),
        }
    }
}
