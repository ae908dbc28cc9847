// ドメインモデル（エンティティと値オブジェクト）

mod value_objects;
mod seat_layout;
mod showtime;
mod reservation;
mod inventory;

pub use value_objects::{
    ContactDetails, Currency, HolderId, Money, MovieId, ReservationId, ReservationStatus, SeatId,
    ShowtimeId, TicketReference, VenueId,
};

pub use seat_layout::SeatLayout;
pub use showtime::Showtime;
pub use reservation::{CheckInOutcome, Reservation, ReservationState};
pub use inventory::{ShowtimeSeatInventory, ShowtimeSnapshot, ShowtimeVersion};
