// 駆動される側アダプター（台帳・カタログ・イベントバスなどの実装）

mod event_bus;
mod in_memory_catalog;
mod in_memory_ledger;
mod mysql_catalog;
mod mysql_reservation_ledger;
mod ticket_encoder;
mod tracing_logger;

pub use event_bus::{DeadLetterEntry, EventBusConfig, InMemoryEventBus, QueuedEventBus};
pub use in_memory_catalog::InMemoryCatalog;
pub use in_memory_ledger::InMemoryReservationLedger;
pub use mysql_catalog::MySqlCatalog;
pub use mysql_reservation_ledger::MySqlReservationLedger;
pub use ticket_encoder::SignedTicketEncoder;
pub use tracing_logger::TracingLogger;
