// ドメイン層
// 座席在庫と予約のビジネスルールを表現する

pub mod error;
pub mod event;
pub mod event_bus;
pub mod handler;
pub mod model;
pub mod port;
