use crate::application::service::ReserveCommand;
use crate::domain::error::DomainError;
use crate::domain::model::{ContactDetails, HolderId, Money, SeatId, ShowtimeId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 連絡先のリクエストDTO
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// 予約作成用のリクエストDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateReservationRequest {
    pub showtime_id: Uuid,
    /// 座席ID（例: "A1"）。指定順を保持する
    pub seats: Vec<String>,
    /// 合計金額（JPY）
    pub total_price: i64,
    #[serde(default)]
    pub contact: Option<ContactRequest>,
}

impl CreateReservationRequest {
    /// 予約コマンドに変換する
    /// 座席IDの形式・金額・連絡先の検証もここで行う
    pub fn into_command(self, holder_id: HolderId) -> Result<ReserveCommand, DomainError> {
        let seats = self
            .seats
            .iter()
            .map(|seat| SeatId::parse(seat))
            .collect::<Result<Vec<_>, _>>()?;
        let total_price = Money::total_price(self.total_price)?;
        let contact = match self.contact {
            Some(contact) => ContactDetails::new(contact.name, contact.phone)?,
            None => ContactDetails::default(),
        };

        Ok(ReserveCommand {
            showtime_id: ShowtimeId::from_uuid(self.showtime_id),
            holder_id,
            seats,
            total_price,
            contact,
        })
    }
}

/// 予約の部分更新用のリクエストDTO
/// 変更できるのは連絡先のみ。それ以外の項目を含むリクエストは拒否する
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReservationPatchRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl ReservationPatchRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none()
    }
}

/// チケットによるチェックイン用のリクエストDTO
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TicketCheckInRequest {
    pub ticket_reference: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_into_command() {
        let json = r#"{
            "showtime_id": "6f1c2a3e-9f0b-4c51-8d6a-2f3b4c5d6e7f",
            "seats": ["a2", "A1"],
            "total_price": 500,
            "contact": {"name": "山田", "phone": "090-1234-5678"}
        }"#;
        let request: CreateReservationRequest = serde_json::from_str(json).unwrap();
        let holder_id = HolderId::new();

        let command = request.into_command(holder_id).unwrap();

        assert_eq!(command.holder_id, holder_id);
        assert_eq!(
            command.seats,
            vec![SeatId::parse("A2").unwrap(), SeatId::parse("A1").unwrap()]
        );
        assert_eq!(command.total_price.amount(), 500);
        assert_eq!(command.contact.name(), Some("山田"));
    }

    #[test]
    fn test_create_request_rejects_malformed_seat_and_price() {
        let request = CreateReservationRequest {
            showtime_id: Uuid::new_v4(),
            seats: vec!["1A".to_string()],
            total_price: 100,
            contact: None,
        };
        assert!(matches!(
            request.into_command(HolderId::new()),
            Err(DomainError::InvalidSeat(_))
        ));

        let request = CreateReservationRequest {
            showtime_id: Uuid::new_v4(),
            seats: vec!["A1".to_string()],
            total_price: -1,
            contact: None,
        };
        assert!(matches!(
            request.into_command(HolderId::new()),
            Err(DomainError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let ok: ReservationPatchRequest = serde_json::from_str(r#"{"phone": "0312345678"}"#).unwrap();
        assert_eq!(ok.phone.as_deref(), Some("0312345678"));
        assert!(!ok.is_empty());

        let result = serde_json::from_str::<ReservationPatchRequest>(r#"{"status": "Cancelled"}"#);
        assert!(result.is_err());
        let result = serde_json::from_str::<ReservationPatchRequest>(r#"{"seats": ["A1"]}"#);
        assert!(result.is_err());
    }
}
