use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

// UUIDをラップした識別子を定義する
macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// 新しい一意の識別子を生成
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// UUIDから作成
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// 文字列から作成
            pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
                let uuid = Uuid::parse_str(s)?;
                Ok(Self(uuid))
            }

            /// 内部のUUIDを取得
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

uuid_identifier!(
    /// 予約の一意識別子
    ReservationId
);
uuid_identifier!(
    /// 上映回の一意識別子
    ShowtimeId
);
uuid_identifier!(
    /// 劇場（スクリーン）の一意識別子
    VenueId
);
uuid_identifier!(
    /// 映画の一意識別子
    MovieId
);
uuid_identifier!(
    /// 予約者（認証済みユーザー）の一意識別子
    HolderId
);

/// 座席ID（例: "A1", "J12"）
/// 英大文字の行ラベルと1始まりの列番号からなる
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeatId(String);

impl SeatId {
    const MAX_LEN: usize = 8;

    /// 文字列から座席IDを作成
    /// 前後の空白を除去し、英字は大文字に正規化する
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let normalized = raw.trim().to_ascii_uppercase();

        let row_len = normalized
            .chars()
            .take_while(|c| c.is_ascii_uppercase())
            .count();
        let column = &normalized[row_len..];

        let well_formed = row_len > 0
            && !column.is_empty()
            && normalized.len() <= Self::MAX_LEN
            && column.chars().all(|c| c.is_ascii_digit())
            && !column.starts_with('0');

        if !well_formed {
            return Err(DomainError::InvalidSeat(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    /// 行ラベルと列番号から座席IDを作成
    pub(crate) fn from_grid(row_label: &str, column: u16) -> Self {
        Self(format!("{}{}", row_label, column))
    }

    /// 文字列として取得
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SeatId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SeatId> for String {
    fn from(value: SeatId) -> Self {
        value.0
    }
}

/// 通貨
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    /// 日本円
    #[allow(clippy::upper_case_acronyms)]
    JPY,
}

/// 金額を表す値オブジェクト
/// 予約の合計金額は呼び出し側で計算済みのものを受け取る
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: i64,
    currency: Currency,
}

impl Money {
    /// 金額と通貨から作成
    pub fn new(amount: i64, currency: String) -> Result<Self, DomainError> {
        let currency = match currency.as_str() {
            "JPY" => Currency::JPY,
            _ => {
                return Err(DomainError::InvalidValue(format!(
                    "サポートされていない通貨: {}",
                    currency
                )))
            }
        };
        Ok(Self { amount, currency })
    }

    /// 日本円の金額を作成
    pub fn jpy(amount: i64) -> Self {
        Self {
            amount,
            currency: Currency::JPY,
        }
    }

    /// 予約の合計金額として妥当な日本円の金額を作成
    /// 負の金額は受け付けない
    pub fn total_price(amount: i64) -> Result<Self, DomainError> {
        if amount < 0 {
            return Err(DomainError::InvalidValue(format!(
                "合計金額は0以上である必要があります: {}",
                amount
            )));
        }
        Ok(Self::jpy(amount))
    }

    /// 金額を取得
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// 通貨を文字列として取得
    pub fn currency(&self) -> String {
        match self.currency {
            Currency::JPY => "JPY".to_string(),
        }
    }
}

/// 予約のステータス
/// 作成はアトミックに行われるため、保留中の状態は存在しない
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationStatus {
    /// 確定済み（初期状態）
    Confirmed,
    /// キャンセル済み（終端）
    Cancelled,
    /// チェックイン済み（終端）
    CheckedIn,
}

impl ReservationStatus {
    /// 座席を保持している状態か
    pub fn is_active(&self) -> bool {
        !matches!(self, ReservationStatus::Cancelled)
    }

    /// これ以上遷移できない状態か
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Cancelled | ReservationStatus::CheckedIn
        )
    }

    /// 文字列からReservationStatusを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "Confirmed" => Ok(ReservationStatus::Confirmed),
            "Cancelled" => Ok(ReservationStatus::Cancelled),
            "CheckedIn" => Ok(ReservationStatus::CheckedIn),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な予約ステータス: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status_str = match self {
            ReservationStatus::Confirmed => "Confirmed",
            ReservationStatus::Cancelled => "Cancelled",
            ReservationStatus::CheckedIn => "CheckedIn",
        };
        write!(f, "{}", status_str)
    }
}

/// チケット参照
/// スキャン可能なコードに埋め込む不透明な文字列
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketReference(String);

impl TicketReference {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 予約者の連絡先
/// 予約作成後に変更できる唯一の項目
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    name: Option<String>,
    phone: Option<String>,
}

impl ContactDetails {
    const MAX_NAME_LEN: usize = 100;

    /// 新しい連絡先を作成
    /// バリデーション:
    /// - 氏名は空白のみ不可、100文字以内
    /// - 電話番号は7〜20文字の数字・"+"・"-"・空白
    pub fn new(name: Option<String>, phone: Option<String>) -> Result<Self, DomainError> {
        if let Some(name) = &name {
            if !Self::is_valid_name(name) {
                return Err(DomainError::InvalidValue(
                    "氏名は1〜100文字である必要があります".to_string(),
                ));
            }
        }
        if let Some(phone) = &phone {
            if !Self::is_valid_phone(phone) {
                return Err(DomainError::InvalidValue(format!(
                    "無効な電話番号: {}",
                    phone
                )));
            }
        }
        Ok(Self { name, phone })
    }

    fn is_valid_name(name: &str) -> bool {
        !name.trim().is_empty() && name.chars().count() <= Self::MAX_NAME_LEN
    }

    fn is_valid_phone(phone: &str) -> bool {
        let len = phone.chars().count();
        (7..=20).contains(&len)
            && phone
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' '))
            && phone.chars().any(|c| c.is_ascii_digit())
    }

    /// 氏名を取得
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// 電話番号を取得
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_id_creation() {
        let id1 = ReservationId::new();
        let id2 = ReservationId::new();
        assert_ne!(id1, id2, "Each ReservationId should be unique");
    }

    #[test]
    fn test_identifier_from_string() {
        let id = ShowtimeId::new();
        let parsed = ShowtimeId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert!(ShowtimeId::from_string("not-a-uuid").is_err());
    }

    #[test]
    fn test_seat_id_normalization() {
        let seat = SeatId::parse(" a12 ").unwrap();
        assert_eq!(seat.as_str(), "A12");
    }

    #[test]
    fn test_seat_id_invalid_formats() {
        for raw in ["", "A", "12", "A0", "A01", "1A", "A-1", "ABCDEFG12"] {
            assert_eq!(
                SeatId::parse(raw),
                Err(DomainError::InvalidSeat(raw.to_string())),
                "{} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_seat_id_deserialization_validates() {
        let ok: Result<SeatId, _> = serde_json::from_str("\"b3\"");
        assert_eq!(ok.unwrap().as_str(), "B3");

        let bad: Result<SeatId, _> = serde_json::from_str("\"??\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_total_price_rejects_negative() {
        assert!(Money::total_price(-1).is_err());
        assert_eq!(Money::total_price(500).unwrap().amount(), 500);
        assert_eq!(Money::total_price(0).unwrap().amount(), 0);
    }

    #[test]
    fn test_money_unsupported_currency() {
        assert!(Money::new(100, "USD".to_string()).is_err());
        assert_eq!(Money::new(100, "JPY".to_string()).unwrap(), Money::jpy(100));
    }

    #[test]
    fn test_status_lifecycle_flags() {
        assert!(ReservationStatus::Confirmed.is_active());
        assert!(ReservationStatus::CheckedIn.is_active());
        assert!(!ReservationStatus::Cancelled.is_active());

        assert!(!ReservationStatus::Confirmed.is_terminal());
        assert!(ReservationStatus::Cancelled.is_terminal());
        assert!(ReservationStatus::CheckedIn.is_terminal());
    }

    #[test]
    fn test_status_from_string() {
        for status in [
            ReservationStatus::Confirmed,
            ReservationStatus::Cancelled,
            ReservationStatus::CheckedIn,
        ] {
            assert_eq!(
                ReservationStatus::from_string(&status.to_string()).unwrap(),
                status
            );
        }
        assert!(ReservationStatus::from_string("confirmed").is_err()); // 大文字小文字が違う
        assert!(ReservationStatus::from_string("Pending").is_err());
    }

    #[test]
    fn test_contact_details_validation() {
        assert!(ContactDetails::new(Some("山田太郎".to_string()), Some("090-1234-5678".to_string())).is_ok());
        assert!(ContactDetails::new(None, None).is_ok());
        assert!(ContactDetails::new(Some("   ".to_string()), None).is_err());
        assert!(ContactDetails::new(None, Some("123".to_string())).is_err());
        assert!(ContactDetails::new(None, Some("090-abcd-5678".to_string())).is_err());
    }
}
