use crate::domain::model::{ReservationStatus, SeatId};

/// ドメイン層のエラー型
/// ビジネスルール違反を表現する
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// 座席IDの形式が不正、または劇場の座席レイアウトに存在しない
    #[error("Invalid seat: {0}")]
    InvalidSeat(String),
    /// 座席が1つも指定されていない
    #[error("Seat selection must not be empty")]
    EmptySeatSelection,
    /// 同じ座席が複数回指定された
    #[error("Duplicate seat in selection: {0}")]
    DuplicateSeat(SeatId),
    /// 指定された座席の一部が有効な予約に保持されている
    #[error("Seats unavailable: {}", format_seats(.0))]
    SeatUnavailable(Vec<SeatId>),
    /// 許可されていないステータス遷移（例: キャンセル済みの予約をチェックインしようとした）
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },
    /// 無効な値
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl DomainError {
    /// リクエスト内容の検証エラーか（在庫チェック前に拒否されるもの）
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidSeat(_)
                | DomainError::EmptySeatSelection
                | DomainError::DuplicateSeat(_)
                | DomainError::InvalidValue(_)
        )
    }
}

fn format_seats(seats: &[SeatId]) -> String {
    seats
        .iter()
        .map(SeatId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_unavailable_display_lists_seats() {
        let err = DomainError::SeatUnavailable(vec![
            SeatId::parse("A1").unwrap(),
            SeatId::parse("A2").unwrap(),
        ]);
        assert_eq!(err.to_string(), "Seats unavailable: A1, A2");
    }

    #[test]
    fn test_validation_classification() {
        assert!(DomainError::EmptySeatSelection.is_validation());
        assert!(DomainError::InvalidSeat("Z99".to_string()).is_validation());
        assert!(!DomainError::SeatUnavailable(vec![]).is_validation());
        assert!(!DomainError::InvalidTransition {
            from: ReservationStatus::Cancelled,
            to: ReservationStatus::CheckedIn,
        }
        .is_validation());
    }
}
