use crate::domain::error::DomainError;
use crate::domain::model::{SeatId, VenueId};
use std::collections::HashSet;

/// 座席レイアウト
/// 劇場の座席IDを行ごとに並べた不変のテンプレート
/// 同じ劇場のすべての上映回で共有される
#[derive(Debug, Clone, PartialEq)]
pub struct SeatLayout {
    venue_id: VenueId,
    rows: Vec<Vec<SeatId>>,
    index: HashSet<SeatId>,
}

impl SeatLayout {
    /// 行数の上限（A〜Z）
    pub const MAX_ROWS: u8 = 26;

    /// 行ごとの座席IDから座席レイアウトを作成
    /// 空の行や重複した座席IDは受け付けない
    pub fn new(venue_id: VenueId, rows: Vec<Vec<SeatId>>) -> Result<Self, DomainError> {
        if rows.is_empty() || rows.iter().any(|row| row.is_empty()) {
            return Err(DomainError::InvalidValue(
                "座席レイアウトに空の行は含められません".to_string(),
            ));
        }

        let mut index = HashSet::new();
        for seat in rows.iter().flatten() {
            if !index.insert(seat.clone()) {
                return Err(DomainError::DuplicateSeat(seat.clone()));
            }
        }

        Ok(Self {
            venue_id,
            rows,
            index,
        })
    }

    /// 行数×列数の格子状レイアウトを生成
    /// 行はAから始まる英字、列は1から始まる番号（例: 10行12列ならA1〜J12）
    pub fn grid(venue_id: VenueId, rows: u8, columns: u16) -> Result<Self, DomainError> {
        if rows == 0 || rows > Self::MAX_ROWS || columns == 0 {
            return Err(DomainError::InvalidValue(format!(
                "無効な座席レイアウトの大きさ: {}行 x {}列",
                rows, columns
            )));
        }

        let seat_rows = (0..rows)
            .map(|row| {
                let label = char::from(b'A' + row).to_string();
                (1..=columns)
                    .map(|column| SeatId::from_grid(&label, column))
                    .collect()
            })
            .collect();

        Self::new(venue_id, seat_rows)
    }

    /// 劇場IDを取得
    pub fn venue_id(&self) -> VenueId {
        self.venue_id
    }

    /// 行ごとの座席IDを取得
    pub fn rows(&self) -> &[Vec<SeatId>] {
        &self.rows
    }

    /// すべての座席IDをレイアウト順に列挙
    pub fn seats(&self) -> impl Iterator<Item = &SeatId> {
        self.rows.iter().flatten()
    }

    /// 座席数
    pub fn capacity(&self) -> usize {
        self.index.len()
    }

    /// 座席IDがレイアウトに含まれるか
    pub fn contains(&self, seat: &SeatId) -> bool {
        self.index.contains(seat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(s: &str) -> SeatId {
        SeatId::parse(s).unwrap()
    }

    #[test]
    fn test_grid_generates_row_major_ids() {
        let layout = SeatLayout::grid(VenueId::new(), 10, 12).unwrap();
        assert_eq!(layout.capacity(), 120);
        assert_eq!(layout.rows().len(), 10);

        let seats: Vec<&str> = layout.seats().map(SeatId::as_str).collect();
        assert_eq!(seats.first(), Some(&"A1"));
        assert_eq!(seats[11], "A12");
        assert_eq!(seats[12], "B1");
        assert_eq!(seats.last(), Some(&"J12"));
    }

    #[test]
    fn test_grid_rejects_invalid_dimensions() {
        assert!(SeatLayout::grid(VenueId::new(), 0, 10).is_err());
        assert!(SeatLayout::grid(VenueId::new(), 10, 0).is_err());
        assert!(SeatLayout::grid(VenueId::new(), 27, 10).is_err());
        assert!(SeatLayout::grid(VenueId::new(), 26, 1).is_ok());
    }

    #[test]
    fn test_contains() {
        let layout = SeatLayout::grid(VenueId::new(), 1, 3).unwrap();
        assert!(layout.contains(&seat("A3")));
        assert!(!layout.contains(&seat("A4")));
        assert!(!layout.contains(&seat("Z99")));
    }

    #[test]
    fn test_new_rejects_duplicates_and_empty_rows() {
        let venue_id = VenueId::new();
        let duplicated = SeatLayout::new(venue_id, vec![vec![seat("A1"), seat("A1")]]);
        assert_eq!(duplicated, Err(DomainError::DuplicateSeat(seat("A1"))));

        assert!(SeatLayout::new(venue_id, vec![]).is_err());
        assert!(SeatLayout::new(venue_id, vec![vec![seat("A1")], vec![]]).is_err());
    }
}
