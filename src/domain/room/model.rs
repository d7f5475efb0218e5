//! Room domain entity

use rust_decimal::Decimal;

/// Room category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomType {
    Single,
    Double,
    Suite,
}

impl RoomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "Single",
            Self::Double => "Double",
            Self::Suite => "Suite",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            s if s.eq_ignore_ascii_case("Single") => Some(Self::Single),
            s if s.eq_ignore_ascii_case("Double") => Some(Self::Double),
            s if s.eq_ignore_ascii_case("Suite") => Some(Self::Suite),
            _ => None,
        }
    }
}

impl std::fmt::Display for RoomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bookable hotel room. `price_per_night` here is the current list
/// price; bookings snapshot it at creation time.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: i64,
    pub number: String,
    pub room_type: RoomType,
    pub price_per_night: Decimal,
    pub capacity: i32,
}

impl Room {
    pub fn new(
        number: impl Into<String>,
        room_type: RoomType,
        price_per_night: Decimal,
        capacity: i32,
    ) -> Self {
        Self {
            id: 0,
            number: number.into(),
            room_type,
            price_per_night,
            capacity,
        }
    }
}
