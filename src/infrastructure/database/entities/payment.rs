//! Payment entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub booking_id: i64,

    /// Type: Booking, Cancellation fee, No show fee, Overstay fee
    pub payment_type: String,

    /// Status: Pending, Paid, Expired
    pub status: String,

    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub money_to_pay: Decimal,

    #[sea_orm(nullable)]
    pub session_id: Option<String>,

    #[sea_orm(nullable)]
    pub session_url: Option<String>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::booking::Entity",
        from = "Column::BookingId",
        to = "super::booking::Column::Id"
    )]
    Booking,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Booking.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
