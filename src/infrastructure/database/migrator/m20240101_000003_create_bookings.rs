//! Create bookings table
//!
//! One row per stay. Availability queries filter on room, status and
//! the date interval, so those columns are indexed.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users::Users;
use super::m20240101_000002_create_rooms::Rooms;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookings::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookings::RoomId).big_integer().not_null())
                    .col(ColumnDef::new(Bookings::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Bookings::CheckInDate).date().not_null())
                    .col(ColumnDef::new(Bookings::CheckOutDate).date().not_null())
                    .col(ColumnDef::new(Bookings::ActualCheckOutDate).date())
                    .col(
                        ColumnDef::new(Bookings::Status)
                            .string()
                            .not_null()
                            .default("Booked"),
                    )
                    .col(
                        ColumnDef::new(Bookings::PricePerNight)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_room")
                            .from(Bookings::Table, Bookings::RoomId)
                            .to(Rooms::Table, Rooms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_user")
                            .from(Bookings::Table, Bookings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_room")
                    .table(Bookings::Table)
                    .col(Bookings::RoomId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_user")
                    .table(Bookings::Table)
                    .col(Bookings::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_status")
                    .table(Bookings::Table)
                    .col(Bookings::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_check_in")
                    .table(Bookings::Table)
                    .col(Bookings::CheckInDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Bookings {
    Table,
    Id,
    RoomId,
    UserId,
    CheckInDate,
    CheckOutDate,
    ActualCheckOutDate,
    Status,
    PricePerNight,
    CreatedAt,
}
