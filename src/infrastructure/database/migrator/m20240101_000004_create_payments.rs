//! Create payments table
//!
//! Settlement callbacks look payments up by checkout session id, and
//! the expiry sweep scans Pending rows by age.

use sea_orm_migration::prelude::*;

use super::m20240101_000003_create_bookings::Bookings;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payments::BookingId).big_integer().not_null())
                    .col(ColumnDef::new(Payments::PaymentType).string().not_null())
                    .col(
                        ColumnDef::new(Payments::Status)
                            .string()
                            .not_null()
                            .default("Pending"),
                    )
                    .col(
                        ColumnDef::new(Payments::MoneyToPay)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Payments::SessionId).string())
                    .col(ColumnDef::new(Payments::SessionUrl).string())
                    .col(
                        ColumnDef::new(Payments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_booking")
                            .from(Payments::Table, Payments::BookingId)
                            .to(Bookings::Table, Bookings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payments_booking")
                    .table(Payments::Table)
                    .col(Payments::BookingId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payments_session")
                    .table(Payments::Table)
                    .col(Payments::SessionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payments_status")
                    .table(Payments::Table)
                    .col(Payments::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Payments {
    Table,
    Id,
    BookingId,
    PaymentType,
    Status,
    MoneyToPay,
    SessionId,
    SessionUrl,
    CreatedAt,
}
