//! SeaORM implementation of BookingRepository

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::domain::booking::{Booking, BookingFilter, BookingRepository, BookingStatus};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{booking, room};

pub struct SeaOrmBookingRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: booking::Model) -> Booking {
    Booking {
        id: m.id,
        room_id: m.room_id,
        user_id: m.user_id,
        check_in_date: m.check_in_date,
        check_out_date: m.check_out_date,
        actual_check_out_date: m.actual_check_out_date,
        status: BookingStatus::from_str(&m.status),
        price_per_night: m.price_per_night,
        created_at: m.created_at,
    }
}

fn domain_to_active(b: &Booking) -> booking::ActiveModel {
    booking::ActiveModel {
        id: Set(b.id),
        room_id: Set(b.room_id),
        user_id: Set(b.user_id),
        check_in_date: Set(b.check_in_date),
        check_out_date: Set(b.check_out_date),
        actual_check_out_date: Set(b.actual_check_out_date),
        status: Set(b.status.as_str().to_string()),
        price_per_night: Set(b.price_per_night),
        created_at: Set(b.created_at),
    }
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Validation(format!("Database error: {}", e))
}

// ── BookingRepository impl ──────────────────────────────────────

#[async_trait]
impl BookingRepository for SeaOrmBookingRepository {
    async fn save(&self, b: Booking) -> DomainResult<Booking> {
        debug!("Saving booking for room {} user {}", b.room_id, b.user_id);

        let mut model = domain_to_active(&b);
        model.id = NotSet;
        let inserted = model.insert(&self.db).await.map_err(db_err)?;
        Ok(model_to_domain(inserted))
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Booking>> {
        let model = booking::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn update(&self, b: &Booking) -> DomainResult<()> {
        debug!("Updating booking: {}", b.id);

        let existing = booking::Entity::find_by_id(b.id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        if existing.is_none() {
            return Err(DomainError::NotFound {
                entity: "Booking",
                field: "id",
                value: b.id.to_string(),
            });
        }

        domain_to_active(b).update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn find_overlapping(
        &self,
        room_id: i64,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> DomainResult<Vec<Booking>> {
        // Half-open intervals: a booking ending on `check_in` does not
        // collide with one starting the same day.
        let models = booking::Entity::find()
            .filter(booking::Column::RoomId.eq(room_id))
            .filter(
                booking::Column::Status
                    .is_in([BookingStatus::Booked.as_str(), BookingStatus::Active.as_str()]),
            )
            .filter(booking::Column::CheckInDate.lt(check_out))
            .filter(booking::Column::CheckOutDate.gt(check_in))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn list(&self, filter: &BookingFilter) -> DomainResult<Vec<Booking>> {
        let mut query = booking::Entity::find();

        if let Some(user_id) = filter.user_id {
            query = query.filter(booking::Column::UserId.eq(user_id));
        }
        if let Some(room_id) = filter.room_id {
            query = query.filter(booking::Column::RoomId.eq(room_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(booking::Column::Status.eq(status.as_str()));
        }
        if let Some(from_date) = filter.from_date {
            query = query.filter(booking::Column::CheckInDate.gte(from_date));
        }
        if let Some(to_date) = filter.to_date {
            query = query.filter(booking::Column::CheckOutDate.lte(to_date));
        }
        if let Some(room_type) = filter.room_type {
            query = query
                .inner_join(room::Entity)
                .filter(room::Column::RoomType.eq(room_type.as_str()));
        }

        let models = query
            .order_by_desc(booking::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn find_no_show_candidates(&self, today: NaiveDate) -> DomainResult<Vec<Booking>> {
        let models = booking::Entity::find()
            .filter(booking::Column::Status.eq(BookingStatus::Booked.as_str()))
            .filter(booking::Column::CheckInDate.lt(today))
            .order_by_asc(booking::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}
