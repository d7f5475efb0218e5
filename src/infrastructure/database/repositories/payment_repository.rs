//! SeaORM implementation of PaymentRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::payment::{Payment, PaymentRepository, PaymentStatus, PaymentType};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{booking, payment};

pub struct SeaOrmPaymentRepository {
    db: DatabaseConnection,
}

impl SeaOrmPaymentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: payment::Model) -> Payment {
    Payment {
        id: m.id,
        booking_id: m.booking_id,
        payment_type: PaymentType::from_str(&m.payment_type),
        status: PaymentStatus::from_str(&m.status),
        money_to_pay: m.money_to_pay,
        session_id: m.session_id,
        session_url: m.session_url,
        created_at: m.created_at,
    }
}

fn domain_to_active(p: &Payment) -> payment::ActiveModel {
    payment::ActiveModel {
        id: Set(p.id),
        booking_id: Set(p.booking_id),
        payment_type: Set(p.payment_type.as_str().to_string()),
        status: Set(p.status.as_str().to_string()),
        money_to_pay: Set(p.money_to_pay),
        session_id: Set(p.session_id.clone()),
        session_url: Set(p.session_url.clone()),
        created_at: Set(p.created_at),
    }
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Validation(format!("Database error: {}", e))
}

// ── PaymentRepository impl ──────────────────────────────────────

#[async_trait]
impl PaymentRepository for SeaOrmPaymentRepository {
    async fn save(&self, p: Payment) -> DomainResult<Payment> {
        debug!(
            "Saving {} payment for booking {}",
            p.payment_type, p.booking_id
        );

        let mut model = domain_to_active(&p);
        model.id = NotSet;
        let inserted = model.insert(&self.db).await.map_err(db_err)?;
        Ok(model_to_domain(inserted))
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Payment>> {
        let model = payment::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn update(&self, p: &Payment) -> DomainResult<()> {
        debug!("Updating payment: {}", p.id);

        let existing = payment::Entity::find_by_id(p.id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        if existing.is_none() {
            return Err(DomainError::NotFound {
                entity: "Payment",
                field: "id",
                value: p.id.to_string(),
            });
        }

        domain_to_active(p).update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn find_by_session_id(&self, session_id: &str) -> DomainResult<Option<Payment>> {
        let model = payment::Entity::find()
            .filter(payment::Column::SessionId.eq(session_id))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_open_for_booking(
        &self,
        booking_id: i64,
        payment_type: PaymentType,
    ) -> DomainResult<Option<Payment>> {
        let model = payment::Entity::find()
            .filter(payment::Column::BookingId.eq(booking_id))
            .filter(payment::Column::PaymentType.eq(payment_type.as_str()))
            .filter(
                payment::Column::Status
                    .is_in([PaymentStatus::Pending.as_str(), PaymentStatus::Paid.as_str()]),
            )
            .order_by_desc(payment::Column::Id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn list_for_booking(&self, booking_id: i64) -> DomainResult<Vec<Payment>> {
        let models = payment::Entity::find()
            .filter(payment::Column::BookingId.eq(booking_id))
            .order_by_asc(payment::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn list(&self, user_id: Option<i64>) -> DomainResult<Vec<Payment>> {
        let mut query = payment::Entity::find();

        if let Some(user_id) = user_id {
            query = query
                .inner_join(booking::Entity)
                .filter(booking::Column::UserId.eq(user_id));
        }

        let models = query
            .order_by_desc(payment::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn user_has_pending(&self, user_id: i64) -> DomainResult<bool> {
        let count = payment::Entity::find()
            .inner_join(booking::Entity)
            .filter(booking::Column::UserId.eq(user_id))
            .filter(payment::Column::Status.eq(PaymentStatus::Pending.as_str()))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    async fn find_stale_pending(&self, cutoff: DateTime<Utc>) -> DomainResult<Vec<Payment>> {
        let models = payment::Entity::find()
            .filter(payment::Column::Status.eq(PaymentStatus::Pending.as_str()))
            .filter(payment::Column::CreatedAt.lt(cutoff))
            .order_by_asc(payment::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}
