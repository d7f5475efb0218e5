//! SeaORM implementation of RoomRepository

use async_trait::async_trait;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::room::{Room, RoomRepository, RoomType};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::room;

pub struct SeaOrmRoomRepository {
    db: DatabaseConnection,
}

impl SeaOrmRoomRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: room::Model) -> Room {
    Room {
        id: m.id,
        number: m.number,
        // Stored values come from RoomType::as_str, so the fallback
        // only covers hand-edited rows.
        room_type: RoomType::from_str(&m.room_type).unwrap_or(RoomType::Single),
        price_per_night: m.price_per_night,
        capacity: m.capacity,
    }
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Validation(format!("Database error: {}", e))
}

// ── RoomRepository impl ─────────────────────────────────────────

#[async_trait]
impl RoomRepository for SeaOrmRoomRepository {
    async fn save(&self, r: Room) -> DomainResult<Room> {
        debug!("Saving room: {}", r.number);

        let model = room::ActiveModel {
            id: NotSet,
            number: Set(r.number),
            room_type: Set(r.room_type.as_str().to_string()),
            price_per_night: Set(r.price_per_night),
            capacity: Set(r.capacity),
        };
        let inserted = model.insert(&self.db).await.map_err(db_err)?;
        Ok(model_to_domain(inserted))
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Room>> {
        let model = room::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_number(&self, number: &str) -> DomainResult<Option<Room>> {
        let model = room::Entity::find()
            .filter(room::Column::Number.eq(number))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn list(&self) -> DomainResult<Vec<Room>> {
        let models = room::Entity::find()
            .order_by_asc(room::Column::Number)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn update(&self, r: &Room) -> DomainResult<()> {
        debug!("Updating room: {}", r.id);

        let existing = room::Entity::find_by_id(r.id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        if existing.is_none() {
            return Err(DomainError::NotFound {
                entity: "Room",
                field: "id",
                value: r.id.to_string(),
            });
        }

        let model = room::ActiveModel {
            id: Set(r.id),
            number: Set(r.number.clone()),
            room_type: Set(r.room_type.as_str().to_string()),
            price_per_night: Set(r.price_per_night),
            capacity: Set(r.capacity),
        };
        model.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> DomainResult<()> {
        let Some(existing) = room::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Err(DomainError::NotFound {
                entity: "Room",
                field: "id",
                value: id.to_string(),
            });
        };

        existing.delete(&self.db).await.map_err(db_err)?;
        Ok(())
    }
}
