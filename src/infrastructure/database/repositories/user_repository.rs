//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set,
};

use crate::domain::user::{User, UserRepository};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::user;

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: user::Model) -> User {
    User {
        id: m.id,
        email: m.email,
        first_name: m.first_name,
        last_name: m.last_name,
        password_hash: m.password_hash,
        is_staff: m.is_staff,
        created_at: m.created_at,
    }
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Validation(format!("Database error: {}", e))
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn save(&self, u: User) -> DomainResult<User> {
        debug!("Saving user: {}", u.email);

        let model = user::ActiveModel {
            id: NotSet,
            email: Set(u.email),
            first_name: Set(u.first_name),
            last_name: Set(u.last_name),
            password_hash: Set(u.password_hash),
            is_staff: Set(u.is_staff),
            created_at: Set(u.created_at),
        };
        let inserted = model.insert(&self.db).await.map_err(db_err)?;
        Ok(model_to_domain(inserted))
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn count(&self) -> DomainResult<u64> {
        user::Entity::find().count(&self.db).await.map_err(db_err)
    }
}
