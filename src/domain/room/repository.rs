//! Room repository interface

use async_trait::async_trait;

use super::model::Room;
use crate::domain::DomainResult;

#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn save(&self, room: Room) -> DomainResult<Room>;

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Room>>;

    async fn find_by_number(&self, number: &str) -> DomainResult<Option<Room>>;

    async fn list(&self) -> DomainResult<Vec<Room>>;

    async fn update(&self, room: &Room) -> DomainResult<()>;

    async fn delete(&self, id: i64) -> DomainResult<()>;
}
