pub mod model;
pub mod repository;

pub use model::{Room, RoomType};
pub use repository::RoomRepository;
