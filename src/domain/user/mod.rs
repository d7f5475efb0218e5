pub mod model;
pub mod repository;

pub use model::{Actor, User};
pub use repository::UserRepository;
