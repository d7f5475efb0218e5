//! SeaORM repository implementations

pub mod booking_repository;
pub mod payment_repository;
pub mod repository_provider;
pub mod room_repository;
pub mod user_repository;

pub use booking_repository::SeaOrmBookingRepository;
pub use payment_repository::SeaOrmPaymentRepository;
pub use repository_provider::SeaOrmRepositoryProvider;
pub use room_repository::SeaOrmRoomRepository;
pub use user_repository::SeaOrmUserRepository;
