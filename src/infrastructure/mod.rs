//! Infrastructure layer - external concerns

pub mod checkout;
pub mod crypto;
pub mod database;
pub mod notifier;
pub mod storage;

pub use checkout::DevCheckoutProvider;
pub use database::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};
pub use notifier::LogNotifier;
pub use storage::InMemoryRepositoryProvider;
