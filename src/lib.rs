//! # Hotel Booking Service
//!
//! Room booking lifecycle with payment-gated state transitions.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Core business entities, state machines and repository traits
//! - **application**: Use-case services, deferred charge worker and sweeps
//! - **infrastructure**: Database (SeaORM), checkout provider, crypto, notifier
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: Retry and shutdown utilities

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};

// Re-export API router
pub use interfaces::http::create_api_router;
