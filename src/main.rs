//! Hotel Booking Service
//!
//! Booking lifecycle REST API with payment-gated state transitions.
//! Reads configuration from TOML file (~/.config/hotel-booking/config.toml).

use std::sync::Arc;

use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use hotel_booking::application::services::{
    start_charge_worker, start_no_show_sweep, start_payment_expiry_sweep, BookingService,
    ChargeQueue, PaymentService,
};
use hotel_booking::config::AppConfig;
use hotel_booking::infrastructure::crypto::jwt::JwtConfig;
use hotel_booking::infrastructure::database::migrator::Migrator;
use hotel_booking::infrastructure::{DevCheckoutProvider, LogNotifier};
use hotel_booking::shared::{KeyedLocks, ShutdownSignal};
use hotel_booking::{
    create_api_router, default_config_path, init_database, DatabaseConfig,
    SeaOrmRepositoryProvider,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = std::env::var("HOTEL_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| default_config_path());
    let app_cfg = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.logging.level)),
                )
                .init();
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .init();
            error!("Failed to load config: {}. Using defaults.", e);
            AppConfig::default()
        }
    };

    info!("Starting Hotel Booking Service...");

    let db_config = DatabaseConfig {
        url: app_cfg.database.url.clone(),
    };
    info!("Database: {}", db_config.url);

    let jwt_config = JwtConfig {
        secret: app_cfg.security.jwt_secret.clone(),
        expiration_hours: app_cfg.security.jwt_expiration_hours,
        issuer: "hotel-booking".to_string(),
    };

    // ── Database ───────────────────────────────────────────────
    let db = match init_database(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    info!("Running database migrations...");
    if let Err(e) = Migrator::up(&db, None).await {
        error!("Failed to run migrations: {}", e);
        return Err(e.into());
    }
    info!("Migrations completed");

    let repos: Arc<dyn hotel_booking::domain::RepositoryProvider> =
        Arc::new(SeaOrmRepositoryProvider::new(db.clone()));

    // Create default staff user if no users exist
    create_default_staff(repos.as_ref(), &app_cfg).await;

    // ── Services ───────────────────────────────────────────────
    let checkout = Arc::new(DevCheckoutProvider::new(
        app_cfg.payments.checkout_base_url.clone(),
    ));
    // One lock map for all booking transitions, settlement included
    let booking_locks = KeyedLocks::new();
    let payment_service = Arc::new(PaymentService::new(
        repos.clone(),
        checkout,
        booking_locks.clone(),
        app_cfg.payments.expiry_hours,
    ));

    let (charge_queue, charge_receiver) = ChargeQueue::new();
    let booking_service = Arc::new(BookingService::new(
        repos.clone(),
        charge_queue,
        Arc::new(LogNotifier),
        booking_locks,
    ));

    // ── Background tasks ───────────────────────────────────────
    let shutdown = ShutdownSignal::new();
    shutdown.listen_for_os_signals();

    start_charge_worker(
        repos.clone(),
        payment_service.clone(),
        charge_receiver,
        shutdown.clone(),
    );
    start_no_show_sweep(
        booking_service.clone(),
        app_cfg.sweeps.no_show_interval_secs,
        shutdown.clone(),
    );
    start_payment_expiry_sweep(
        payment_service.clone(),
        app_cfg.sweeps.payment_expiry_interval_secs,
        shutdown.clone(),
    );

    // ── REST API ───────────────────────────────────────────────
    let api_router = create_api_router(
        repos,
        booking_service,
        payment_service,
        db.clone(),
        jwt_config,
        app_cfg.security.webhook_secret.clone(),
    );

    let api_addr = app_cfg.server.address();
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("REST API server listening on http://{}", api_addr);
    info!("Swagger UI available at http://{}/docs/", api_addr);

    let api_shutdown = shutdown.clone();
    axum::serve(listener, api_router)
        .with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("REST API server received shutdown signal");
        })
        .await?;

    // ── Cleanup ────────────────────────────────────────────────
    if let Err(e) = db.close().await {
        warn!("Error closing database connection: {}", e);
    } else {
        info!("Database connection closed");
    }

    info!("Hotel Booking Service shutdown complete");
    Ok(())
}

/// Create a default staff account on first start so the API is usable
/// out of the box.
async fn create_default_staff(
    repos: &dyn hotel_booking::domain::RepositoryProvider,
    app_cfg: &AppConfig,
) {
    use hotel_booking::domain::user::User;
    use hotel_booking::infrastructure::crypto::password::hash_password;

    let user_count = match repos.users().count().await {
        Ok(count) => count,
        Err(e) => {
            warn!("Could not count users, skipping staff bootstrap: {}", e);
            return;
        }
    };
    if user_count > 0 {
        return;
    }

    let password_hash = match hash_password(&app_cfg.admin.password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Could not hash default staff password: {}", e);
            return;
        }
    };

    match repos
        .users()
        .save(User::new(
            app_cfg.admin.email.clone(),
            "Hotel",
            "Staff",
            password_hash,
            true,
        ))
        .await
    {
        Ok(user) => info!("Created default staff user: {}", user.email),
        Err(e) => warn!("Could not create default staff user: {}", e),
    }
}
