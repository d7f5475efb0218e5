//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::services::{BookingService, PaymentService};
use crate::domain::RepositoryProvider;
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::interfaces::http::common::{ApiResponse, EmptyData};
use crate::interfaces::http::middleware::{auth_middleware, AuthState};
use crate::interfaces::http::modules::{auth, bookings, health, payments, rooms};

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Auth
        auth::login,
        auth::register,
        auth::get_current_user,
        // Rooms
        rooms::list_rooms,
        rooms::get_room,
        rooms::create_room,
        rooms::update_room,
        rooms::delete_room,
        // Bookings
        bookings::create_booking,
        bookings::list_bookings,
        bookings::get_booking,
        bookings::check_in,
        bookings::cancel_booking,
        bookings::check_out,
        bookings::mark_no_show,
        // Payments
        payments::list_payments,
        payments::get_payment,
        payments::renew_payment,
        payments::checkout_webhook,
        payments::payment_success,
        payments::payment_cancel,
    ),
    components(
        schemas(
            // Common
            ApiResponse<String>,
            EmptyData,
            // Auth
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserInfo,
            // Rooms
            rooms::RoomDto,
            rooms::CreateRoomRequest,
            rooms::UpdateRoomRequest,
            // Bookings
            bookings::BookingDto,
            bookings::CreateBookingRequest,
            // Payments
            payments::PaymentDto,
            payments::CheckoutWebhookPayload,
            payments::WebhookOutcomeDto,
            payments::RedirectMessageDto,
            // Health
            health::HealthResponse,
            health::ComponentHealth,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Authentication", description = "Guest registration and JWT login"),
        (name = "Rooms", description = "Room catalogue; mutations are staff-only"),
        (name = "Bookings", description = "Booking lifecycle: create, check-in, cancel, check-out, no-show"),
        (name = "Payments", description = "Charge ledger, renewal and settlement webhook"),
    ),
    info(
        title = "Hotel Booking Service API",
        version = "0.1.0",
        description = "REST API for room bookings with payment-gated lifecycle transitions",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(
    repos: Arc<dyn RepositoryProvider>,
    booking_service: Arc<BookingService>,
    payment_service: Arc<PaymentService>,
    db: DatabaseConnection,
    jwt_config: JwtConfig,
    webhook_secret: String,
) -> Router {
    let middleware_state = AuthState {
        jwt_config: jwt_config.clone(),
    };

    let auth_state = auth::AuthHandlerState {
        repos: Arc::clone(&repos),
        jwt_config,
    };
    let room_state = rooms::RoomHandlerState {
        repos: Arc::clone(&repos),
    };
    let booking_state = bookings::BookingHandlerState {
        repos: Arc::clone(&repos),
        bookings: booking_service,
    };
    let payment_state = payments::PaymentHandlerState {
        payments: payment_service,
        webhook_secret,
    };
    let health_state = health::HealthState {
        db,
        started_at: Arc::new(Instant::now()),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .with_state(auth_state.clone());

    // Auth routes (protected)
    let auth_protected_routes = Router::new()
        .route("/me", get(auth::get_current_user))
        .layer(middleware::from_fn_with_state(
            middleware_state.clone(),
            auth_middleware,
        ))
        .with_state(auth_state);

    // Room routes (protected; staff checks happen in the handlers)
    let room_routes = Router::new()
        .route("/", get(rooms::list_rooms).post(rooms::create_room))
        .route(
            "/{id}",
            get(rooms::get_room)
                .put(rooms::update_room)
                .delete(rooms::delete_room),
        )
        .layer(middleware::from_fn_with_state(
            middleware_state.clone(),
            auth_middleware,
        ))
        .with_state(room_state);

    // Booking routes (protected)
    let booking_routes = Router::new()
        .route(
            "/",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/{id}", get(bookings::get_booking))
        .route("/{id}/check-in", post(bookings::check_in))
        .route("/{id}/cancel", post(bookings::cancel_booking))
        .route("/{id}/check-out", post(bookings::check_out))
        .route("/{id}/no-show", post(bookings::mark_no_show))
        .layer(middleware::from_fn_with_state(
            middleware_state.clone(),
            auth_middleware,
        ))
        .with_state(booking_state);

    // Payment routes (protected)
    let payment_routes = Router::new()
        .route("/", get(payments::list_payments))
        .route("/{id}", get(payments::get_payment))
        .route("/{id}/renew", post(payments::renew_payment))
        .layer(middleware::from_fn_with_state(
            middleware_state,
            auth_middleware,
        ))
        .with_state(payment_state.clone());

    // Public payment endpoints: checkout redirect landing pages and
    // the settlement webhook (authenticated by HMAC signature, not JWT)
    let payment_public_routes = Router::new()
        .route("/success", get(payments::payment_success))
        .route("/cancel", get(payments::payment_cancel))
        .route("/webhook", post(payments::checkout_webhook))
        .with_state(payment_state);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    // Build router
    Router::new()
        // Swagger UI
        .merge(swagger_routes)
        // Health
        .route("/health", get(health::health_check).with_state(health_state))
        // Auth
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/auth", auth_protected_routes)
        // Rooms
        .nest("/api/v1/rooms", room_routes)
        // Bookings
        .nest("/api/v1/bookings", booking_routes)
        // Payments
        .nest("/api/v1/payments", payment_public_routes)
        .nest("/api/v1/payments", payment_routes)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
