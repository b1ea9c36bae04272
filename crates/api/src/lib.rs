//! # Courtbook API
//!
//! The API crate provides the web server for the court booking engine.
//! It exposes the availability read endpoints, the reservation and
//! lifecycle mutators, and the payment gateway callback.
//!
//! ## Architecture
//!
//! This crate follows a layered architecture:
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Implement request processing logic
//! - **Middleware**: Map domain errors onto HTTP responses
//! - **Config**: Handle environment and application configuration
//!
//! The API uses Axum as the web framework and SQLx for database
//! interactions. Domain logic lives in `courtbook-core`; handlers load
//! rows, call into the core, and persist through `courtbook-db`.

/// Configuration module for API settings
pub mod config;
/// Request handlers that implement business logic
pub mod handlers;
/// Middleware for error handling
pub mod middleware;
/// Notification sink implementations
pub mod notify;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use courtbook_core::notify::Notifier;
use eyre::{Result, WrapErr};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

/// Shared application state that is accessible to all request handlers.
pub struct ApiState {
    /// PostgreSQL connection pool for database operations
    pub db_pool: PgPool,
    /// How long a new booking may stay unpaid before the sweeper expires it
    pub payment_expiry_minutes: i64,
    /// Fire-and-forget notification sink
    pub notifier: Arc<dyn Notifier>,
}

/// Builds the CORS layer from the configured origins. A malformed origin
/// is a configuration error, surfaced at startup instead of a panic.
pub fn cors_layer(origins: &[String]) -> Result<tower_http::cors::CorsLayer> {
    let mut allowed = Vec::with_capacity(origins.len());
    for origin in origins {
        let value: HeaderValue = origin
            .parse()
            .wrap_err_with(|| format!("Invalid CORS origin '{origin}'"))?;
        allowed.push(value);
    }

    Ok(tower_http::cors::CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_origin(allowed)
        .allow_credentials(true))
}

/// Starts the API server with the provided configuration and database
/// connection. Initializes logging, builds the router, and serves until
/// shutdown.
pub async fn start_server(config: config::ApiConfig, db_pool: PgPool) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Create shared state with dependencies
    let state = Arc::new(ApiState {
        db_pool,
        payment_expiry_minutes: config.payment_expiry_minutes,
        notifier: Arc::new(notify::LogNotifier),
    });

    // Build the application router with all routes
    let app = Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Venue-day configuration and availability read endpoints
        .merge(routes::availability::routes())
        // Booking lifecycle endpoints
        .merge(routes::booking::routes())
        // Payment gateway callback
        .merge(routes::payment::routes())
        // Attach shared state to all routes
        .with_state(state);

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &config.cors_origins {
        app.layer(cors_layer(origins)?)
    } else {
        app
    };

    // Add request timeout middleware
    let app = app.layer(tower_http::timeout::TimeoutLayer::new(
        std::time::Duration::from_secs(config.request_timeout),
    ));

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
