use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/bookings", post(handlers::booking::create_booking))
        .route("/api/bookings", get(handlers::booking::list_bookings))
        .route("/api/bookings/:id", get(handlers::booking::get_booking_detail))
        .route(
            "/api/bookings/:id/confirm",
            post(handlers::booking::confirm_booking),
        )
        .route(
            "/api/bookings/:id/cancel",
            post(handlers::booking::cancel_booking),
        )
}
