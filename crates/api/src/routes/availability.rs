use axum::{Router, routing::get};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/venues/:id/day",
            get(handlers::availability::get_day_config),
        )
        .route(
            "/api/venues/:id/availability",
            get(handlers::availability::get_availability),
        )
}
