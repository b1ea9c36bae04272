//! # Availability Handlers
//!
//! Read endpoints projecting one venue-day into what a booking UI renders:
//! the effective day configuration and the per-court hour grid.
//!
//! ## Layering
//!
//! For each active court and each hour of the day, a cell is unavailable
//! when the hour falls outside the resolved opening window, when the date
//! is a venue holiday, when the hour intersects a blackout window on that
//! court, or when an active booking already claims the cell. Free cells
//! carry the hourly price from the resolved rules, falling back to the
//! venue base price.
//!
//! These projections are advisory. The mutual-exclusion guarantee lives
//! in the reservation transaction; a cell shown free here can still be
//! lost to a concurrent writer, which the reserve call reports as a
//! structured conflict.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{NaiveDate, NaiveTime};
use courtbook_core::{
    availability::{CourtAvailability, court_day_grid},
    errors::BookingError,
    models::venue::{BlackoutSlot, OpeningHours, PriceRule, Venue},
    resolver::ResolvedDay,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError};

/// Query parameter shared by the read endpoints: the calendar date.
#[derive(Debug, Deserialize)]
pub struct DateQuery {
    /// ISO calendar date, `YYYY-MM-DD`
    pub date: String,
}

impl DateQuery {
    fn parse(&self) -> Result<NaiveDate, AppError> {
        self.date.parse().map_err(|_| {
            AppError(BookingError::Validation(format!(
                "invalid date '{}', expected YYYY-MM-DD",
                self.date
            )))
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PriceRuleView {
    pub time_from: NaiveTime,
    pub time_to: NaiveTime,
    pub pre_booked_price: i64,
    pub walk_in_price: i64,
}

#[derive(Debug, Serialize)]
pub struct DayConfigResponse {
    pub venue_id: Uuid,
    pub date: NaiveDate,
    pub weekday: u8,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub price_rules: Vec<PriceRuleView>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub venue_id: Uuid,
    pub date: NaiveDate,
    pub courts: Vec<CourtAvailability>,
}

/// Loads a venue and resolves its configuration for one date.
async fn load_resolved_day(
    state: &ApiState,
    venue_id: Uuid,
    date: NaiveDate,
) -> Result<(Venue, ResolvedDay), AppError> {
    let venue = courtbook_db::repositories::venue::get_venue_by_id(&state.db_pool, venue_id)
        .await?
        .ok_or_else(|| BookingError::NotFound(format!("Venue with ID {venue_id} not found")))?;
    let venue: Venue = venue.into();

    let opening_hours: Vec<OpeningHours> =
        courtbook_db::repositories::venue::get_opening_hours(&state.db_pool, venue_id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
    let price_rules: Vec<PriceRule> =
        courtbook_db::repositories::venue::get_price_rules(&state.db_pool, venue_id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

    Ok((venue, ResolvedDay::resolve(date, &opening_hours, &price_rules)))
}

/// Resolved day configuration for one venue and date.
///
/// # Endpoint
///
/// ```text
/// GET /api/venues/:id/day?date=2025-03-04
/// ```
#[axum::debug_handler]
pub async fn get_day_config(
    State(state): State<Arc<ApiState>>,
    Path(venue_id): Path<Uuid>,
    Query(query): Query<DateQuery>,
) -> Result<Json<DayConfigResponse>, AppError> {
    let date = query.parse()?;
    let (venue, day) = load_resolved_day(&state, venue_id, date).await?;

    Ok(Json(DayConfigResponse {
        venue_id: venue.id,
        date,
        weekday: day.weekday,
        open_time: day.open_time,
        close_time: day.close_time,
        price_rules: day
            .rules
            .iter()
            .map(|r| PriceRuleView {
                time_from: r.time_from,
                time_to: r.time_to,
                pre_booked_price: r.pre_booked_price,
                walk_in_price: r.walk_in_price,
            })
            .collect(),
    }))
}

/// Per-court availability grid for one venue and date.
///
/// # Endpoint
///
/// ```text
/// GET /api/venues/:id/availability?date=2025-03-04
/// ```
#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<ApiState>>,
    Path(venue_id): Path<Uuid>,
    Query(query): Query<DateQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let date = query.parse()?;
    let (venue, day) = load_resolved_day(&state, venue_id, date).await?;

    let courts =
        courtbook_db::repositories::venue::list_active_courts(&state.db_pool, venue_id).await?;
    let is_holiday =
        courtbook_db::repositories::venue::is_holiday(&state.db_pool, venue_id, date).await?;
    let blackouts: Vec<BlackoutSlot> =
        courtbook_db::repositories::venue::get_blackouts(&state.db_pool, venue_id, date)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
    let occupied =
        courtbook_db::repositories::venue::occupied_cells(&state.db_pool, venue_id, date).await?;

    let grids = courts
        .into_iter()
        .map(|court| {
            let court_blackouts: Vec<BlackoutSlot> = blackouts
                .iter()
                .filter(|b| b.court_id == court.id)
                .cloned()
                .collect();
            let court_occupied: HashSet<u8> = occupied
                .iter()
                .filter(|(court_id, _)| *court_id == court.id)
                .map(|(_, hour)| (*hour).max(0) as u8)
                .collect();

            CourtAvailability {
                court_id: court.id,
                court_name: court.name,
                hours: court_day_grid(
                    &day,
                    venue.base_price,
                    is_holiday,
                    &court_blackouts,
                    &court_occupied,
                ),
            }
        })
        .collect();

    Ok(Json(AvailabilityResponse {
        venue_id,
        date,
        courts: grids,
    }))
}
