//! # Booking Handlers
//!
//! Reservation creation and the lifecycle mutators. The handlers load
//! configuration rows, let `courtbook-core` validate and price the
//! request, and hand the resulting plan to the storage layer, which owns
//! the atomic claim. Lifecycle transitions log the driving actor and
//! request a notification; notification failures never fail the
//! transition itself.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{Duration, Utc};
use courtbook_core::{
    errors::BookingError,
    lifecycle::{TransitionActor, TransitionOutcome},
    models::booking::{
        AddonItem, Booking, BookingDetailResponse, BookingItemResponse, BookingResponse,
        BookingStatus, CancelBookingRequest, CreateBookingRequest,
    },
    models::venue::{BlackoutSlot, Court, OpeningHours, PriceRule},
    notify::NotificationKind,
    reserve::plan_reservation,
    resolver::ResolvedDay,
};
use courtbook_db::models::{DbBooking, DbBookingItem};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError, notify};

fn item_response(item: &DbBookingItem) -> BookingItemResponse {
    BookingItemResponse {
        court_id: item.court_id,
        slot_date: item.slot_date,
        slot_start: item.slot_start.max(0) as u8,
        slot_end: item.slot_end.max(0) as u8,
        unit_price: item.unit_price,
        line_amount: item.line_amount,
    }
}

fn into_model(booking: DbBooking) -> Result<Booking, AppError> {
    let id = booking.id;
    booking.into_model().ok_or_else(|| {
        AppError(BookingError::Internal(
            format!("booking {id} has an unknown status code").into(),
        ))
    })
}

/// Notification target for a booking: the user id, or the guest phone
/// snapshot for guest bookings.
fn recipient_of(booking: &DbBooking) -> String {
    booking
        .user_id
        .map(|id| id.to_string())
        .or_else(|| booking.guest_phone.clone())
        .unwrap_or_else(|| booking.code.clone())
}

/// Creates a booking over a set of requested cells.
///
/// # Endpoint
///
/// ```text
/// POST /api/bookings
/// ```
///
/// Validation (non-empty cell set, active venue and courts, holiday,
/// opening hours, blackouts) and pricing happen before the transaction;
/// the cell claim itself is decided by the storage layer's active-cell
/// uniqueness, so a raced request comes back as a 409 naming exactly the
/// cells that were lost.
#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let venue_id = request.venue_id;
    let venue = courtbook_db::repositories::venue::get_venue_by_id(&state.db_pool, venue_id)
        .await?
        .ok_or_else(|| BookingError::NotFound(format!("Venue with ID {venue_id} not found")))?;
    let venue = courtbook_core::models::venue::Venue::from(venue);

    let courts: Vec<Court> =
        courtbook_db::repositories::venue::list_active_courts(&state.db_pool, venue_id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
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
    let is_holiday =
        courtbook_db::repositories::venue::is_holiday(&state.db_pool, venue_id, request.date)
            .await?;
    let blackouts: Vec<BlackoutSlot> =
        courtbook_db::repositories::venue::get_blackouts(&state.db_pool, venue_id, request.date)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

    let day = ResolvedDay::resolve(request.date, &opening_hours, &price_rules);
    let plan = plan_reservation(
        &venue,
        &courts,
        &day,
        request.date,
        is_holiday,
        &blackouts,
        request.user_id,
        request.guest.as_ref(),
        &request.cells,
        request.discount,
        &request.addons,
    )?;

    let payment_expires_at = Utc::now() + Duration::minutes(state.payment_expiry_minutes);
    let (booking, items) = courtbook_db::repositories::booking::create_booking(
        &state.db_pool,
        &plan,
        request.user_id,
        request.guest.as_ref(),
        &request.addons,
        request.note.as_deref(),
        payment_expires_at,
    )
    .await?;

    tracing::info!(
        "Booking created: id={}, code={}, total={}, expires_at={}",
        booking.id,
        booking.code,
        booking.total_amount,
        booking.payment_expires_at
    );
    notify::fire(
        state.notifier.as_ref(),
        &recipient_of(&booking),
        NotificationKind::BookingCreated,
        json!({ "booking_id": booking.id, "code": booking.code, "total": booking.total_amount }),
    )
    .await;

    Ok(Json(BookingResponse {
        id: booking.id,
        code: booking.code.clone(),
        status: BookingStatus::PendingPayment,
        gross_amount: booking.gross_amount,
        discount: booking.discount,
        addons_total: booking.addons_total,
        total_amount: booking.total_amount,
        payment_expires_at: booking.payment_expires_at,
        items: items.iter().map(item_response).collect(),
    }))
}

/// PENDING_PAYMENT -> CONFIRMED, driven by payment reconciliation.
///
/// # Endpoint
///
/// ```text
/// POST /api/bookings/:id/confirm
/// ```
///
/// Idempotent: confirming an already-confirmed booking is a safe no-op,
/// which is how duplicate payment callbacks are tolerated.
#[axum::debug_handler]
pub async fn confirm_booking(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let outcome = courtbook_db::repositories::booking::confirm_booking(&state.db_pool, id).await?;

    let booking = courtbook_db::repositories::booking::get_booking_by_id(&state.db_pool, id)
        .await?
        .ok_or_else(|| BookingError::NotFound(format!("Booking with ID {id} not found")))?;

    match outcome {
        TransitionOutcome::Applied => {
            tracing::info!(
                "Booking confirmed: id={}, actor={}, at={}",
                id,
                TransitionActor::System,
                Utc::now()
            );
            notify::fire(
                state.notifier.as_ref(),
                &recipient_of(&booking),
                NotificationKind::BookingConfirmed,
                json!({ "booking_id": id, "code": booking.code }),
            )
            .await;
        }
        TransitionOutcome::NoOp => {
            tracing::debug!("Booking already confirmed, treating as no-op: id={}", id);
        }
    }

    Ok(Json(into_model(booking)?))
}

/// PENDING_PAYMENT -> CANCELLED, by the user or by payment failure.
///
/// # Endpoint
///
/// ```text
/// POST /api/bookings/:id/cancel
/// ```
///
/// Cancelling an already-cancelled booking is a safe no-op. Cancelling a
/// confirmed booking is not covered by this core and returns a conflict.
#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<CancelBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    if request.reason.trim().is_empty() {
        return Err(AppError(BookingError::Validation(
            "a cancellation reason is required".into(),
        )));
    }

    let outcome =
        courtbook_db::repositories::booking::cancel_booking(&state.db_pool, id, &request.reason)
            .await?;

    let booking = courtbook_db::repositories::booking::get_booking_by_id(&state.db_pool, id)
        .await?
        .ok_or_else(|| BookingError::NotFound(format!("Booking with ID {id} not found")))?;

    match outcome {
        TransitionOutcome::Applied => {
            tracing::info!(
                "Booking cancelled: id={}, reason={}, actor={}, at={}",
                id,
                request.reason,
                TransitionActor::User,
                Utc::now()
            );
            notify::fire(
                state.notifier.as_ref(),
                &recipient_of(&booking),
                NotificationKind::BookingCancelled,
                json!({ "booking_id": id, "code": booking.code, "reason": request.reason }),
            )
            .await;
        }
        TransitionOutcome::NoOp => {
            tracing::debug!("Booking already cancelled, treating as no-op: id={}", id);
        }
    }

    Ok(Json(into_model(booking)?))
}

/// Query parameters for the booking history endpoint.
#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    pub user_id: Uuid,
    /// Optional status code filter (e.g. `CONFIRMED`)
    pub status: Option<String>,
}

/// Booking history for one user.
///
/// # Endpoint
///
/// ```text
/// GET /api/bookings?user_id=...&status=CONFIRMED
/// ```
#[axum::debug_handler]
pub async fn list_bookings(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let status = match &query.status {
        Some(code) => Some(BookingStatus::from_code(code).ok_or_else(|| {
            AppError(BookingError::Validation(format!(
                "unknown status code '{code}'"
            )))
        })?),
        None => None,
    };

    let rows = courtbook_db::repositories::booking::list_bookings_by_user(
        &state.db_pool,
        query.user_id,
        status,
    )
    .await?;

    let bookings = rows
        .into_iter()
        .map(into_model)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(bookings))
}

/// Full booking detail: the aggregate, its claimed cells, and add-ons.
///
/// # Endpoint
///
/// ```text
/// GET /api/bookings/:id
/// ```
#[axum::debug_handler]
pub async fn get_booking_detail(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingDetailResponse>, AppError> {
    let booking = courtbook_db::repositories::booking::get_booking_by_id(&state.db_pool, id)
        .await?
        .ok_or_else(|| BookingError::NotFound(format!("Booking with ID {id} not found")))?;

    let items = courtbook_db::repositories::booking::get_booking_items(&state.db_pool, id).await?;
    let addons = courtbook_db::repositories::booking::get_booking_addons(&state.db_pool, id).await?;

    Ok(Json(BookingDetailResponse {
        booking: into_model(booking)?,
        items: items.iter().map(item_response).collect(),
        addons: addons
            .into_iter()
            .map(|a| AddonItem {
                name: a.name,
                amount: a.amount,
            })
            .collect(),
    }))
}
