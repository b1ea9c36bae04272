//! # Payment Reconciliation
//!
//! Callback handler for the external payment gateway. The gateway's order
//! id is the booking code handed over at checkout; the callback drives
//! the lifecycle machine. The race against the expiration sweeper is
//! settled by the store's conditional status update: whichever write
//! commits first wins, and the loser observes an idempotent no-op or a
//! benign illegal-transition report here.

use axum::{Json, extract::State};
use chrono::Utc;
use courtbook_core::{
    errors::BookingError,
    lifecycle::{TransitionActor, TransitionOutcome},
    models::booking::PaymentCallbackRequest,
    notify::NotificationKind,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::{ApiState, middleware::error_handling::AppError, notify};

#[derive(Debug, Serialize)]
pub struct PaymentCallbackResponse {
    pub booking_code: String,
    /// `confirmed`, `cancelled`, or `ignored` (late callback for a
    /// booking already settled the other way)
    pub result: String,
}

/// Handles `onPaymentResult` from the gateway.
///
/// # Endpoint
///
/// ```text
/// POST /api/payments/callback
/// ```
///
/// On success the booking moves PENDING_PAYMENT -> CONFIRMED; duplicates
/// are no-ops. A success callback for a booking the sweeper already
/// expired is reported as `ignored`, not an error: the store decided the
/// race. On failure the booking is cancelled with reason `payment-failed`
/// when still pending.
#[axum::debug_handler]
pub async fn payment_callback(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<PaymentCallbackRequest>,
) -> Result<Json<PaymentCallbackResponse>, AppError> {
    let booking =
        courtbook_db::repositories::booking::get_booking_by_code(&state.db_pool, &request.order_id)
            .await?
            .ok_or_else(|| {
                BookingError::NotFound(format!(
                    "No booking for payment order '{}'",
                    request.order_id
                ))
            })?;

    tracing::info!(
        "Payment callback: order_id={}, provider={}, success={}, booking_id={}",
        request.order_id,
        request.provider_code,
        request.success,
        booking.id
    );

    let recipient = booking
        .user_id
        .map(|id| id.to_string())
        .or_else(|| booking.guest_phone.clone())
        .unwrap_or_else(|| booking.code.clone());

    let result = if request.success {
        match courtbook_db::repositories::booking::confirm_booking(&state.db_pool, booking.id).await
        {
            Ok(TransitionOutcome::Applied) => {
                tracing::info!(
                    "Booking confirmed by payment: id={}, actor={}, at={}",
                    booking.id,
                    TransitionActor::System,
                    Utc::now()
                );
                notify::fire(
                    state.notifier.as_ref(),
                    &recipient,
                    NotificationKind::BookingConfirmed,
                    json!({ "booking_id": booking.id, "code": booking.code }),
                )
                .await;
                "confirmed"
            }
            Ok(TransitionOutcome::NoOp) => {
                tracing::debug!("Duplicate payment callback ignored: id={}", booking.id);
                "confirmed"
            }
            // The sweeper expired the booking first. Benign race loss,
            // not a caller error.
            Err(BookingError::IllegalTransition { from, .. }) => {
                tracing::warn!(
                    "Payment arrived after booking was {}: id={}, order_id={}",
                    from,
                    booking.id,
                    request.order_id
                );
                "ignored"
            }
            Err(err) => return Err(err.into()),
        }
    } else {
        match courtbook_db::repositories::booking::cancel_booking(
            &state.db_pool,
            booking.id,
            "payment-failed",
        )
        .await
        {
            Ok(TransitionOutcome::Applied) => {
                tracing::info!(
                    "Booking cancelled by payment failure: id={}, at={}",
                    booking.id,
                    Utc::now()
                );
                notify::fire(
                    state.notifier.as_ref(),
                    &recipient,
                    NotificationKind::PaymentFailed,
                    json!({ "booking_id": booking.id, "code": booking.code }),
                )
                .await;
                "cancelled"
            }
            Ok(TransitionOutcome::NoOp) => "cancelled",
            // Already confirmed; a late failure callback never unwinds a
            // confirmed booking.
            Err(BookingError::IllegalTransition { .. }) => {
                tracing::warn!(
                    "Failure callback for already-confirmed booking ignored: id={}",
                    booking.id
                );
                "ignored"
            }
            Err(err) => return Err(err.into()),
        }
    };

    Ok(Json(PaymentCallbackResponse {
        booking_code: booking.code,
        result: result.to_string(),
    }))
}
