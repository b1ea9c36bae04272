//! Payment reconciliation decision logic against mock repositories: the
//! callback must classify store outcomes (applied, duplicate, raced)
//! without surfacing benign race losses as errors.

use chrono::Utc;
use courtbook_core::errors::BookingError;
use courtbook_core::lifecycle::TransitionOutcome;
use courtbook_core::models::booking::BookingStatus;
use courtbook_db::mock::repositories::MockBookingRepo;
use courtbook_db::models::DbBooking;
use mockall::predicate;
use pretty_assertions::assert_eq;
use uuid::Uuid;

fn pending_booking() -> DbBooking {
    DbBooking {
        id: Uuid::new_v4(),
        code: "BK-20250304-7QX2KD".to_string(),
        venue_id: Uuid::new_v4(),
        user_id: Some(Uuid::new_v4()),
        guest_name: None,
        guest_phone: None,
        status: BookingStatus::PendingPayment.as_code().to_string(),
        gross_amount: 100_000,
        discount: 0,
        addons_total: 0,
        total_amount: 100_000,
        payment_expires_at: Utc::now() + chrono::Duration::minutes(15),
        cancel_reason: None,
        note: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Mirrors the callback handler's classification of store outcomes.
async fn apply_payment_result(
    repo: &MockBookingRepo,
    booking_id: Uuid,
    success: bool,
) -> Result<&'static str, BookingError> {
    if success {
        match repo.confirm_booking(booking_id).await {
            Ok(TransitionOutcome::Applied) | Ok(TransitionOutcome::NoOp) => Ok("confirmed"),
            Err(BookingError::IllegalTransition { .. }) => Ok("ignored"),
            Err(err) => Err(err),
        }
    } else {
        match repo.cancel_booking(booking_id, "payment-failed").await {
            Ok(TransitionOutcome::Applied) | Ok(TransitionOutcome::NoOp) => Ok("cancelled"),
            Err(BookingError::IllegalTransition { .. }) => Ok("ignored"),
            Err(err) => Err(err),
        }
    }
}

#[tokio::test]
async fn test_successful_payment_confirms_pending_booking() {
    let booking = pending_booking();
    let mut repo = MockBookingRepo::new();
    repo.expect_confirm_booking()
        .with(predicate::eq(booking.id))
        .times(1)
        .returning(|_| Ok(TransitionOutcome::Applied));

    let result = apply_payment_result(&repo, booking.id, true).await;
    assert_eq!(result.expect("must classify"), "confirmed");
}

#[tokio::test]
async fn test_duplicate_payment_callback_is_a_noop() {
    let booking = pending_booking();
    let mut repo = MockBookingRepo::new();
    repo.expect_confirm_booking()
        .with(predicate::eq(booking.id))
        .times(2)
        .returning(|_| Ok(TransitionOutcome::NoOp));

    // The gateway retries; both callbacks classify identically.
    let first = apply_payment_result(&repo, booking.id, true).await;
    let second = apply_payment_result(&repo, booking.id, true).await;
    assert_eq!(first.expect("first callback"), "confirmed");
    assert_eq!(second.expect("second callback"), "confirmed");
}

#[tokio::test]
async fn test_payment_after_sweeper_expiry_is_ignored_not_an_error() {
    let booking = pending_booking();
    let mut repo = MockBookingRepo::new();
    repo.expect_confirm_booking()
        .with(predicate::eq(booking.id))
        .times(1)
        .returning(|_| {
            Err(BookingError::IllegalTransition {
                from: BookingStatus::Cancelled,
                to: BookingStatus::Confirmed,
            })
        });

    let result = apply_payment_result(&repo, booking.id, true).await;
    assert_eq!(result.expect("benign race loss"), "ignored");
}

#[tokio::test]
async fn test_failed_payment_cancels_pending_booking() {
    let booking = pending_booking();
    let mut repo = MockBookingRepo::new();
    repo.expect_cancel_booking()
        .with(predicate::eq(booking.id), predicate::eq("payment-failed"))
        .times(1)
        .returning(|_, _| Ok(TransitionOutcome::Applied));

    let result = apply_payment_result(&repo, booking.id, false).await;
    assert_eq!(result.expect("must classify"), "cancelled");
}

#[tokio::test]
async fn test_failure_callback_never_unwinds_a_confirmed_booking() {
    let booking = pending_booking();
    let mut repo = MockBookingRepo::new();
    repo.expect_cancel_booking()
        .with(predicate::eq(booking.id), predicate::eq("payment-failed"))
        .times(1)
        .returning(|_, _| {
            Err(BookingError::IllegalTransition {
                from: BookingStatus::Confirmed,
                to: BookingStatus::Cancelled,
            })
        });

    let result = apply_payment_result(&repo, booking.id, false).await;
    assert_eq!(result.expect("benign"), "ignored");
}

#[tokio::test]
async fn test_database_errors_propagate() {
    let booking = pending_booking();
    let mut repo = MockBookingRepo::new();
    repo.expect_confirm_booking()
        .returning(|_| Err(BookingError::Database(eyre::eyre!("connection refused"))));

    let result = apply_payment_result(&repo, booking.id, true).await;
    assert!(matches!(result, Err(BookingError::Database(_))));
}
