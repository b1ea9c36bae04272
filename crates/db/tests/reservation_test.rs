//! Reservation storage tests against a live Postgres instance.
//!
//! These exercise the active-cell unique index directly, so they need a
//! real database. Set TEST_DATABASE_URL to run them; without it every
//! test prints a skip notice and passes.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc};
use courtbook_core::errors::BookingError;
use courtbook_core::lifecycle::TransitionOutcome;
use courtbook_core::models::booking::BookingStatus;
use courtbook_core::reserve::{PricedCell, ReservationPlan};
use courtbook_db::DbPool;
use courtbook_db::mock::create_test_pool;
use courtbook_db::repositories::{booking, venue};
use pretty_assertions::assert_eq;
use uuid::Uuid;

async fn test_pool() -> Option<DbPool> {
    if std::env::var("TEST_DATABASE_URL").is_err() {
        eprintln!("TEST_DATABASE_URL not set, skipping database test");
        return None;
    }

    Some(create_test_pool().await)
}

struct Fixture {
    venue_id: Uuid,
    court_id: Uuid,
    date: NaiveDate,
}

/// Fresh venue with one court, open every day 05:00-23:00. Each test gets
/// its own venue so runs never collide.
async fn fixture(pool: &DbPool) -> Fixture {
    let venue = venue::create_venue(pool, "Reservation Test Venue", "UTC", 80_000)
        .await
        .expect("create venue");
    let court = venue::create_court(pool, venue.id, "Court A")
        .await
        .expect("create court");

    let date = (Utc::now() + Duration::days(7)).date_naive();
    let open = NaiveTime::from_hms_opt(5, 0, 0).expect("valid time");
    let close = NaiveTime::from_hms_opt(23, 0, 0).expect("valid time");
    venue::add_opening_hours(pool, venue.id, date.weekday().number_from_monday() as i16, open, close)
        .await
        .expect("add opening hours");

    Fixture {
        venue_id: venue.id,
        court_id: court.id,
        date,
    }
}

fn plan_for(f: &Fixture, hours: &[u8]) -> ReservationPlan {
    let cells: Vec<PricedCell> = hours
        .iter()
        .map(|&hour| PricedCell {
            court_id: f.court_id,
            hour,
            unit_price: 80_000,
        })
        .collect();
    let gross: i64 = cells.iter().map(|c| c.unit_price).sum();

    ReservationPlan {
        venue_id: f.venue_id,
        date: f.date,
        cells,
        gross_amount: gross,
        discount: 0,
        addons_total: 0,
        total_amount: gross,
    }
}

fn deadline() -> chrono::DateTime<Utc> {
    Utc::now() + Duration::minutes(15)
}

#[tokio::test]
async fn test_concurrent_reservations_of_the_same_cell_admit_exactly_one() {
    let Some(pool) = test_pool().await else { return };
    let f = fixture(&pool).await;
    let user_a = Some(Uuid::new_v4());
    let user_b = Some(Uuid::new_v4());

    let plan_a = plan_for(&f, &[18]);
    let plan_b = plan_for(&f, &[18]);

    let (result_a, result_b) = tokio::join!(
        booking::create_booking(&pool, &plan_a, user_a, None, &[], None, deadline()),
        booking::create_booking(&pool, &plan_b, user_b, None, &[], None, deadline()),
    );

    let (winner, loser) = match (result_a, result_b) {
        (Ok(won), Err(lost)) => (won, lost),
        (Err(lost), Ok(won)) => (won, lost),
        (Ok(_), Ok(_)) => panic!("both reservations committed for one cell"),
        (Err(a), Err(b)) => panic!("both reservations failed: {a:?} / {b:?}"),
    };

    let (won_booking, won_items) = winner;
    assert_eq!(won_booking.status, BookingStatus::PendingPayment.as_code());
    assert_eq!(won_items.len(), 1);

    match loser {
        BookingError::SlotConflict(cells) => {
            assert_eq!(cells.len(), 1);
            assert_eq!(cells[0].court_id, f.court_id);
            assert_eq!(cells[0].date, f.date);
            assert_eq!(cells[0].hour, 18);
        }
        other => panic!("expected SlotConflict, got {other:?}"),
    }
}

#[tokio::test]
async fn test_disjoint_cells_both_commit() {
    let Some(pool) = test_pool().await else { return };
    let f = fixture(&pool).await;

    let first = booking::create_booking(
        &pool,
        &plan_for(&f, &[10]),
        Some(Uuid::new_v4()),
        None,
        &[],
        None,
        deadline(),
    )
    .await
    .expect("first reservation");

    let second = booking::create_booking(
        &pool,
        &plan_for(&f, &[11]),
        Some(Uuid::new_v4()),
        None,
        &[],
        None,
        deadline(),
    )
    .await
    .expect("second reservation");

    assert_eq!(first.1[0].slot_start, 10);
    assert_eq!(second.1[0].slot_start, 11);
}

#[tokio::test]
async fn test_partial_overlap_rolls_back_the_whole_reservation() {
    let Some(pool) = test_pool().await else { return };
    let f = fixture(&pool).await;

    booking::create_booking(
        &pool,
        &plan_for(&f, &[14]),
        Some(Uuid::new_v4()),
        None,
        &[],
        None,
        deadline(),
    )
    .await
    .expect("holder reservation");

    // Hour 13 is free, hour 14 is taken; nothing may be claimed.
    let err = booking::create_booking(
        &pool,
        &plan_for(&f, &[13, 14]),
        Some(Uuid::new_v4()),
        None,
        &[],
        None,
        deadline(),
    )
    .await
    .expect_err("overlapping reservation must fail");

    match err {
        BookingError::SlotConflict(cells) => {
            assert_eq!(cells.len(), 1);
            assert_eq!(cells[0].hour, 14);
        }
        other => panic!("expected SlotConflict, got {other:?}"),
    }

    let occupied = venue::occupied_cells(&pool, f.venue_id, f.date)
        .await
        .expect("occupied cells");
    assert!(
        !occupied.contains(&(f.court_id, 13)),
        "the loser's free cell must not stay claimed"
    );
}

#[tokio::test]
async fn test_cancellation_frees_the_cell_for_rebooking() {
    let Some(pool) = test_pool().await else { return };
    let f = fixture(&pool).await;

    let (held, _) = booking::create_booking(
        &pool,
        &plan_for(&f, &[9]),
        Some(Uuid::new_v4()),
        None,
        &[],
        None,
        deadline(),
    )
    .await
    .expect("initial reservation");

    let outcome = booking::cancel_booking(&pool, held.id, "user-request")
        .await
        .expect("cancel");
    assert_eq!(outcome, TransitionOutcome::Applied);

    // The released cell no longer blocks the unique index.
    let rebooked = booking::create_booking(
        &pool,
        &plan_for(&f, &[9]),
        Some(Uuid::new_v4()),
        None,
        &[],
        None,
        deadline(),
    )
    .await
    .expect("rebooking a released cell");
    assert_eq!(rebooked.1[0].slot_start, 9);
}

#[tokio::test]
async fn test_confirm_and_cancel_race_applies_exactly_once() {
    let Some(pool) = test_pool().await else { return };
    let f = fixture(&pool).await;

    let (held, _) = booking::create_booking(
        &pool,
        &plan_for(&f, &[20]),
        Some(Uuid::new_v4()),
        None,
        &[],
        None,
        deadline(),
    )
    .await
    .expect("initial reservation");

    let (confirm, cancel) = tokio::join!(
        booking::confirm_booking(&pool, held.id),
        booking::cancel_booking(&pool, held.id, "expired"),
    );

    // Whichever write lands first applies; the other sees a settled row.
    let applied = [&confirm, &cancel]
        .iter()
        .filter(|r| matches!(r, Ok(TransitionOutcome::Applied)))
        .count();
    assert_eq!(applied, 1, "confirm={confirm:?} cancel={cancel:?}");

    let lost = if matches!(confirm, Ok(TransitionOutcome::Applied)) {
        cancel
    } else {
        confirm
    };
    assert!(
        matches!(lost, Err(BookingError::IllegalTransition { .. })),
        "the losing transition must be rejected, got {lost:?}"
    );
}

#[tokio::test]
async fn test_confirm_is_idempotent() {
    let Some(pool) = test_pool().await else { return };
    let f = fixture(&pool).await;

    let (held, _) = booking::create_booking(
        &pool,
        &plan_for(&f, &[8]),
        Some(Uuid::new_v4()),
        None,
        &[],
        None,
        deadline(),
    )
    .await
    .expect("initial reservation");

    let first = booking::confirm_booking(&pool, held.id).await.expect("confirm");
    let second = booking::confirm_booking(&pool, held.id).await.expect("re-confirm");
    assert_eq!(first, TransitionOutcome::Applied);
    assert_eq!(second, TransitionOutcome::NoOp);

    let stored = booking::get_booking_by_id(&pool, held.id)
        .await
        .expect("read booking")
        .expect("booking exists");
    assert_eq!(stored.status, BookingStatus::Confirmed.as_code());
}

#[tokio::test]
async fn test_expired_scan_only_returns_overdue_pending_bookings() {
    let Some(pool) = test_pool().await else { return };
    let f = fixture(&pool).await;

    let overdue = Utc::now() - Duration::minutes(1);
    let (expired, _) = booking::create_booking(
        &pool,
        &plan_for(&f, &[6]),
        Some(Uuid::new_v4()),
        None,
        &[],
        None,
        overdue,
    )
    .await
    .expect("overdue reservation");

    let (fresh, _) = booking::create_booking(
        &pool,
        &plan_for(&f, &[7]),
        Some(Uuid::new_v4()),
        None,
        &[],
        None,
        deadline(),
    )
    .await
    .expect("fresh reservation");

    let found = booking::find_expired(&pool, Utc::now()).await.expect("scan");
    let ids: Vec<Uuid> = found.iter().map(|b| b.id).collect();
    assert!(ids.contains(&expired.id));
    assert!(!ids.contains(&fresh.id));

    // Confirmed bookings never show up, however old the deadline.
    booking::confirm_booking(&pool, expired.id).await.expect("confirm");
    let found = booking::find_expired(&pool, Utc::now()).await.expect("rescan");
    assert!(!found.iter().any(|b| b.id == expired.id));
}
