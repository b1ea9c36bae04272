use crate::models::{DbBooking, DbBookingAddon, DbBookingItem};
use chrono::{DateTime, NaiveDate, Utc};
use courtbook_core::errors::{BookingError, BookingResult, Cell};
use courtbook_core::lifecycle::{self, TransitionOutcome};
use courtbook_core::models::booking::{AddonItem, BookingStatus, GuestContact};
use courtbook_core::reserve::{PricedCell, ReservationPlan};
use eyre::Result;
use rand::{Rng, distributions::Alphanumeric};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

const BOOKING_COLUMNS: &str = "id, code, venue_id, user_id, guest_name, guest_phone, status, \
     gross_amount, discount, addons_total, total_amount, payment_expires_at, \
     cancel_reason, note, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, booking_id, court_id, slot_date, slot_start, slot_end, unit_price, line_amount, released";

fn db_err(err: sqlx::Error) -> BookingError {
    BookingError::Database(err.into())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Human-readable booking code, e.g. `BK-20250304-7QX2KD`.
pub fn generate_booking_code(date: NaiveDate) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("BK-{}-{}", date.format("%Y%m%d"), suffix.to_uppercase())
}

/// Creates a booking and claims its cells as one transaction.
///
/// The claim is not check-then-insert: every item insert races on the
/// partial unique index over active cells, so of two concurrent requests
/// for the same cell exactly one commits. The loser's unique violation is
/// translated into a `SlotConflict` naming the cells an active booking
/// already holds; the transaction rolls back, leaving no partial claims.
pub async fn create_booking(
    pool: &Pool<Postgres>,
    plan: &ReservationPlan,
    user_id: Option<Uuid>,
    guest: Option<&GuestContact>,
    addons: &[AddonItem],
    note: Option<&str>,
    payment_expires_at: DateTime<Utc>,
) -> BookingResult<(DbBooking, Vec<DbBookingItem>)> {
    let booking_id = Uuid::new_v4();
    let code = generate_booking_code(plan.date);

    tracing::debug!(
        "Creating booking: id={}, code={}, venue_id={}, cells={}",
        booking_id,
        code,
        plan.venue_id,
        plan.cells.len()
    );

    let mut tx = pool.begin().await.map_err(db_err)?;

    let insert_booking = format!(
        r#"
        INSERT INTO bookings (id, code, venue_id, user_id, guest_name, guest_phone, status,
                              gross_amount, discount, addons_total, total_amount,
                              payment_expires_at, note)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING {BOOKING_COLUMNS}
        "#
    );
    let booking = sqlx::query_as::<_, DbBooking>(&insert_booking)
        .bind(booking_id)
        .bind(&code)
        .bind(plan.venue_id)
        .bind(user_id)
        .bind(guest.map(|g| g.name.as_str()))
        .bind(guest.map(|g| g.phone.as_str()))
        .bind(BookingStatus::PendingPayment.as_code())
        .bind(plan.gross_amount)
        .bind(plan.discount)
        .bind(plan.addons_total)
        .bind(plan.total_amount)
        .bind(payment_expires_at)
        .bind(note)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

    let insert_item = format!(
        r#"
        INSERT INTO booking_items (booking_id, court_id, slot_date, slot_start, slot_end,
                                   unit_price, line_amount)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {ITEM_COLUMNS}
        "#
    );
    let mut items = Vec::with_capacity(plan.cells.len());
    for cell in &plan.cells {
        let inserted = sqlx::query_as::<_, DbBookingItem>(&insert_item)
            .bind(booking_id)
            .bind(cell.court_id)
            .bind(plan.date)
            .bind(i16::from(cell.hour))
            .bind(i16::from(cell.hour) + 1)
            .bind(cell.unit_price)
            .bind(cell.unit_price)
            .fetch_one(&mut *tx)
            .await;

        match inserted {
            Ok(item) => items.push(item),
            Err(err) if is_unique_violation(&err) => {
                tx.rollback().await.map_err(db_err)?;
                let conflicts = find_conflicting_cells(pool, plan.date, &plan.cells).await?;
                tracing::info!(
                    "Reservation lost the race: code={}, conflicting_cells={}",
                    code,
                    conflicts.len()
                );
                return Err(BookingError::SlotConflict(conflicts));
            }
            Err(err) => return Err(db_err(err)),
        }
    }

    for addon in addons {
        sqlx::query(
            r#"
            INSERT INTO booking_addons (booking_id, name, amount)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(booking_id)
        .bind(&addon.name)
        .bind(addon.amount)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
    }

    tx.commit().await.map_err(db_err)?;
    tracing::debug!("Booking created successfully: id={}, code={}", booking_id, code);

    Ok((booking, items))
}

/// Which of the requested cells are currently claimed by active bookings.
pub async fn find_conflicting_cells(
    pool: &Pool<Postgres>,
    date: NaiveDate,
    cells: &[PricedCell],
) -> BookingResult<Vec<Cell>> {
    let court_ids: Vec<Uuid> = cells.iter().map(|c| c.court_id).collect();
    let hours: Vec<i16> = cells.iter().map(|c| i16::from(c.hour)).collect();

    let rows = sqlx::query_as::<_, (Uuid, i16)>(
        r#"
        SELECT court_id, slot_start
        FROM booking_items
        WHERE NOT released
          AND slot_date = $1
          AND court_id = ANY($2)
          AND slot_start = ANY($3)
        "#,
    )
    .bind(date)
    .bind(&court_ids)
    .bind(&hours)
    .fetch_all(pool)
    .await
    .map_err(db_err)?;

    // ANY() matches the columns independently; keep only exact pairs.
    let conflicts = rows
        .into_iter()
        .filter(|(court_id, slot_start)| {
            cells
                .iter()
                .any(|c| c.court_id == *court_id && i16::from(c.hour) == *slot_start)
        })
        .map(|(court_id, slot_start)| Cell {
            court_id,
            date,
            hour: slot_start.max(0) as u8,
        })
        .collect();

    Ok(conflicts)
}

pub async fn get_booking_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbBooking>> {
    let query = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
    let booking = sqlx::query_as::<_, DbBooking>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(booking)
}

pub async fn get_booking_by_code(pool: &Pool<Postgres>, code: &str) -> Result<Option<DbBooking>> {
    let query = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE code = $1");
    let booking = sqlx::query_as::<_, DbBooking>(&query)
        .bind(code)
        .fetch_optional(pool)
        .await?;

    Ok(booking)
}

pub async fn get_booking_items(pool: &Pool<Postgres>, booking_id: Uuid) -> Result<Vec<DbBookingItem>> {
    let query = format!(
        "SELECT {ITEM_COLUMNS} FROM booking_items WHERE booking_id = $1 ORDER BY slot_date, slot_start"
    );
    let items = sqlx::query_as::<_, DbBookingItem>(&query)
        .bind(booking_id)
        .fetch_all(pool)
        .await?;

    Ok(items)
}

pub async fn get_booking_addons(pool: &Pool<Postgres>, booking_id: Uuid) -> Result<Vec<DbBookingAddon>> {
    let addons = sqlx::query_as::<_, DbBookingAddon>(
        r#"
        SELECT id, booking_id, name, amount
        FROM booking_addons
        WHERE booking_id = $1
        ORDER BY name
        "#,
    )
    .bind(booking_id)
    .fetch_all(pool)
    .await?;

    Ok(addons)
}

/// PENDING_PAYMENT -> CONFIRMED. Conditional on the current status so a
/// raced sweeper cancellation wins or loses atomically at the store.
///
/// Returns `Applied` when this call changed the row, `NoOp` when the
/// booking was already confirmed (duplicate payment callback), and
/// `IllegalTransition` when it was already cancelled.
pub async fn confirm_booking(pool: &Pool<Postgres>, id: Uuid) -> BookingResult<TransitionOutcome> {
    let result = sqlx::query(
        r#"
        UPDATE bookings
        SET status = $2, updated_at = NOW()
        WHERE id = $1 AND status = $3
        "#,
    )
    .bind(id)
    .bind(BookingStatus::Confirmed.as_code())
    .bind(BookingStatus::PendingPayment.as_code())
    .execute(pool)
    .await
    .map_err(db_err)?;

    if result.rows_affected() == 1 {
        return Ok(TransitionOutcome::Applied);
    }

    // Lost the conditional write or unknown id; re-read to classify.
    classify_lost_transition(pool, id, BookingStatus::Confirmed).await
}

/// PENDING_PAYMENT -> CANCELLED, releasing the booking's cells in the same
/// transaction so they immediately drop out of the active-cell index.
pub async fn cancel_booking(
    pool: &Pool<Postgres>,
    id: Uuid,
    reason: &str,
) -> BookingResult<TransitionOutcome> {
    let mut tx = pool.begin().await.map_err(db_err)?;

    let result = sqlx::query(
        r#"
        UPDATE bookings
        SET status = $2, cancel_reason = $3, updated_at = NOW()
        WHERE id = $1 AND status = $4
        "#,
    )
    .bind(id)
    .bind(BookingStatus::Cancelled.as_code())
    .bind(reason)
    .bind(BookingStatus::PendingPayment.as_code())
    .execute(&mut *tx)
    .await
    .map_err(db_err)?;

    if result.rows_affected() == 1 {
        sqlx::query(
            r#"
            UPDATE booking_items
            SET released = TRUE
            WHERE booking_id = $1 AND NOT released
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        return Ok(TransitionOutcome::Applied);
    }

    tx.rollback().await.map_err(db_err)?;
    classify_lost_transition(pool, id, BookingStatus::Cancelled).await
}

async fn classify_lost_transition(
    pool: &Pool<Postgres>,
    id: Uuid,
    target: BookingStatus,
) -> BookingResult<TransitionOutcome> {
    let booking = get_booking_by_id(pool, id)
        .await?
        .ok_or_else(|| BookingError::NotFound(format!("Booking with ID {id} not found")))?;

    match booking.status() {
        Some(current) => lifecycle::classify_lost_write(current, target),
        None => Err(BookingError::Internal(
            format!("booking {} has unknown status code '{}'", id, booking.status).into(),
        )),
    }
}

/// Bookings still pending payment past their deadline; the sweeper's scan.
pub async fn find_expired(pool: &Pool<Postgres>, now: DateTime<Utc>) -> Result<Vec<DbBooking>> {
    let query = format!(
        r#"
        SELECT {BOOKING_COLUMNS}
        FROM bookings
        WHERE status = $1 AND payment_expires_at <= $2
        ORDER BY payment_expires_at ASC
        "#
    );
    let bookings = sqlx::query_as::<_, DbBooking>(&query)
        .bind(BookingStatus::PendingPayment.as_code())
        .bind(now)
        .fetch_all(pool)
        .await?;

    Ok(bookings)
}

pub async fn list_bookings_by_user(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    status: Option<BookingStatus>,
) -> Result<Vec<DbBooking>> {
    let query = format!(
        r#"
        SELECT {BOOKING_COLUMNS}
        FROM bookings
        WHERE user_id = $1 AND ($2::VARCHAR IS NULL OR status = $2)
        ORDER BY created_at DESC
        "#
    );
    let bookings = sqlx::query_as::<_, DbBooking>(&query)
        .bind(user_id)
        .bind(status.map(|s| s.as_code()))
        .fetch_all(pool)
        .await?;

    Ok(bookings)
}
