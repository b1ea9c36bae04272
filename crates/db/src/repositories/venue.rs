use crate::models::{DbBlackoutSlot, DbCourt, DbOpeningHours, DbPriceRule, DbVenue};
use chrono::{NaiveDate, NaiveTime};
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn create_venue(
    pool: &Pool<Postgres>,
    name: &str,
    timezone: &str,
    base_price: i64,
) -> Result<DbVenue> {
    let id = Uuid::new_v4();
    tracing::debug!("Creating venue: id={}, name={}", id, name);

    let venue = sqlx::query_as::<_, DbVenue>(
        r#"
        INSERT INTO venues (id, name, timezone, base_price)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, timezone, slot_minutes, base_price, is_active, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(timezone)
    .bind(base_price)
    .fetch_one(pool)
    .await?;

    Ok(venue)
}

pub async fn get_venue_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbVenue>> {
    let venue = sqlx::query_as::<_, DbVenue>(
        r#"
        SELECT id, name, timezone, slot_minutes, base_price, is_active, created_at
        FROM venues
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(venue)
}

pub async fn create_court(pool: &Pool<Postgres>, venue_id: Uuid, name: &str) -> Result<DbCourt> {
    let id = Uuid::new_v4();
    tracing::debug!("Creating court: id={}, venue_id={}, name={}", id, venue_id, name);

    let court = sqlx::query_as::<_, DbCourt>(
        r#"
        INSERT INTO courts (id, venue_id, name)
        VALUES ($1, $2, $3)
        RETURNING id, venue_id, name, is_active, created_at
        "#,
    )
    .bind(id)
    .bind(venue_id)
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(court)
}

pub async fn list_active_courts(pool: &Pool<Postgres>, venue_id: Uuid) -> Result<Vec<DbCourt>> {
    let courts = sqlx::query_as::<_, DbCourt>(
        r#"
        SELECT id, venue_id, name, is_active, created_at
        FROM courts
        WHERE venue_id = $1 AND is_active
        ORDER BY name ASC
        "#,
    )
    .bind(venue_id)
    .fetch_all(pool)
    .await?;

    Ok(courts)
}

pub async fn add_opening_hours(
    pool: &Pool<Postgres>,
    venue_id: Uuid,
    weekday: i16,
    open_time: NaiveTime,
    close_time: NaiveTime,
) -> Result<DbOpeningHours> {
    let row = sqlx::query_as::<_, DbOpeningHours>(
        r#"
        INSERT INTO opening_hours (venue_id, weekday, open_time, close_time)
        VALUES ($1, $2, $3, $4)
        RETURNING id, venue_id, weekday, open_time, close_time
        "#,
    )
    .bind(venue_id)
    .bind(weekday)
    .bind(open_time)
    .bind(close_time)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn get_opening_hours(pool: &Pool<Postgres>, venue_id: Uuid) -> Result<Vec<DbOpeningHours>> {
    let rows = sqlx::query_as::<_, DbOpeningHours>(
        r#"
        SELECT id, venue_id, weekday, open_time, close_time
        FROM opening_hours
        WHERE venue_id = $1
        ORDER BY weekday ASC, open_time ASC
        "#,
    )
    .bind(venue_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[allow(clippy::too_many_arguments)]
pub async fn add_price_rule(
    pool: &Pool<Postgres>,
    venue_id: Uuid,
    day_from: Option<i16>,
    day_to: Option<i16>,
    time_from: NaiveTime,
    time_to: NaiveTime,
    pre_booked_price: i64,
    walk_in_price: i64,
) -> Result<DbPriceRule> {
    let rule = sqlx::query_as::<_, DbPriceRule>(
        r#"
        INSERT INTO price_rules (venue_id, day_from, day_to, time_from, time_to, pre_booked_price, walk_in_price)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, venue_id, day_from, day_to, time_from, time_to, pre_booked_price, walk_in_price, created_at
        "#,
    )
    .bind(venue_id)
    .bind(day_from)
    .bind(day_to)
    .bind(time_from)
    .bind(time_to)
    .bind(pre_booked_price)
    .bind(walk_in_price)
    .fetch_one(pool)
    .await?;

    Ok(rule)
}

/// Returns the venue's price rules in stored order (creation order), the
/// order the overlap tie-break falls back to.
pub async fn get_price_rules(pool: &Pool<Postgres>, venue_id: Uuid) -> Result<Vec<DbPriceRule>> {
    let rules = sqlx::query_as::<_, DbPriceRule>(
        r#"
        SELECT id, venue_id, day_from, day_to, time_from, time_to, pre_booked_price, walk_in_price, created_at
        FROM price_rules
        WHERE venue_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(venue_id)
    .fetch_all(pool)
    .await?;

    Ok(rules)
}

pub async fn add_holiday(
    pool: &Pool<Postgres>,
    venue_id: Uuid,
    date: NaiveDate,
    name: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO holidays (venue_id, holiday_date, name)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(venue_id)
    .bind(date)
    .bind(name)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn is_holiday(pool: &Pool<Postgres>, venue_id: Uuid, date: NaiveDate) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM holidays WHERE venue_id = $1 AND holiday_date = $2
        )
        "#,
    )
    .bind(venue_id)
    .bind(date)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

pub async fn add_blackout(
    pool: &Pool<Postgres>,
    venue_id: Uuid,
    court_id: Uuid,
    date: NaiveDate,
    slot_start: i16,
    slot_end: i16,
) -> Result<DbBlackoutSlot> {
    let row = sqlx::query_as::<_, DbBlackoutSlot>(
        r#"
        INSERT INTO blackout_slots (venue_id, court_id, slot_date, slot_start, slot_end)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, venue_id, court_id, slot_date, slot_start, slot_end
        "#,
    )
    .bind(venue_id)
    .bind(court_id)
    .bind(date)
    .bind(slot_start)
    .bind(slot_end)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn get_blackouts(
    pool: &Pool<Postgres>,
    venue_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<DbBlackoutSlot>> {
    let rows = sqlx::query_as::<_, DbBlackoutSlot>(
        r#"
        SELECT id, venue_id, court_id, slot_date, slot_start, slot_end
        FROM blackout_slots
        WHERE venue_id = $1 AND slot_date = $2
        ORDER BY court_id, slot_start ASC
        "#,
    )
    .bind(venue_id)
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Cells on this venue/date claimed by active (non-released) booking items.
pub async fn occupied_cells(
    pool: &Pool<Postgres>,
    venue_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<(Uuid, i16)>> {
    let rows = sqlx::query_as::<_, (Uuid, i16)>(
        r#"
        SELECT bi.court_id, bi.slot_start
        FROM booking_items bi
        JOIN courts c ON c.id = bi.court_id
        WHERE c.venue_id = $1 AND bi.slot_date = $2 AND NOT bi.released
        "#,
    )
    .bind(venue_id)
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
