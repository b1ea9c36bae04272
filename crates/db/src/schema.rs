use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create venues table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS venues (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name VARCHAR(255) NOT NULL,
            timezone VARCHAR(64) NOT NULL DEFAULT 'UTC',
            slot_minutes INT NOT NULL DEFAULT 60,
            base_price BIGINT NOT NULL DEFAULT 0,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create courts table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS courts (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            venue_id UUID NOT NULL REFERENCES venues(id),
            name VARCHAR(255) NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create opening_hours table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS opening_hours (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            venue_id UUID NOT NULL REFERENCES venues(id),
            weekday SMALLINT NOT NULL,
            open_time TIME NOT NULL,
            close_time TIME NOT NULL,
            CONSTRAINT valid_weekday CHECK (weekday BETWEEN 1 AND 7),
            CONSTRAINT valid_window CHECK (close_time > open_time)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create price_rules table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS price_rules (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            venue_id UUID NOT NULL REFERENCES venues(id),
            day_from SMALLINT NULL,
            day_to SMALLINT NULL,
            time_from TIME NOT NULL,
            time_to TIME NOT NULL,
            pre_booked_price BIGINT NOT NULL,
            walk_in_price BIGINT NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_rule_window CHECK (time_to > time_from)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create holidays table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS holidays (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            venue_id UUID NOT NULL REFERENCES venues(id),
            holiday_date DATE NOT NULL,
            name VARCHAR(255) NULL,
            UNIQUE (venue_id, holiday_date)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create blackout_slots table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS blackout_slots (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            venue_id UUID NOT NULL REFERENCES venues(id),
            court_id UUID NOT NULL REFERENCES courts(id),
            slot_date DATE NOT NULL,
            slot_start SMALLINT NOT NULL,
            slot_end SMALLINT NOT NULL,
            CONSTRAINT valid_blackout CHECK (slot_end > slot_start),
            UNIQUE (court_id, slot_date, slot_start, slot_end)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create bookings table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bookings (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            code VARCHAR(32) NOT NULL UNIQUE,
            venue_id UUID NOT NULL REFERENCES venues(id),
            user_id UUID NULL,
            guest_name VARCHAR(255) NULL,
            guest_phone VARCHAR(64) NULL,
            status VARCHAR(32) NOT NULL,
            gross_amount BIGINT NOT NULL,
            discount BIGINT NOT NULL DEFAULT 0,
            addons_total BIGINT NOT NULL DEFAULT 0,
            total_amount BIGINT NOT NULL,
            payment_expires_at TIMESTAMP WITH TIME ZONE NOT NULL,
            cancel_reason VARCHAR(255) NULL,
            note TEXT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT non_negative_total CHECK (total_amount >= 0)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create booking_items table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS booking_items (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            booking_id UUID NOT NULL REFERENCES bookings(id),
            court_id UUID NOT NULL REFERENCES courts(id),
            slot_date DATE NOT NULL,
            slot_start SMALLINT NOT NULL,
            slot_end SMALLINT NOT NULL,
            unit_price BIGINT NOT NULL,
            line_amount BIGINT NOT NULL,
            released BOOLEAN NOT NULL DEFAULT FALSE,
            CONSTRAINT one_hour_cell CHECK (slot_end = slot_start + 1)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create booking_addons table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS booking_addons (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            booking_id UUID NOT NULL REFERENCES bookings(id),
            name VARCHAR(255) NOT NULL,
            amount BIGINT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // The mutual-exclusion invariant: one active claim per cell,
    // enforced by the store so concurrent writers race on the index,
    // not on application-level checks. Cancellation releases items,
    // dropping them out of the partial index.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS uq_booking_items_active_cell
            ON booking_items (court_id, slot_date, slot_start)
            WHERE NOT released;
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_courts_venue_id ON courts(venue_id);
        CREATE INDEX IF NOT EXISTS idx_opening_hours_venue_id ON opening_hours(venue_id);
        CREATE INDEX IF NOT EXISTS idx_price_rules_venue_id ON price_rules(venue_id);
        CREATE INDEX IF NOT EXISTS idx_holidays_venue_date ON holidays(venue_id, holiday_date);
        CREATE INDEX IF NOT EXISTS idx_blackout_slots_court_date ON blackout_slots(court_id, slot_date);
        CREATE INDEX IF NOT EXISTS idx_bookings_user_id ON bookings(user_id);
        CREATE INDEX IF NOT EXISTS idx_bookings_status_expiry ON bookings(status, payment_expires_at);
        CREATE INDEX IF NOT EXISTS idx_booking_items_booking_id ON booking_items(booking_id);
        CREATE INDEX IF NOT EXISTS idx_booking_items_cell ON booking_items(court_id, slot_date, slot_start);
        CREATE INDEX IF NOT EXISTS idx_booking_addons_booking_id ON booking_addons(booking_id);
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
