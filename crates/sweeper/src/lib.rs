//! # Expiration Sweeper
//!
//! Periodic background task that expires unpaid bookings. Each run is a
//! pure function of "current time + store state": select PENDING_PAYMENT
//! bookings past their payment deadline, cancel each through the
//! lifecycle machine, and request one notification per expiry. The
//! deadline is soft; worst-case delay before expiry is one interval.
//!
//! Safety: the per-booking cancellation is a conditional store write, so
//! overlapping sweeper runs and the payment-confirmation race both
//! resolve to idempotent no-ops for the loser instead of double-cancels.
//! A failure on one booking never aborts the rest of the run.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courtbook_core::errors::{BookingError, BookingResult};
use courtbook_core::lifecycle::{TransitionActor, TransitionOutcome};
use courtbook_core::notify::{NotificationKind, Notifier};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Cancellation reason recorded for sweeper-expired bookings; this is
/// what distinguishes an expiry from a user cancellation in history views.
pub const EXPIRED_REASON: &str = "expired";

#[derive(Debug, Clone)]
pub struct SweeperConfig {
    pub interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

/// The slice of a booking the sweeper needs.
#[derive(Debug, Clone)]
pub struct ExpiredBooking {
    pub id: Uuid,
    pub code: String,
    pub user_id: Option<Uuid>,
    pub guest_phone: Option<String>,
    pub payment_expires_at: DateTime<Utc>,
}

impl ExpiredBooking {
    fn recipient(&self) -> String {
        self.user_id
            .map(|id| id.to_string())
            .or_else(|| self.guest_phone.clone())
            .unwrap_or_else(|| self.code.clone())
    }
}

/// Store seam for the sweeper; the Postgres impl delegates to
/// `courtbook-db`, tests substitute a mock.
#[mockall::automock]
#[async_trait]
pub trait ExpiryStore: Send + Sync {
    async fn find_expired(&self, now: DateTime<Utc>) -> eyre::Result<Vec<ExpiredBooking>>;

    async fn cancel(&self, id: Uuid, reason: &str) -> BookingResult<TransitionOutcome>;
}

pub struct PgExpiryStore {
    pool: courtbook_db::DbPool,
}

impl PgExpiryStore {
    pub fn new(pool: courtbook_db::DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpiryStore for PgExpiryStore {
    async fn find_expired(&self, now: DateTime<Utc>) -> eyre::Result<Vec<ExpiredBooking>> {
        let rows = courtbook_db::repositories::booking::find_expired(&self.pool, now).await?;
        Ok(rows
            .into_iter()
            .map(|b| ExpiredBooking {
                id: b.id,
                code: b.code,
                user_id: b.user_id,
                guest_phone: b.guest_phone,
                payment_expires_at: b.payment_expires_at,
            })
            .collect())
    }

    async fn cancel(&self, id: Uuid, reason: &str) -> BookingResult<TransitionOutcome> {
        courtbook_db::repositories::booking::cancel_booking(&self.pool, id, reason).await
    }
}

/// What one sweep pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Bookings selected as past-deadline
    pub scanned: usize,
    /// Transitions actually applied
    pub expired: usize,
    /// Bookings another writer settled first (no-op races)
    pub already_settled: usize,
    /// Per-booking failures, logged and skipped
    pub failed: usize,
}

/// Runs one sweep pass at `now`.
pub async fn run_once(
    store: &dyn ExpiryStore,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> SweepReport {
    let candidates = match store.find_expired(now).await {
        Ok(candidates) => candidates,
        Err(err) => {
            tracing::error!("Sweep pass could not scan for expired bookings: {}", err);
            return SweepReport::default();
        }
    };

    let mut report = SweepReport {
        scanned: candidates.len(),
        ..Default::default()
    };

    for booking in candidates {
        match store.cancel(booking.id, EXPIRED_REASON).await {
            Ok(TransitionOutcome::Applied) => {
                report.expired += 1;
                tracing::info!(
                    "Booking expired: id={}, code={}, deadline={}, actor={}",
                    booking.id,
                    booking.code,
                    booking.payment_expires_at,
                    TransitionActor::Sweeper
                );
                let payload = json!({ "booking_id": booking.id, "code": booking.code });
                if let Err(err) = notifier
                    .notify(&booking.recipient(), NotificationKind::BookingExpired, payload)
                    .await
                {
                    tracing::warn!(
                        "Expiry notification failed: booking_id={}, error={}",
                        booking.id,
                        err
                    );
                }
            }
            // Payment confirmed it, a user cancelled it, or an
            // overlapping run got there first. Not a failure.
            Ok(TransitionOutcome::NoOp) | Err(BookingError::IllegalTransition { .. }) => {
                report.already_settled += 1;
                tracing::debug!(
                    "Booking settled before expiry could apply: id={}",
                    booking.id
                );
            }
            Err(err) => {
                report.failed += 1;
                tracing::warn!(
                    "Failed to expire booking, continuing sweep: id={}, error={}",
                    booking.id,
                    err
                );
            }
        }
    }

    tracing::debug!(
        "Sweep pass done: scanned={}, expired={}, already_settled={}, failed={}",
        report.scanned,
        report.expired,
        report.already_settled,
        report.failed
    );
    report
}

/// Runs the sweeper forever at the configured interval.
pub async fn start(
    store: Arc<dyn ExpiryStore>,
    notifier: Arc<dyn Notifier>,
    config: SweeperConfig,
) {
    tracing::info!(
        "Expiration sweeper started: interval={}s",
        config.interval.as_secs()
    );
    let mut ticker = tokio::time::interval(config.interval);
    // First tick fires immediately; skip it so a restart loop does not
    // hammer the store.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        run_once(store.as_ref(), notifier.as_ref(), Utc::now()).await;
    }
}
