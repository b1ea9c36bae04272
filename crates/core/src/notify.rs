//! Fire-and-forget notification seam. Delivery is an external
//! collaborator; callers log and swallow failures, never propagate them
//! into the state change that triggered the notification.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    BookingCreated,
    BookingConfirmed,
    BookingExpired,
    BookingCancelled,
    PaymentFailed,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationKind::BookingCreated => "booking-created",
            NotificationKind::BookingConfirmed => "booking-confirmed",
            NotificationKind::BookingExpired => "booking-expired",
            NotificationKind::BookingCancelled => "booking-cancelled",
            NotificationKind::PaymentFailed => "payment-failed",
        };
        f.write_str(s)
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Requests delivery of one notification. `recipient` is a user id or
    /// guest contact rendering; the payload is free-form.
    async fn notify(
        &self,
        recipient: &str,
        kind: NotificationKind,
        payload: serde_json::Value,
    ) -> eyre::Result<()>;
}
