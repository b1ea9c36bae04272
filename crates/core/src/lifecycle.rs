//! # Booking Lifecycle State Machine
//!
//! PENDING_PAYMENT -> CONFIRMED | CANCELLED; terminal states absorb.
//! Legality is a table over the [`BookingStatus`] catalog so the raced
//! sweeper/payment writes classify as idempotent no-ops instead of
//! ad hoc status-string comparisons at every call site.

use serde::{Deserialize, Serialize};

use crate::errors::{BookingError, BookingResult};
use crate::models::booking::BookingStatus;

/// Who drove a transition; recorded in the audit log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionActor {
    System,
    Sweeper,
    User,
}

impl std::fmt::Display for TransitionActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionActor::System => f.write_str("system"),
            TransitionActor::Sweeper => f.write_str("sweeper"),
            TransitionActor::User => f.write_str("user"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The status actually changed.
    Applied,
    /// The booking was already in the target state. Safe to ignore;
    /// covers duplicate payment callbacks and overlapping sweeper runs.
    NoOp,
}

/// The transition table. Returns [`BookingError::IllegalTransition`] for
/// any move out of a terminal state into a different state.
pub fn transition(from: BookingStatus, to: BookingStatus) -> BookingResult<TransitionOutcome> {
    use BookingStatus::*;
    match (from, to) {
        (PendingPayment, Confirmed) | (PendingPayment, Cancelled) => Ok(TransitionOutcome::Applied),
        (Confirmed, Confirmed) | (Cancelled, Cancelled) => Ok(TransitionOutcome::NoOp),
        (from, to) => Err(BookingError::IllegalTransition { from, to }),
    }
}

/// Classifies a transition whose conditional store write did not apply,
/// given the row's re-read `current` status. The row already sitting at
/// the target is the idempotent no-op; a row settled the other way is
/// illegal per the table. A row the table would still move means the
/// store and the table disagree, which is an internal error.
pub fn classify_lost_write(
    current: BookingStatus,
    target: BookingStatus,
) -> BookingResult<TransitionOutcome> {
    match transition(current, target)? {
        TransitionOutcome::NoOp => Ok(TransitionOutcome::NoOp),
        TransitionOutcome::Applied => Err(BookingError::Internal(
            format!("booking reads {current} but the conditional update to {target} did not apply")
                .into(),
        )),
    }
}
