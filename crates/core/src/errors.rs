use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::booking::BookingStatus;

/// One (court, date, hour) unit of bookable time. The atomic unit of
/// exclusivity: no two active bookings may ever hold the same cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub court_id: Uuid,
    pub date: chrono::NaiveDate,
    pub hour: u8,
}

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Slot conflict: {} cell(s) already taken", .0.len())]
    SlotConflict(Vec<Cell>),

    #[error("Illegal transition: booking is {from}, cannot move to {to}")]
    IllegalTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub type BookingResult<T> = Result<T, BookingError>;
