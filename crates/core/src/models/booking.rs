use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{BookingError, BookingResult, Cell};

/// Closed catalog of booking lifecycle states. Transition legality is
/// decided by the table in [`crate::lifecycle`], never by comparing raw
/// status strings at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    PendingPayment,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    /// Stable storage code for this status.
    pub fn as_code(&self) -> &'static str {
        match self {
            BookingStatus::PendingPayment => "PENDING_PAYMENT",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "PENDING_PAYMENT" => Some(BookingStatus::PendingPayment),
            "CONFIRMED" => Some(BookingStatus::Confirmed),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Terminal states admit no outgoing transitions.
    pub fn is_final(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Cancelled)
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, BookingStatus::Cancelled)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Contact snapshot for bookings made without a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestContact {
    pub name: String,
    pub phone: String,
}

/// The reservation aggregate. Mutated only through the lifecycle state
/// machine; never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub code: String,
    pub venue_id: Uuid,
    pub user_id: Option<Uuid>,
    pub guest: Option<GuestContact>,
    pub status: BookingStatus,
    pub gross_amount: i64,
    pub discount: i64,
    pub addons_total: i64,
    pub total_amount: i64,
    pub payment_expires_at: DateTime<Utc>,
    pub cancel_reason: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One claimed hour cell. The tuple (court_id, slot_date, slot_start) is
/// unique across all non-released items; the storage layer enforces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingItem {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub court_id: Uuid,
    pub slot_date: NaiveDate,
    pub slot_start: u8,
    pub slot_end: u8,
    pub unit_price: i64,
    pub line_amount: i64,
}

impl BookingItem {
    pub fn cell(&self) -> Cell {
        Cell {
            court_id: self.court_id,
            date: self.slot_date,
            hour: self.slot_start,
        }
    }
}

/// Add-on line item attached at creation time (equipment rental etc.).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddonItem {
    pub name: String,
    pub amount: i64,
}

/// Computes the booking total, rejecting a negative result.
///
/// Invariant: `total = gross - discount + addons_total >= 0`. Totals are
/// locked at creation time and never recomputed from later rule changes.
pub fn compute_total(gross: i64, discount: i64, addons_total: i64) -> BookingResult<i64> {
    if discount < 0 {
        return Err(BookingError::Validation(
            "discount must not be negative".into(),
        ));
    }
    let total = gross - discount + addons_total;
    if total < 0 {
        return Err(BookingError::Validation(format!(
            "total amount must not be negative (gross={gross}, discount={discount}, addons={addons_total})"
        )));
    }
    Ok(total)
}

// ---- Request / response DTOs ------------------------------------------------

/// One requested cell within a reserve call; the date comes once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRequest {
    pub court_id: Uuid,
    pub hour: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub venue_id: Uuid,
    pub user_id: Option<Uuid>,
    pub guest: Option<GuestContact>,
    pub date: NaiveDate,
    pub cells: Vec<CellRequest>,
    #[serde(default)]
    pub discount: i64,
    #[serde(default)]
    pub addons: Vec<AddonItem>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingItemResponse {
    pub court_id: Uuid,
    pub slot_date: NaiveDate,
    pub slot_start: u8,
    pub slot_end: u8,
    pub unit_price: i64,
    pub line_amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub code: String,
    pub status: BookingStatus,
    pub gross_amount: i64,
    pub discount: i64,
    pub addons_total: i64,
    pub total_amount: i64,
    pub payment_expires_at: DateTime<Utc>,
    pub items: Vec<BookingItemResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDetailResponse {
    pub booking: Booking,
    pub items: Vec<BookingItemResponse>,
    pub addons: Vec<AddonItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: String,
}

/// Payment gateway callback payload. The provider order id is the booking
/// code handed to the gateway at checkout time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCallbackRequest {
    pub order_id: String,
    pub provider_code: String,
    pub success: bool,
}
