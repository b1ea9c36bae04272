//! Reservation planning: everything about a reserve call that can be
//! decided from loaded configuration, before the storage transaction.
//!
//! The plan validates the requested cells (opening hours, holiday,
//! blackouts, court ownership) and prices them. Claiming the cells is the
//! storage layer's job; a plan passing here can still lose the race and
//! come back as a slot conflict.

use std::collections::HashSet;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::errors::{BookingError, BookingResult};
use crate::models::booking::{compute_total, AddonItem, CellRequest, GuestContact};
use crate::models::venue::{BlackoutSlot, Court, Venue};
use crate::resolver::ResolvedDay;

/// One validated, priced cell ready to insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedCell {
    pub court_id: Uuid,
    pub hour: u8,
    pub unit_price: i64,
}

#[derive(Debug, Clone)]
pub struct ReservationPlan {
    pub venue_id: Uuid,
    pub date: NaiveDate,
    pub cells: Vec<PricedCell>,
    pub gross_amount: i64,
    pub discount: i64,
    pub addons_total: i64,
    pub total_amount: i64,
}

/// Validates and prices a reservation request.
///
/// `courts` must be the venue's active courts; `blackouts` the venue's
/// blackout rows for the requested date.
#[allow(clippy::too_many_arguments)]
pub fn plan_reservation(
    venue: &Venue,
    courts: &[Court],
    day: &ResolvedDay,
    date: NaiveDate,
    is_holiday: bool,
    blackouts: &[BlackoutSlot],
    user_id: Option<Uuid>,
    guest: Option<&GuestContact>,
    cells: &[CellRequest],
    discount: i64,
    addons: &[AddonItem],
) -> BookingResult<ReservationPlan> {
    if cells.is_empty() {
        return Err(BookingError::Validation(
            "at least one cell must be requested".into(),
        ));
    }
    match (user_id, guest) {
        (None, None) => {
            return Err(BookingError::Validation(
                "either a user id or a guest contact is required".into(),
            ))
        }
        (Some(_), Some(_)) => {
            return Err(BookingError::Validation(
                "provide a user id or a guest contact, not both".into(),
            ))
        }
        _ => {}
    }
    if !venue.is_active {
        return Err(BookingError::Validation(format!(
            "venue {} is not active",
            venue.id
        )));
    }
    if is_holiday {
        return Err(BookingError::Validation(format!(
            "venue {} is closed on {} (holiday)",
            venue.id, date
        )));
    }
    if let Some(addon) = addons.iter().find(|a| a.amount < 0) {
        return Err(BookingError::Validation(format!(
            "add-on '{}' has a negative amount",
            addon.name
        )));
    }

    let mut seen = HashSet::new();
    let mut priced = Vec::with_capacity(cells.len());
    for cell in cells {
        if cell.hour >= 24 {
            return Err(BookingError::Validation(format!(
                "hour {} is out of range",
                cell.hour
            )));
        }
        if !seen.insert((cell.court_id, cell.hour)) {
            return Err(BookingError::Validation(format!(
                "cell (court {}, hour {}) requested twice",
                cell.court_id, cell.hour
            )));
        }
        let court = courts
            .iter()
            .find(|c| c.id == cell.court_id)
            .ok_or_else(|| {
                BookingError::NotFound(format!(
                    "court {} not found in venue {}",
                    cell.court_id, venue.id
                ))
            })?;
        if !court.is_active {
            return Err(BookingError::Validation(format!(
                "court {} is not active",
                court.id
            )));
        }
        if !day.hour_in_window(cell.hour) {
            return Err(BookingError::Validation(format!(
                "hour {} is outside opening hours ({}-{})",
                cell.hour, day.open_time, day.close_time
            )));
        }
        if blackouts
            .iter()
            .any(|b| b.court_id == cell.court_id && b.covers_hour(cell.hour))
        {
            return Err(BookingError::Validation(format!(
                "cell (court {}, hour {}) falls in a blackout window",
                cell.court_id, cell.hour
            )));
        }
        priced.push(PricedCell {
            court_id: cell.court_id,
            hour: cell.hour,
            unit_price: day.price_for_hour(cell.hour, venue.base_price),
        });
    }

    let gross_amount: i64 = priced.iter().map(|c| c.unit_price).sum();
    let addons_total: i64 = addons.iter().map(|a| a.amount).sum();
    let total_amount = compute_total(gross_amount, discount, addons_total)?;

    Ok(ReservationPlan {
        venue_id: venue.id,
        date,
        cells: priced,
        gross_amount,
        discount,
        addons_total,
        total_amount,
    })
}
