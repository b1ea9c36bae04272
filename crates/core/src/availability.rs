//! # Availability Calculator
//!
//! Read-only projection of one venue-day into per-court hour grids.
//! Advisory for UI rendering only: the exclusivity guarantee lives in the
//! reservation transaction, never here.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::venue::BlackoutSlot;
use crate::resolver::ResolvedDay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnavailableReason {
    OutsideHours,
    Holiday,
    Blackout,
    Booked,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourCell {
    pub hour: u8,
    pub free: bool,
    pub price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnavailableReason>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourtAvailability {
    pub court_id: Uuid,
    pub court_name: String,
    pub hours: Vec<HourCell>,
}

/// Builds the 24-cell grid for one court.
///
/// Exclusion layers apply in order: outside the opening window, venue
/// holiday, court blackout, already booked. A free cell carries the price
/// from the resolved rules (venue base price when no rule matches).
///
/// `blackouts` must already be filtered to this court and date;
/// `occupied` holds the hours claimed by active bookings on this court.
pub fn court_day_grid(
    day: &ResolvedDay,
    base_price: i64,
    is_holiday: bool,
    blackouts: &[BlackoutSlot],
    occupied: &HashSet<u8>,
) -> Vec<HourCell> {
    (0u8..24)
        .map(|hour| {
            let reason = if !day.hour_in_window(hour) {
                Some(UnavailableReason::OutsideHours)
            } else if is_holiday {
                Some(UnavailableReason::Holiday)
            } else if blackouts.iter().any(|b| b.covers_hour(hour)) {
                Some(UnavailableReason::Blackout)
            } else if occupied.contains(&hour) {
                Some(UnavailableReason::Booked)
            } else {
                None
            };

            match reason {
                Some(reason) => HourCell {
                    hour,
                    free: false,
                    price: None,
                    reason: Some(reason),
                },
                None => HourCell {
                    hour,
                    free: true,
                    price: Some(day.price_for_hour(hour, base_price)),
                    reason: None,
                },
            }
        })
        .collect()
}
