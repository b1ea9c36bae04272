use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A venue owning one or more courts. Managed by an external flow;
/// read-only inside the booking engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    pub id: Uuid,
    pub name: String,
    pub timezone: String,
    /// Fixed slot duration in minutes. The grid logic assumes 60.
    pub slot_minutes: u32,
    /// Fallback hourly price in minor units when no price rule matches.
    pub base_price: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Court {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub name: String,
    pub is_active: bool,
}

/// Open/close window for one ISO weekday (1=Mon..7=Sun).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningHours {
    pub venue_id: Uuid,
    pub weekday: u8,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
}

/// Hourly rate applicable over a day-of-week range and a time-of-day window.
/// Rules may overlap; `ResolvedDay::match_rule` applies the documented
/// tie-break (latest `time_from` wins, then stored order).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRule {
    pub id: Uuid,
    pub venue_id: Uuid,
    /// Inclusive ISO weekday range; unset bounds default to 1 and 7.
    pub day_from: Option<u8>,
    pub day_to: Option<u8>,
    /// Half-open time-of-day window `[time_from, time_to)`.
    pub time_from: NaiveTime,
    pub time_to: NaiveTime,
    pub pre_booked_price: i64,
    pub walk_in_price: i64,
}

impl PriceRule {
    /// Whether the rule's day-of-week range contains the given ISO weekday.
    pub fn covers_weekday(&self, weekday: u8) -> bool {
        let from = self.day_from.unwrap_or(1);
        let to = self.day_to.unwrap_or(7);
        from <= weekday && weekday <= to
    }

    /// Whether the rule's time window contains the start of the given hour cell.
    pub fn covers_hour(&self, hour: u8) -> bool {
        match NaiveTime::from_hms_opt(u32::from(hour), 0, 0) {
            Some(t) => self.time_from <= t && t < self.time_to,
            None => false,
        }
    }
}

/// A calendar date fully excluded from booking for a venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holiday {
    pub venue_id: Uuid,
    pub date: NaiveDate,
    pub name: Option<String>,
}

/// Maintenance exclusion on one court for an hour range `[slot_start, slot_end)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlackoutSlot {
    pub venue_id: Uuid,
    pub court_id: Uuid,
    pub date: NaiveDate,
    pub slot_start: u8,
    pub slot_end: u8,
}

impl BlackoutSlot {
    pub fn covers_hour(&self, hour: u8) -> bool {
        self.slot_start <= hour && hour < self.slot_end
    }
}
