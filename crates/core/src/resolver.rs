//! # Configuration Resolver
//!
//! Resolves the effective opening window and the ordered set of applicable
//! price rules for one venue-day. Pure function of already-loaded
//! configuration rows; safe to call concurrently and to cache briefly,
//! because the reservation invariant is re-validated at write time
//! regardless of what a cached read displayed.

use chrono::{Datelike, NaiveDate, NaiveTime};

use crate::models::venue::{OpeningHours, PriceRule};

/// Fallback opening window used when a weekday has no configured hours.
pub fn default_open() -> NaiveTime {
    NaiveTime::from_hms_opt(5, 0, 0).unwrap()
}

pub fn default_close() -> NaiveTime {
    NaiveTime::from_hms_opt(22, 0, 0).unwrap()
}

/// Effective configuration for one venue-day.
#[derive(Debug, Clone)]
pub struct ResolvedDay {
    /// ISO weekday, 1=Mon..7=Sun.
    pub weekday: u8,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    /// Applicable rules, sorted ascending by `time_from`. Stored order is
    /// preserved among equal starts (stable sort).
    pub rules: Vec<PriceRule>,
}

impl ResolvedDay {
    /// Resolves opening hours and price rules for `date`.
    ///
    /// Duplicate opening-hours rows for the weekday widen to the union
    /// (min open, max close). A weekday with no rows falls back to the
    /// default 05:00-22:00 window. An unconfigured venue resolves to the
    /// defaults with no rules; this never fails.
    pub fn resolve(date: NaiveDate, opening_hours: &[OpeningHours], price_rules: &[PriceRule]) -> Self {
        let weekday = date.weekday().number_from_monday() as u8;

        let mut window: Option<(NaiveTime, NaiveTime)> = None;
        for row in opening_hours.iter().filter(|r| r.weekday == weekday) {
            window = Some(match window {
                None => (row.open_time, row.close_time),
                Some((open, close)) => (open.min(row.open_time), close.max(row.close_time)),
            });
        }
        let (open_time, close_time) = window.unwrap_or_else(|| (default_open(), default_close()));

        let mut rules: Vec<PriceRule> = price_rules
            .iter()
            .filter(|r| r.covers_weekday(weekday))
            .cloned()
            .collect();
        rules.sort_by_key(|r| r.time_from);

        Self {
            weekday,
            open_time,
            close_time,
            rules,
        }
    }

    /// Whether the hour cell `[hour, hour+1)` lies fully inside the
    /// resolved opening window.
    pub fn hour_in_window(&self, hour: u8) -> bool {
        let start = match NaiveTime::from_hms_opt(u32::from(hour), 0, 0) {
            Some(t) => t,
            None => return false,
        };
        let end = match NaiveTime::from_hms_opt(u32::from(hour) + 1, 0, 0) {
            Some(t) => t,
            // Hour 23 ends at midnight; treat the window as closing at 23:59:59.
            None => NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
        };
        start >= self.open_time && end <= self.close_time
    }

    /// Picks the single applicable price rule for an hour cell.
    ///
    /// Rules may overlap. The documented tie-break: among rules covering
    /// the hour, the one whose time window starts latest (narrowest
    /// starting boundary) wins; among equal starts, the first rule in
    /// stored order wins. Deterministic and stable across calls.
    pub fn match_rule(&self, hour: u8) -> Option<&PriceRule> {
        let mut best: Option<&PriceRule> = None;
        for rule in self.rules.iter().filter(|r| r.covers_hour(hour)) {
            match best {
                Some(current) if rule.time_from <= current.time_from => {}
                _ => best = Some(rule),
            }
        }
        best
    }

    /// Hourly pre-booked price for a cell: matched rule or venue base price.
    pub fn price_for_hour(&self, hour: u8, base_price: i64) -> i64 {
        self.match_rule(hour)
            .map(|r| r.pre_booked_price)
            .unwrap_or(base_price)
    }
}
