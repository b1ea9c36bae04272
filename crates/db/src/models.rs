use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use courtbook_core::models::booking::{Booking, BookingItem, BookingStatus, GuestContact};
use courtbook_core::models::venue::{BlackoutSlot, Court, Holiday, OpeningHours, PriceRule, Venue};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbVenue {
    pub id: Uuid,
    pub name: String,
    pub timezone: String,
    pub slot_minutes: i32,
    pub base_price: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<DbVenue> for Venue {
    fn from(row: DbVenue) -> Self {
        Venue {
            id: row.id,
            name: row.name,
            timezone: row.timezone,
            slot_minutes: row.slot_minutes.max(0) as u32,
            base_price: row.base_price,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbCourt {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<DbCourt> for Court {
    fn from(row: DbCourt) -> Self {
        Court {
            id: row.id,
            venue_id: row.venue_id,
            name: row.name,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbOpeningHours {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub weekday: i16,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
}

impl From<DbOpeningHours> for OpeningHours {
    fn from(row: DbOpeningHours) -> Self {
        OpeningHours {
            venue_id: row.venue_id,
            weekday: row.weekday.clamp(1, 7) as u8,
            open_time: row.open_time,
            close_time: row.close_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbPriceRule {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub day_from: Option<i16>,
    pub day_to: Option<i16>,
    pub time_from: NaiveTime,
    pub time_to: NaiveTime,
    pub pre_booked_price: i64,
    pub walk_in_price: i64,
    pub created_at: DateTime<Utc>,
}

impl From<DbPriceRule> for PriceRule {
    fn from(row: DbPriceRule) -> Self {
        PriceRule {
            id: row.id,
            venue_id: row.venue_id,
            day_from: row.day_from.map(|d| d.clamp(1, 7) as u8),
            day_to: row.day_to.map(|d| d.clamp(1, 7) as u8),
            time_from: row.time_from,
            time_to: row.time_to,
            pre_booked_price: row.pre_booked_price,
            walk_in_price: row.walk_in_price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbHoliday {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub holiday_date: NaiveDate,
    pub name: Option<String>,
}

impl From<DbHoliday> for Holiday {
    fn from(row: DbHoliday) -> Self {
        Holiday {
            venue_id: row.venue_id,
            date: row.holiday_date,
            name: row.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBlackoutSlot {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub court_id: Uuid,
    pub slot_date: NaiveDate,
    pub slot_start: i16,
    pub slot_end: i16,
}

impl From<DbBlackoutSlot> for BlackoutSlot {
    fn from(row: DbBlackoutSlot) -> Self {
        BlackoutSlot {
            venue_id: row.venue_id,
            court_id: row.court_id,
            date: row.slot_date,
            slot_start: row.slot_start.max(0) as u8,
            slot_end: row.slot_end.max(0) as u8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBooking {
    pub id: Uuid,
    pub code: String,
    pub venue_id: Uuid,
    pub user_id: Option<Uuid>,
    pub guest_name: Option<String>,
    pub guest_phone: Option<String>,
    pub status: String,
    pub gross_amount: i64,
    pub discount: i64,
    pub addons_total: i64,
    pub total_amount: i64,
    pub payment_expires_at: DateTime<Utc>,
    pub cancel_reason: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbBooking {
    pub fn status(&self) -> Option<BookingStatus> {
        BookingStatus::from_code(&self.status)
    }

    pub fn into_model(self) -> Option<Booking> {
        let status = BookingStatus::from_code(&self.status)?;
        let guest = match (self.guest_name, self.guest_phone) {
            (Some(name), Some(phone)) => Some(GuestContact { name, phone }),
            _ => None,
        };
        Some(Booking {
            id: self.id,
            code: self.code,
            venue_id: self.venue_id,
            user_id: self.user_id,
            guest,
            status,
            gross_amount: self.gross_amount,
            discount: self.discount,
            addons_total: self.addons_total,
            total_amount: self.total_amount,
            payment_expires_at: self.payment_expires_at,
            cancel_reason: self.cancel_reason,
            note: self.note,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBookingItem {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub court_id: Uuid,
    pub slot_date: NaiveDate,
    pub slot_start: i16,
    pub slot_end: i16,
    pub unit_price: i64,
    pub line_amount: i64,
    pub released: bool,
}

impl From<DbBookingItem> for BookingItem {
    fn from(row: DbBookingItem) -> Self {
        BookingItem {
            id: row.id,
            booking_id: row.booking_id,
            court_id: row.court_id,
            slot_date: row.slot_date,
            slot_start: row.slot_start.max(0) as u8,
            slot_end: row.slot_end.max(0) as u8,
            unit_price: row.unit_price,
            line_amount: row.line_amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBookingAddon {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub name: String,
    pub amount: i64,
}
