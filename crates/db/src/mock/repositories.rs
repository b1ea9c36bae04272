use chrono::{DateTime, NaiveDate, Utc};
use courtbook_core::errors::BookingResult;
use courtbook_core::lifecycle::TransitionOutcome;
use courtbook_core::models::booking::BookingStatus;
use mockall::mock;
use uuid::Uuid;

use crate::models::{
    DbBlackoutSlot, DbBooking, DbBookingItem, DbCourt, DbOpeningHours, DbPriceRule, DbVenue,
};

// Mock repositories for testing
mock! {
    pub VenueRepo {
        pub async fn get_venue_by_id(&self, id: Uuid) -> eyre::Result<Option<DbVenue>>;

        pub async fn list_active_courts(&self, venue_id: Uuid) -> eyre::Result<Vec<DbCourt>>;

        pub async fn get_opening_hours(&self, venue_id: Uuid) -> eyre::Result<Vec<DbOpeningHours>>;

        pub async fn get_price_rules(&self, venue_id: Uuid) -> eyre::Result<Vec<DbPriceRule>>;

        pub async fn is_holiday(&self, venue_id: Uuid, date: NaiveDate) -> eyre::Result<bool>;

        pub async fn get_blackouts(
            &self,
            venue_id: Uuid,
            date: NaiveDate,
        ) -> eyre::Result<Vec<DbBlackoutSlot>>;

        pub async fn occupied_cells(
            &self,
            venue_id: Uuid,
            date: NaiveDate,
        ) -> eyre::Result<Vec<(Uuid, i16)>>;
    }
}

mock! {
    pub BookingRepo {
        pub async fn get_booking_by_id(&self, id: Uuid) -> eyre::Result<Option<DbBooking>>;

        pub async fn get_booking_by_code(&self, code: &'static str) -> eyre::Result<Option<DbBooking>>;

        pub async fn get_booking_items(&self, booking_id: Uuid) -> eyre::Result<Vec<DbBookingItem>>;

        pub async fn confirm_booking(&self, id: Uuid) -> BookingResult<TransitionOutcome>;

        pub async fn cancel_booking(
            &self,
            id: Uuid,
            reason: &'static str,
        ) -> BookingResult<TransitionOutcome>;

        pub async fn find_expired(&self, now: DateTime<Utc>) -> eyre::Result<Vec<DbBooking>>;

        pub async fn list_bookings_by_user(
            &self,
            user_id: Uuid,
            status: Option<BookingStatus>,
        ) -> eyre::Result<Vec<DbBooking>>;
    }
}
