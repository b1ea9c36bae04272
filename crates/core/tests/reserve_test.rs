use chrono::{NaiveDate, NaiveTime};
use courtbook_core::errors::BookingError;
use courtbook_core::models::booking::{AddonItem, CellRequest, GuestContact};
use courtbook_core::models::venue::{BlackoutSlot, Court, OpeningHours, PriceRule, Venue};
use courtbook_core::reserve::plan_reservation;
use courtbook_core::resolver::ResolvedDay;
use pretty_assertions::assert_eq;
use uuid::Uuid;

fn t(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).expect("valid time")
}

// 2025-03-04 is a Tuesday.
fn tuesday() -> NaiveDate {
    "2025-03-04".parse().expect("valid date")
}

struct Fixture {
    venue: Venue,
    courts: Vec<Court>,
    day: ResolvedDay,
}

/// Venue open 05:00-23:00, one court, Mon-Fri 06:00-22:00 rule at 100000.
fn fixture() -> Fixture {
    let venue_id = Uuid::new_v4();
    let venue = Venue {
        id: venue_id,
        name: "Center Court Club".to_string(),
        timezone: "UTC".to_string(),
        slot_minutes: 60,
        base_price: 80_000,
        is_active: true,
    };
    let courts = vec![Court {
        id: Uuid::new_v4(),
        venue_id,
        name: "Court A".to_string(),
        is_active: true,
    }];
    let hours = vec![OpeningHours {
        venue_id,
        weekday: 2,
        open_time: t(5),
        close_time: t(23),
    }];
    let rules = vec![PriceRule {
        id: Uuid::new_v4(),
        venue_id,
        day_from: Some(1),
        day_to: Some(5),
        time_from: t(6),
        time_to: t(22),
        pre_booked_price: 100_000,
        walk_in_price: 120_000,
    }];
    let day = ResolvedDay::resolve(tuesday(), &hours, &rules);
    Fixture { venue, courts, day }
}

fn user() -> Option<Uuid> {
    Some(Uuid::new_v4())
}

#[test]
fn test_single_cell_reservation_is_priced_by_the_rule() {
    let f = fixture();
    let cells = vec![CellRequest {
        court_id: f.courts[0].id,
        hour: 18,
    }];

    let plan = plan_reservation(
        &f.venue, &f.courts, &f.day, tuesday(), false, &[], user(), None, &cells, 0, &[],
    )
    .expect("reservation must plan");

    assert_eq!(plan.cells.len(), 1);
    assert_eq!(plan.cells[0].unit_price, 100_000);
    assert_eq!(plan.gross_amount, 100_000);
    assert_eq!(plan.total_amount, 100_000);
}

#[test]
fn test_totals_combine_discount_and_addons() {
    let f = fixture();
    let cells = vec![
        CellRequest {
            court_id: f.courts[0].id,
            hour: 18,
        },
        CellRequest {
            court_id: f.courts[0].id,
            hour: 19,
        },
    ];
    let addons = vec![
        AddonItem {
            name: "racket rental".to_string(),
            amount: 30_000,
        },
        AddonItem {
            name: "balls".to_string(),
            amount: 20_000,
        },
    ];

    let plan = plan_reservation(
        &f.venue, &f.courts, &f.day, tuesday(), false, &[], user(), None, &cells, 50_000, &addons,
    )
    .expect("reservation must plan");

    assert_eq!(plan.gross_amount, 200_000);
    assert_eq!(plan.addons_total, 50_000);
    assert_eq!(plan.discount, 50_000);
    // total = gross - discount + addons
    assert_eq!(plan.total_amount, 200_000);
}

#[test]
fn test_empty_cell_set_is_rejected() {
    let f = fixture();
    let err = plan_reservation(
        &f.venue, &f.courts, &f.day, tuesday(), false, &[], user(), None, &[], 0, &[],
    )
    .expect_err("empty request must fail");
    assert!(matches!(err, BookingError::Validation(_)));
}

#[test]
fn test_user_and_guest_are_mutually_exclusive() {
    let f = fixture();
    let cells = vec![CellRequest {
        court_id: f.courts[0].id,
        hour: 18,
    }];
    let guest = GuestContact {
        name: "Walk In".to_string(),
        phone: "+8490000000".to_string(),
    };

    let neither = plan_reservation(
        &f.venue, &f.courts, &f.day, tuesday(), false, &[], None, None, &cells, 0, &[],
    );
    assert!(matches!(neither, Err(BookingError::Validation(_))));

    let both = plan_reservation(
        &f.venue,
        &f.courts,
        &f.day,
        tuesday(),
        false,
        &[],
        user(),
        Some(&guest),
        &cells,
        0,
        &[],
    );
    assert!(matches!(both, Err(BookingError::Validation(_))));

    let guest_only = plan_reservation(
        &f.venue,
        &f.courts,
        &f.day,
        tuesday(),
        false,
        &[],
        None,
        Some(&guest),
        &cells,
        0,
        &[],
    );
    assert!(guest_only.is_ok());
}

#[test]
fn test_inactive_venue_is_rejected() {
    let mut f = fixture();
    f.venue.is_active = false;
    let cells = vec![CellRequest {
        court_id: f.courts[0].id,
        hour: 18,
    }];

    let err = plan_reservation(
        &f.venue, &f.courts, &f.day, tuesday(), false, &[], user(), None, &cells, 0, &[],
    )
    .expect_err("inactive venue must fail");
    assert!(matches!(err, BookingError::Validation(_)));
}

#[test]
fn test_holiday_is_rejected() {
    let f = fixture();
    let cells = vec![CellRequest {
        court_id: f.courts[0].id,
        hour: 18,
    }];

    let err = plan_reservation(
        &f.venue, &f.courts, &f.day, tuesday(), true, &[], user(), None, &cells, 0, &[],
    )
    .expect_err("holiday must fail");
    assert!(matches!(err, BookingError::Validation(_)));
}

#[test]
fn test_hour_outside_opening_window_is_rejected() {
    let f = fixture();
    let cells = vec![CellRequest {
        court_id: f.courts[0].id,
        hour: 23,
    }];

    let err = plan_reservation(
        &f.venue, &f.courts, &f.day, tuesday(), false, &[], user(), None, &cells, 0, &[],
    )
    .expect_err("out-of-hours must fail");
    assert!(matches!(err, BookingError::Validation(_)));
}

#[test]
fn test_blackout_cell_is_rejected() {
    let f = fixture();
    let court_id = f.courts[0].id;
    let blackouts = vec![BlackoutSlot {
        venue_id: f.venue.id,
        court_id,
        date: tuesday(),
        slot_start: 18,
        slot_end: 19,
    }];
    let cells = vec![CellRequest { court_id, hour: 18 }];

    let err = plan_reservation(
        &f.venue, &f.courts, &f.day, tuesday(), false, &blackouts, user(), None, &cells, 0, &[],
    )
    .expect_err("blackout must fail");
    assert!(matches!(err, BookingError::Validation(_)));

    // The hour right after the blackout window is bookable.
    let cells = vec![CellRequest { court_id, hour: 19 }];
    let ok = plan_reservation(
        &f.venue, &f.courts, &f.day, tuesday(), false, &blackouts, user(), None, &cells, 0, &[],
    );
    assert!(ok.is_ok());
}

#[test]
fn test_unknown_court_is_not_found() {
    let f = fixture();
    let cells = vec![CellRequest {
        court_id: Uuid::new_v4(),
        hour: 18,
    }];

    let err = plan_reservation(
        &f.venue, &f.courts, &f.day, tuesday(), false, &[], user(), None, &cells, 0, &[],
    )
    .expect_err("unknown court must fail");
    assert!(matches!(err, BookingError::NotFound(_)));
}

#[test]
fn test_duplicate_cell_in_request_is_rejected() {
    let f = fixture();
    let court_id = f.courts[0].id;
    let cells = vec![
        CellRequest { court_id, hour: 18 },
        CellRequest { court_id, hour: 18 },
    ];

    let err = plan_reservation(
        &f.venue, &f.courts, &f.day, tuesday(), false, &[], user(), None, &cells, 0, &[],
    )
    .expect_err("duplicate cell must fail");
    assert!(matches!(err, BookingError::Validation(_)));
}

#[test]
fn test_negative_total_is_rejected() {
    let f = fixture();
    let cells = vec![CellRequest {
        court_id: f.courts[0].id,
        hour: 18,
    }];

    let err = plan_reservation(
        &f.venue,
        &f.courts,
        &f.day,
        tuesday(),
        false,
        &[],
        user(),
        None,
        &cells,
        500_000, // exceeds the 100000 gross
        &[],
    )
    .expect_err("negative total must fail");
    assert!(matches!(err, BookingError::Validation(_)));
}
