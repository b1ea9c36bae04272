use chrono::{NaiveDate, NaiveTime};
use courtbook_core::models::venue::{OpeningHours, PriceRule};
use courtbook_core::resolver::{ResolvedDay, default_close, default_open};
use pretty_assertions::assert_eq;
use rstest::rstest;
use uuid::Uuid;

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}

fn hours(venue_id: Uuid, weekday: u8, open: NaiveTime, close: NaiveTime) -> OpeningHours {
    OpeningHours {
        venue_id,
        weekday,
        open_time: open,
        close_time: close,
    }
}

fn rule(
    venue_id: Uuid,
    day_from: Option<u8>,
    day_to: Option<u8>,
    from: NaiveTime,
    to: NaiveTime,
    price: i64,
) -> PriceRule {
    PriceRule {
        id: Uuid::new_v4(),
        venue_id,
        day_from,
        day_to,
        time_from: from,
        time_to: to,
        pre_booked_price: price,
        walk_in_price: price + 10_000,
    }
}

// 2025-03-04 is a Tuesday (ISO weekday 2).
const TUESDAY: &str = "2025-03-04";

fn tuesday() -> NaiveDate {
    TUESDAY.parse().expect("valid date")
}

#[test]
fn test_unconfigured_venue_resolves_to_defaults() {
    let day = ResolvedDay::resolve(tuesday(), &[], &[]);

    assert_eq!(day.weekday, 2);
    assert_eq!(day.open_time, default_open());
    assert_eq!(day.close_time, default_close());
    assert!(day.rules.is_empty());
}

#[test]
fn test_weekday_without_rows_falls_back_to_default_window() {
    let venue_id = Uuid::new_v4();
    // Only Monday is configured; Tuesday gets the defaults.
    let rows = vec![hours(venue_id, 1, t(8, 0), t(20, 0))];

    let day = ResolvedDay::resolve(tuesday(), &rows, &[]);

    assert_eq!(day.open_time, default_open());
    assert_eq!(day.close_time, default_close());
}

#[test]
fn test_duplicate_weekday_rows_take_widest_union() {
    let venue_id = Uuid::new_v4();
    let rows = vec![
        hours(venue_id, 2, t(6, 0), t(12, 0)),
        hours(venue_id, 2, t(8, 0), t(21, 0)),
    ];

    let day = ResolvedDay::resolve(tuesday(), &rows, &[]);

    assert_eq!(day.open_time, t(6, 0));
    assert_eq!(day.close_time, t(21, 0));
}

#[test]
fn test_rules_filtered_by_day_of_week_range() {
    let venue_id = Uuid::new_v4();
    let rules = vec![
        // Mon-Fri: applies on Tuesday
        rule(venue_id, Some(1), Some(5), t(6, 0), t(22, 0), 100_000),
        // Weekend only: does not apply
        rule(venue_id, Some(6), Some(7), t(6, 0), t(22, 0), 150_000),
        // Unset bounds default to the whole week
        rule(venue_id, None, None, t(18, 0), t(21, 0), 120_000),
    ];

    let day = ResolvedDay::resolve(tuesday(), &[], &rules);

    assert_eq!(day.rules.len(), 2);
    assert!(day.rules.iter().all(|r| r.covers_weekday(2)));
}

#[test]
fn test_rules_sorted_ascending_by_time_of_day_start() {
    let venue_id = Uuid::new_v4();
    let rules = vec![
        rule(venue_id, None, None, t(17, 0), t(21, 0), 1),
        rule(venue_id, None, None, t(6, 0), t(12, 0), 2),
        rule(venue_id, None, None, t(12, 0), t(17, 0), 3),
    ];

    let day = ResolvedDay::resolve(tuesday(), &[], &rules);

    let starts: Vec<NaiveTime> = day.rules.iter().map(|r| r.time_from).collect();
    assert_eq!(starts, vec![t(6, 0), t(12, 0), t(17, 0)]);
}

#[rstest]
#[case(4, false)] // before open
#[case(5, true)] // first bookable hour
#[case(21, true)] // last full hour before 22:00 close
#[case(22, false)] // cell [22, 23) overruns the close
#[case(24, false)] // not an hour of day
fn test_hour_in_window_boundaries(#[case] hour: u8, #[case] expected: bool) {
    let day = ResolvedDay::resolve(tuesday(), &[], &[]);
    assert_eq!(day.hour_in_window(hour), expected);
}

#[test]
fn test_overlap_tie_break_latest_start_wins() {
    let venue_id = Uuid::new_v4();
    // Both rules cover hour 18 on a Tuesday; the evening rule's window
    // starts later and must win.
    let all_day = rule(venue_id, Some(1), Some(5), t(6, 0), t(22, 0), 100_000);
    let evening = rule(venue_id, Some(1), Some(5), t(17, 0), t(21, 0), 150_000);
    let rules = vec![all_day, evening];

    let day = ResolvedDay::resolve(tuesday(), &[], &rules);

    let matched = day.match_rule(18).expect("a rule must match hour 18");
    assert_eq!(matched.time_from, t(17, 0));
    assert_eq!(matched.pre_booked_price, 150_000);
}

#[test]
fn test_overlap_tie_break_equal_start_prefers_stored_order() {
    let venue_id = Uuid::new_v4();
    let first = rule(venue_id, None, None, t(17, 0), t(23, 0), 111_000);
    let second = rule(venue_id, None, None, t(17, 0), t(20, 0), 222_000);
    let first_id = first.id;
    let rules = vec![first, second];

    let day = ResolvedDay::resolve(tuesday(), &[], &rules);

    let matched = day.match_rule(18).expect("a rule must match hour 18");
    assert_eq!(matched.id, first_id);
}

#[test]
fn test_tie_break_is_stable_across_repeated_calls() {
    let venue_id = Uuid::new_v4();
    let rules = vec![
        rule(venue_id, None, None, t(6, 0), t(22, 0), 100_000),
        rule(venue_id, None, None, t(17, 0), t(21, 0), 150_000),
    ];
    let day = ResolvedDay::resolve(tuesday(), &[], &rules);

    let first_pick = day.match_rule(18).expect("match").id;
    for _ in 0..50 {
        assert_eq!(day.match_rule(18).expect("match").id, first_pick);
    }
}

#[test]
fn test_time_window_end_is_exclusive() {
    let venue_id = Uuid::new_v4();
    let rules = vec![rule(venue_id, None, None, t(6, 0), t(22, 0), 100_000)];
    let day = ResolvedDay::resolve(tuesday(), &[], &rules);

    assert!(day.match_rule(21).is_some());
    assert!(day.match_rule(22).is_none());
}

#[test]
fn test_price_falls_back_to_base_price() {
    let venue_id = Uuid::new_v4();
    let rules = vec![rule(venue_id, None, None, t(18, 0), t(21, 0), 150_000)];
    let day = ResolvedDay::resolve(tuesday(), &[], &rules);

    assert_eq!(day.price_for_hour(19, 80_000), 150_000);
    assert_eq!(day.price_for_hour(10, 80_000), 80_000);
}
