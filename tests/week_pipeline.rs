use chrono::prelude::*;
use webcal_week::snapshot::{load_events, save_events};
use webcal_week::window::dates_between;
use webcal_week::{filter_events_with_recurring, layout_for_day, EventRecord, Untranslated};

fn msk(d: u32, h: u32, m: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(3 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 6, d, h, m, 0)
        .unwrap()
}

fn ymd(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn sample_events() -> Vec<EventRecord> {
    vec![
        EventRecord::timed("standup", "Standup", msk(3, 9, 0), msk(3, 10, 0))
            .with_rrule("FREQ=DAILY;COUNT=5")
            .with_exdates(vec!["2024-06-05T09:00:00+03:00"]),
        EventRecord::timed("review", "Review", msk(4, 9, 30), msk(4, 10, 30)),
        EventRecord::timed("lunch", "Lunch", msk(4, 10, 15), msk(4, 11, 0)),
        EventRecord::all_day("conf", "Conference", ymd(1), ymd(5)),
        EventRecord::timed("yoga", "Yoga", msk(4, 18, 0), msk(4, 19, 0))
            .with_rrule("FREQ=WEEKLY;BYDAY=TU,TH"),
    ]
}

#[test]
fn snapshot_round_trip_feeds_the_week_view() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache").join("webcal_events.json");
    save_events(&path, &sample_events(), msk(3, 8, 0)).unwrap();
    assert!(!dir.path().join("cache").join("webcal_events.json.tmp").exists());

    let events = load_events(&path, &Untranslated).unwrap().unwrap();
    assert_eq!(events, sample_events());

    let week = filter_events_with_recurring(&events, &dates_between(ymd(3), ymd(9)));
    let uids = |d: u32| -> Vec<String> {
        week.get(ymd(d))
            .unwrap()
            .iter()
            .map(|e| e.uid.clone())
            .collect()
    };

    assert_eq!(uids(3), vec!["standup_20240603T090000", "conf"]);
    assert_eq!(
        uids(4),
        vec!["standup_20240604T090000", "review", "lunch", "yoga_20240604T180000"]
    );
    assert!(uids(5).is_empty());
    assert_eq!(uids(6), vec!["standup_20240606T090000", "yoga_20240606T180000"]);
    assert_eq!(uids(7), vec!["standup_20240607T090000"]);

    let tuesday = layout_for_day(ymd(4), week.get(ymd(4)).unwrap());
    assert_eq!(tuesday["standup_20240604T090000"].total_columns, 2);
    assert_eq!(tuesday["review"].column, 1);
    assert_eq!(tuesday["lunch"].column, 0);
    assert_eq!(tuesday["lunch"].total_columns, 2);
    assert_eq!(tuesday["yoga_20240604T180000"].total_columns, 1);
}

#[test]
fn missing_snapshot_is_reported_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = load_events(&dir.path().join("absent.json"), &Untranslated).unwrap();
    assert!(loaded.is_none());
}

#[test]
fn filter_and_layout_are_idempotent() {
    let days = dates_between(ymd(3), ymd(9));
    let render = || {
        let week = filter_events_with_recurring(&sample_events(), &days);
        let layouts: Vec<_> = week
            .iter()
            .map(|bucket| layout_for_day(bucket.date, &bucket.events))
            .collect();
        (
            serde_json::to_string(&week).unwrap(),
            serde_json::to_string(&layouts).unwrap(),
        )
    };
    assert_eq!(render(), render());
}

#[test]
fn overnight_event_carried_into_the_window_is_laid_out_from_midnight() {
    let night_shift = EventRecord::timed("night", "Night shift", msk(2, 22, 0), msk(3, 2, 0));
    let early = EventRecord::timed("early", "Early call", msk(3, 1, 0), msk(3, 1, 30));
    let week = filter_events_with_recurring(&[night_shift, early], &dates_between(ymd(3), ymd(4)));

    let monday = week.get(ymd(3)).unwrap();
    assert_eq!(monday.len(), 2);
    let columns = layout_for_day(ymd(3), monday);
    assert_eq!(columns["night"].column, 0);
    assert_eq!(columns["early"].column, 1);
    assert_eq!(columns["early"].total_columns, 2);
}
