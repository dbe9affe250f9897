use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::event::EventRecord;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Share of the day column, in percent, that events are spread across.
pub const AVAILABLE_WIDTH: f64 = 96.0;
/// Left margin, in percent, before the first column.
pub const LEFT_MARGIN: f64 = 2.0;
/// Gap, in percent, between neighbouring columns.
pub const COLUMN_GAP: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnLayout {
    pub column: usize,
    pub total_columns: usize,
}

impl ColumnLayout {
    /// Left edge in percent of the day column; `None` renders at the default position.
    pub fn left_percent(&self) -> Option<f64> {
        if self.total_columns <= 1 {
            return None;
        }
        Some(round2(LEFT_MARGIN + self.column as f64 * self.column_width()))
    }

    /// Width in percent of the day column; `None` renders full width.
    pub fn width_percent(&self) -> Option<f64> {
        if self.total_columns <= 1 {
            return None;
        }
        Some(round2(self.column_width() - COLUMN_GAP))
    }

    fn column_width(&self) -> f64 {
        AVAILABLE_WIDTH / self.total_columns as f64
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Half-open `[start, end)` in minutes from midnight of the day being laid
/// out. Events carried over from an earlier day start at midnight; events
/// ending on a later day are cut at midnight.
#[derive(Debug, Clone, Copy)]
struct Minutes {
    start: u32,
    end: u32,
}

impl Minutes {
    fn of(event: &EventRecord) -> Option<Minutes> {
        Minutes::on(event, event.start.date())
    }

    fn on(event: &EventRecord, day: NaiveDate) -> Option<Minutes> {
        if event.all_day {
            return None;
        }
        let start = if event.start.date() < day {
            0
        } else {
            event.start.minute_of_day()?
        };
        let end = if event.end.date() > day {
            MINUTES_PER_DAY
        } else {
            event.end.minute_of_day()?
        };
        Some(Minutes { start, end })
    }

    fn overlaps(&self, other: &Minutes) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Two timed events overlap when their minute ranges intersect. All-day events never do.
pub fn events_overlap(a: &EventRecord, b: &EventRecord) -> bool {
    match (Minutes::of(a), Minutes::of(b)) {
        (Some(a), Some(b)) => a.overlaps(&b),
        _ => false,
    }
}

/// Column assignment for the timed events of one day, keyed by uid. Each
/// event is measured on its own start day.
///
/// Events are taken in start order and put into the leftmost column holding
/// nothing they overlap. An event's `total_columns` is one past the highest
/// column among itself and the events it directly overlaps, so an event that
/// overlaps nothing always renders full width.
pub fn layout(events: &[EventRecord]) -> BTreeMap<String, ColumnLayout> {
    assign_columns(
        events
            .iter()
            .filter_map(|event| Minutes::of(event).map(|minutes| (event, minutes)))
            .collect(),
    )
}

/// Same as [`layout`], with every event measured on `day`: an event that
/// began on an earlier day occupies `day` from midnight.
pub fn layout_for_day(day: NaiveDate, events: &[EventRecord]) -> BTreeMap<String, ColumnLayout> {
    assign_columns(
        events
            .iter()
            .filter_map(|event| Minutes::on(event, day).map(|minutes| (event, minutes)))
            .collect(),
    )
}

fn assign_columns(mut timed: Vec<(&EventRecord, Minutes)>) -> BTreeMap<String, ColumnLayout> {
    timed.sort_by_key(|(_, minutes)| minutes.start);

    let mut columns: Vec<Vec<usize>> = Vec::new();
    let mut assigned = vec![0usize; timed.len()];
    for (index, (_, minutes)) in timed.iter().enumerate() {
        let column = columns
            .iter()
            .position(|members| {
                members
                    .iter()
                    .all(|&other| !minutes.overlaps(&timed[other].1))
            })
            .unwrap_or(columns.len());
        if column == columns.len() {
            columns.push(Vec::new());
        }
        columns[column].push(index);
        assigned[index] = column;
    }

    let mut layouts = BTreeMap::new();
    for (index, (event, minutes)) in timed.iter().enumerate() {
        let widest_neighbour = timed
            .iter()
            .enumerate()
            .filter(|(other, (_, other_minutes))| {
                *other != index && minutes.overlaps(other_minutes)
            })
            .map(|(other, _)| assigned[other])
            .max();
        let total_columns = match widest_neighbour {
            Some(column) => column.max(assigned[index]) + 1,
            None => 1,
        };
        layouts.insert(
            event.uid.clone(),
            ColumnLayout {
                column: assigned[index],
                total_columns,
            },
        );
    }

    layouts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::prelude::*;

    fn at(h: u32, m: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 3, h, m, 0)
            .unwrap()
    }

    fn timed(uid: &str, from: (u32, u32), to: (u32, u32)) -> EventRecord {
        EventRecord::timed(uid, uid, at(from.0, from.1), at(to.0, to.1))
    }

    fn col(column: usize, total_columns: usize) -> ColumnLayout {
        ColumnLayout { column, total_columns }
    }

    #[test]
    fn chained_overlaps_share_two_columns() {
        let events = vec![
            timed("a", (9, 0), (10, 0)),
            timed("b", (9, 30), (10, 30)),
            timed("c", (10, 15), (11, 0)),
        ];
        let result = layout(&events);

        assert_eq!(result["a"], col(0, 2));
        assert_eq!(result["b"], col(1, 2));
        assert_eq!(result["c"], col(0, 2));
    }

    #[test]
    fn isolated_event_is_full_width() {
        let events = vec![
            timed("a", (9, 0), (10, 0)),
            timed("b", (9, 0), (10, 0)),
            timed("lone", (12, 0), (13, 0)),
        ];
        let result = layout(&events);

        assert_eq!(result["lone"], col(0, 1));
        assert_eq!(result["lone"].width_percent(), None);
        assert_eq!(result["lone"].left_percent(), None);
    }

    #[test]
    fn adjacent_events_do_not_overlap() {
        let result = layout(&[timed("a", (9, 0), (10, 0)), timed("b", (10, 0), (11, 0))]);
        assert_eq!(result["a"], col(0, 1));
        assert_eq!(result["b"], col(0, 1));
    }

    #[test]
    fn all_day_events_are_left_out() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let events = vec![
            EventRecord::all_day("holiday", "Holiday", day, day),
            timed("a", (9, 0), (10, 0)),
        ];
        let result = layout(&events);

        assert!(!result.contains_key("holiday"));
        assert!(!events_overlap(&events[0], &events[1]));
    }

    #[test]
    fn equal_starts_keep_input_order() {
        let result = layout(&[timed("first", (9, 0), (9, 45)), timed("second", (9, 0), (10, 0))]);
        assert_eq!(result["first"].column, 0);
        assert_eq!(result["second"].column, 1);
    }

    #[test]
    fn overnight_event_is_cut_at_midnight() {
        let mut late = timed("late", (23, 0), (23, 0));
        late.end = crate::event::EventTime::Instant(at(23, 0) + chrono::Duration::hours(2));
        let result = layout(&[timed("evening", (22, 30), (23, 30)), late]);
        assert_eq!(result["late"], col(1, 2));
    }

    #[test]
    fn carried_over_event_starts_at_midnight_of_the_day_shown() {
        let mut late = timed("late", (22, 0), (22, 0));
        late.end = crate::event::EventTime::Instant(at(22, 0) + chrono::Duration::hours(4));
        let next_day = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();
        let early = EventRecord::timed(
            "early",
            "early",
            at(1, 0) + chrono::Duration::days(1),
            at(3, 0) + chrono::Duration::days(1),
        );
        let events = vec![late, early];

        let result = layout_for_day(next_day, &events);
        assert_eq!(result["late"], col(0, 2));
        assert_eq!(result["early"], col(1, 2));

        // Measured on its own start day the overnight event misses the early one.
        let result = layout(&events);
        assert_eq!(result["late"], col(0, 1));
    }

    #[test]
    fn geometry_splits_available_width() {
        assert_eq!(col(0, 2).left_percent(), Some(2.0));
        assert_eq!(col(1, 2).left_percent(), Some(50.0));
        assert_eq!(col(1, 2).width_percent(), Some(47.5));
        assert_eq!(col(2, 3).left_percent(), Some(66.0));
        assert_eq!(col(0, 3).width_percent(), Some(31.5));
    }
}
