use chrono::prelude::*;
use std::collections::BTreeMap;

use crate::event::{EventRecord, EventTime};
use crate::i18n::Translate;
use crate::layout::{ColumnLayout, LEFT_MARGIN};

/// Height, in pixels, of an all-day chip and the floor for short timed events.
pub const MIN_EVENT_HEIGHT: f64 = 20.0;

/// `HH:MM - HH:MM`, or the translated "All Day".
pub fn format_event_time(event: &EventRecord, translator: &dyn Translate) -> String {
    match (event.all_day, event.start, event.end) {
        (false, EventTime::Instant(start), EventTime::Instant(end)) => {
            format!("{} - {}", start.format("%H:%M"), end.format("%H:%M"))
        }
        _ => translator.translate("All Day").to_string(),
    }
}

/// Offset from the top of the grid; one pixel per minute.
pub fn event_top_position(event: &EventRecord) -> f64 {
    if event.all_day {
        return 0.0;
    }
    event.start.minute_of_day().map_or(0.0, f64::from)
}

pub fn event_height(event: &EventRecord) -> f64 {
    if event.all_day {
        return MIN_EVENT_HEIGHT;
    }
    match (event.start.minute_of_day(), event.end.minute_of_day()) {
        (Some(start), Some(end)) => (f64::from(end) - f64::from(start)).max(MIN_EVENT_HEIGHT),
        _ => MIN_EVENT_HEIGHT,
    }
}

/// All-day events are past once their start date is before `today`; timed
/// events once they have ended.
pub fn event_is_past(event: &EventRecord, today: NaiveDate, now: DateTime<FixedOffset>) -> bool {
    match (event.all_day, event.end) {
        (true, _) => event.start.date() < today,
        (false, EventTime::Instant(end)) => end < now,
        (false, EventTime::DateOnly(_)) => false,
    }
}

pub fn event_left_position(event: &EventRecord, layouts: &BTreeMap<String, ColumnLayout>) -> f64 {
    layouts
        .get(&event.uid)
        .and_then(ColumnLayout::left_percent)
        .unwrap_or(LEFT_MARGIN)
}

pub fn event_width(event: &EventRecord, layouts: &BTreeMap<String, ColumnLayout>) -> Option<f64> {
    layouts.get(&event.uid).and_then(ColumnLayout::width_percent)
}
