use chrono::prelude::*;
use chrono::Duration;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

use crate::dedupe::dedupe;
use crate::event::EventRecord;
use crate::expand::expand_all;

#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub events: Vec<EventRecord>,
}

/// Events placed into an ordered list of days. Iteration follows the
/// order the days were supplied in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeekEvents {
    days: Vec<DayBucket>,
    index: HashMap<NaiveDate, usize>,
}

impl WeekEvents {
    /// One empty bucket per distinct date; a repeated date keeps its first position.
    pub fn new(days: &[NaiveDate]) -> Self {
        let mut buckets: Vec<DayBucket> = Vec::with_capacity(days.len());
        let mut index = HashMap::with_capacity(days.len());
        for date in days {
            if !index.contains_key(date) {
                index.insert(*date, buckets.len());
                buckets.push(DayBucket {
                    date: *date,
                    events: Vec::new(),
                });
            }
        }
        WeekEvents {
            days: buckets,
            index,
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&[EventRecord]> {
        self.index
            .get(&date)
            .map(|&position| self.days[position].events.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DayBucket> {
        self.days.iter()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.days.iter().map(|b| b.date).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().all(|b| b.events.is_empty())
    }

    /// Adds `event` to the first day inside `[start, end]`; returns whether one matched.
    fn place(&mut self, event: EventRecord, start: NaiveDate, end: NaiveDate) -> bool {
        match self.days.iter_mut().find(|b| start <= b.date && b.date <= end) {
            Some(bucket) => {
                bucket.events.push(event);
                true
            }
            None => false,
        }
    }
}

impl Serialize for WeekEvents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.days.len()))?;
        for bucket in &self.days {
            let key = bucket.date.format("%Y-%m-%d").to_string();
            map.serialize_entry(&key, &bucket.events)?;
        }
        map.end()
    }
}

/// Buckets already-expanded events into `days` and removes duplicates per day.
/// Each event lands on the first day of `days` it overlaps, even when it spans several.
pub fn filter_events(events: &[EventRecord], days: &[NaiveDate]) -> WeekEvents {
    let mut week = WeekEvents::new(days);

    for event in events {
        let (start, end) = match event.date_span() {
            Some(span) => span,
            None => {
                tracing::warn!(
                    uid = %event.uid,
                    summary = %event.summary,
                    "Error processing event: start and end are not comparable dates"
                );
                continue;
            }
        };
        week.place(event.clone(), start, end);
    }

    for bucket in week.days.iter_mut().filter(|b| !b.events.is_empty()) {
        bucket.events = dedupe(std::mem::take(&mut bucket.events));
    }

    week
}

/// Expands recurring events over the span of `days`, then buckets everything.
pub fn filter_events_with_recurring(
    events: &[EventRecord],
    days: &[NaiveDate],
) -> WeekEvents {
    let (first, last) = match (days.iter().min(), days.iter().max()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return WeekEvents::default(),
    };
    filter_events(&expand_all(events, first, last), days)
}

/// Consecutive days from `start` to `end`, both inclusive.
pub fn dates_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut next = Some(start);
    while let Some(current) = next.filter(|date| *date <= end) {
        dates.push(current);
        next = current.succ_opt();
    }
    dates
}

/// The window shown around `reference`: `days_in_past` days before it through
/// `days_in_future` after. Bounds saturate at the ends of the calendar.
pub fn window_around(
    reference: NaiveDate,
    days_in_past: u32,
    days_in_future: u32,
) -> Vec<NaiveDate> {
    let first = reference
        .checked_sub_signed(Duration::days(i64::from(days_in_past)))
        .unwrap_or(NaiveDate::MIN);
    let last = reference
        .checked_add_signed(Duration::days(i64::from(days_in_future)))
        .unwrap_or(NaiveDate::MAX);
    dates_between(first, last)
}
