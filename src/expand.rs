use chrono::prelude::*;
use chrono::Duration;

use crate::event::{parse_date, parse_timestamp, EventRecord, EventTime, Span};
use crate::rrule::{parse_rrule, Frequency, RecurrenceRule};

/// Upper bound on loop iterations for a single event, emitted or not.
pub const MAX_ITERATIONS: usize = 1000;

/// Expansion stops once a candidate lands this many days past the requested range.
pub const PAST_RANGE_GUARD_DAYS: i64 = 365;

/// Materializes the occurrences of `event` whose start date lies within
/// `[start_date, end_date]`. Events without a usable rule come back unchanged.
pub fn expand(
    event: &EventRecord,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Vec<EventRecord> {
    let rule = parse_rrule(event.rrule.as_deref());
    if rule.is_empty() {
        return vec![event.clone()];
    }

    let span = match event.date_span().and_then(|_| Span::between(event.start, event.end)) {
        Some(span) => span,
        None => {
            tracing::warn!(
                uid = %event.uid,
                summary = %event.summary,
                "Skipping recurring event with inconsistent start/end"
            );
            return Vec::new();
        }
    };

    let exclusions = exclusion_dates(event);
    let by_weekday = rule.freq == Some(Frequency::Weekly) && !rule.byday.is_empty();

    let mut current = event.start;
    if by_weekday && !rule.byday_contains(current.date().weekday()) {
        if let Some(first) = (1..=7)
            .map(|days| event.start.add_days(days))
            .find(|candidate| rule.byday_contains(candidate.date().weekday()))
        {
            current = first;
        }
    }

    let guard_date = end_date + Duration::days(PAST_RANGE_GUARD_DAYS);
    let mut occurrences = Vec::new();
    let mut emitted: u32 = 0;

    for _ in 0..MAX_ITERATIONS {
        if rule.count.map_or(false, |count| emitted >= count) {
            break;
        }
        if rule.until.map_or(false, |until| is_past_until(current, until)) {
            break;
        }

        let date = current.date();
        if date > end_date {
            break;
        }

        if by_weekday && !rule.byday_contains(date.weekday()) {
            current = current.add_days(1);
            continue;
        }

        if date >= start_date && !exclusions.iter().any(|excluded| *excluded == date) {
            if let Some(occurrence) = occurrence(event, current, span) {
                occurrences.push(occurrence);
                emitted += 1;
            }
        }

        current = match next_candidate(current, &rule, by_weekday) {
            Some(next) => next,
            None => break,
        };

        if current.date() > guard_date {
            break;
        }
    }

    tracing::debug!(uid = %event.uid, count = occurrences.len(), "Expanded recurring event");
    occurrences
}

/// Expands every event of `events` against the same range.
pub fn expand_all(
    events: &[EventRecord],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Vec<EventRecord> {
    events
        .iter()
        .flat_map(|event| expand(event, start_date, end_date))
        .collect()
}

/// Calendar dates excluded from `event`. Timed exclusions are read in the
/// offset of the event's own start, so both sides of the comparison agree on
/// which day an instant falls on.
fn exclusion_dates(event: &EventRecord) -> Vec<NaiveDate> {
    event
        .exdate
        .iter()
        .flatten()
        .filter_map(|raw| {
            let date = match event.start {
                EventTime::Instant(start) if !event.all_day && has_time_part(raw) => {
                    parse_timestamp(raw).map(|dt| dt.with_timezone(start.offset()).date_naive())
                }
                _ => parse_date(raw),
            };
            if date.is_none() {
                tracing::warn!(uid = %event.uid, exdate = %raw, "Ignoring unparsable EXDATE");
            }
            date
        })
        .collect()
}

fn has_time_part(value: &str) -> bool {
    value.trim().contains(|c| c == 'T' || c == ' ')
}

fn is_past_until(current: EventTime, until: DateTime<FixedOffset>) -> bool {
    match current {
        EventTime::DateOnly(date) => date > until.date_naive(),
        EventTime::Instant(instant) => instant > until,
    }
}

fn next_candidate(
    current: EventTime,
    rule: &RecurrenceRule,
    by_weekday: bool,
) -> Option<EventTime> {
    match rule.freq.as_ref()? {
        Frequency::Daily => Some(current.add_days(1)),
        Frequency::Weekly if by_weekday => Some(current.add_days(1)),
        Frequency::Weekly => Some(current.add_days(7)),
        Frequency::Monthly => current.add_months(1),
        Frequency::Yearly => current.add_months(12),
        Frequency::Unknown(_) => None,
    }
}

fn occurrence(base: &EventRecord, start: EventTime, span: Span) -> Option<EventRecord> {
    let end = start.shifted(span)?;
    Some(EventRecord {
        uid: format!("{}_{}", base.uid, start.compact_stamp()),
        start,
        end,
        rrule: None,
        ..base.clone()
    })
}
