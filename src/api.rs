//! Request handling for `GET /events` and `GET /health`, independent of any HTTP stack.

use chrono::prelude::*;
use chrono::SecondsFormat;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::event::EventRecord;
use crate::i18n::Translate;
use crate::window::{dates_between, filter_events_with_recurring, WeekEvents};

pub const READ_FAILURE_MESSAGE: &str =
    "Failed to read calendar data from file. Check if fetcher service is running.";

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub events: WeekEvents,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub fn parse_query_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| Error::InvalidQuery("Invalid date format. Use YYYY-MM-DD".to_string()))
}

/// Places `events` into every day from `start_date` to `end_date`, with timed
/// events shown in `now`'s offset. `None` or an empty list means the snapshot
/// could not be read.
pub fn events_response(
    start_date: Option<&str>,
    end_date: Option<&str>,
    events: Option<&[EventRecord]>,
    translator: &dyn Translate,
    now: DateTime<FixedOffset>,
) -> Result<EventsResponse> {
    let (start_date, end_date) = match (start_date, end_date) {
        (Some(start), Some(end)) => (parse_query_date(start)?, parse_query_date(end)?),
        _ => {
            return Err(Error::InvalidQuery(
                "start_date and end_date parameters are required".to_string(),
            ))
        }
    };
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Secs, false);

    let events = match events {
        Some(events) if !events.is_empty() => events,
        _ => {
            return Ok(EventsResponse {
                events: WeekEvents::default(),
                error: Some(translator.translate(READ_FAILURE_MESSAGE).to_string()),
                timestamp,
            })
        }
    };

    let display_offset = *now.offset();
    let shown: Vec<EventRecord> = events
        .iter()
        .cloned()
        .map(|event| event.with_offset(display_offset))
        .collect();
    let days = dates_between(start_date, end_date);

    Ok(EventsResponse {
        events: filter_events_with_recurring(&shown, &days),
        error: None,
        timestamp,
    })
}

pub fn health_response(translator: &dyn Translate, now: DateTime<FixedOffset>) -> HealthResponse {
    HealthResponse {
        status: translator.translate("healthy").to_string(),
        timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, false),
    }
}
