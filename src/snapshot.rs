//! The JSON snapshot shared between the fetcher and the frontend.
//!
//! Writers replace the file through a temporary sibling and a rename, so a
//! reader always sees either the previous or the next complete document.

use chrono::prelude::*;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::event::{parse_date, parse_timestamp, EventRecord, EventTime};
use crate::i18n::Translate;

#[derive(Debug, Deserialize)]
struct RawEvent {
    uid: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    all_day: Option<bool>,
    start: Option<String>,
    end: Option<String>,
    rrule: Option<String>,
    exdate: Option<Vec<String>>,
}

impl RawEvent {
    fn into_record(self, translator: &dyn Translate) -> Option<EventRecord> {
        let all_day = self.all_day.unwrap_or(false);
        let (start, end) = match (self.start.as_deref(), self.end.as_deref()) {
            (Some(start), Some(end)) => (start, end),
            _ => return None,
        };
        let (start, end) = if all_day {
            (EventTime::DateOnly(parse_date(start)?), EventTime::DateOnly(parse_date(end)?))
        } else {
            (EventTime::Instant(parse_timestamp(start)?), EventTime::Instant(parse_timestamp(end)?))
        };

        Some(EventRecord {
            uid: self.uid.unwrap_or_default(),
            summary: self
                .summary
                .unwrap_or_else(|| translator.translate("No Title").to_string()),
            description: self.description.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            all_day,
            start,
            end,
            rrule: self.rrule,
            exdate: self.exdate,
        })
    }
}

#[derive(Serialize)]
struct Document<'a> {
    events: &'a [EventRecord],
    updated_at: String,
}

/// Decodes a snapshot document. Elements that are malformed or lack usable
/// `start`/`end` values are logged and skipped.
pub fn decode_events(json: &str, translator: &dyn Translate) -> Result<Vec<EventRecord>> {
    let document: Value = serde_json::from_str(json)?;
    let raw_events: &[Value] = match document.get("events") {
        Some(Value::Array(events)) => events.as_slice(),
        _ => &[],
    };

    let mut events = Vec::with_capacity(raw_events.len());
    for raw in raw_events {
        let summary = raw
            .get("summary")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string();
        match serde_json::from_value::<RawEvent>(raw.clone()) {
            Ok(raw_event) => match raw_event.into_record(translator) {
                Some(event) => events.push(event),
                None => tracing::warn!(summary = %summary, "Error parsing event dates, skipping"),
            },
            Err(e) => tracing::warn!(
                summary = %summary,
                error = %e,
                "Malformed event in snapshot, skipping"
            ),
        }
    }
    Ok(events)
}

/// Reads the snapshot at `path`. A missing file yields `Ok(None)`.
pub fn load_events(path: &Path, translator: &dyn Translate) -> Result<Option<Vec<EventRecord>>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "JSON snapshot not found");
        return Ok(None);
    }
    let json = fs::read_to_string(path)?;
    let events = decode_events(&json, translator)?;
    tracing::info!(count = events.len(), path = %path.display(), "Read events from JSON snapshot");
    Ok(Some(events))
}

pub fn save_events(
    path: &Path,
    events: &[EventRecord],
    updated_at: DateTime<FixedOffset>,
) -> Result<()> {
    let document = Document {
        events,
        updated_at: updated_at.to_rfc3339_opts(SecondsFormat::Secs, false),
    };
    write_atomic(path, serde_json::to_string_pretty(&document)?.as_bytes())?;
    tracing::info!(count = events.len(), path = %path.display(), "Saved parsed events");
    Ok(())
}

/// Writes `contents` to a `.tmp` sibling, then renames it over `path`.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let temp = temp_path(path);
    fs::write(&temp, contents)?;
    fs::rename(&temp, path)?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{Russian, Untranslated};

    #[test]
    fn bad_events_are_skipped_individually() {
        let json = r#"{
            "events": [
                {"uid": "ok", "summary": "Ok", "all_day": false,
                 "start": "2024-06-03T09:00:00+03:00", "end": "2024-06-03T10:00:00+03:00"},
                {"uid": "no-end", "summary": "No end", "start": "2024-06-03T09:00:00+03:00"},
                {"uid": "bad", "summary": "Bad", "start": "yesterday", "end": "today"},
                {"uid": 42, "start": "2024-06-03", "end": "2024-06-03"},
                {"uid": "day", "all_day": true, "start": "2024-06-03", "end": "2024-06-04T00:00:00",
                 "rrule": "FREQ=DAILY", "exdate": ["20240605"]}
            ],
            "updated_at": "2024-06-03T08:00:00+03:00"
        }"#;
        let events = decode_events(json, &Russian).unwrap();

        let uids: Vec<&str> = events.iter().map(|e| e.uid.as_str()).collect();
        assert_eq!(uids, vec!["ok", "day"]);
        assert_eq!(events[1].summary, "Без названия");
        let fourth = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();
        assert_eq!(events[1].end, EventTime::DateOnly(fourth));
        assert_eq!(events[1].rrule.as_deref(), Some("FREQ=DAILY"));
    }

    #[test]
    fn missing_events_key_is_empty() {
        assert!(decode_events("{}", &Untranslated).unwrap().is_empty());
        assert!(decode_events("not json", &Untranslated).is_err());
    }
}
