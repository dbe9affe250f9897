use chrono::prelude::*;
use chrono::offset::LocalResult;
use chrono::{Duration, Offset};
use chrono_tz::Tz;
use ical::parser::ical::component::IcalEvent;
use ical::property::Property;
use std::io::BufRead;
use std::time::Duration as StdDuration;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::event::{EventRecord, EventTime};
use crate::snapshot::{save_events, write_atomic};

const CONNECT_TIMEOUT: StdDuration = StdDuration::from_secs(10);
const READ_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// `webcal://` is plain HTTPS under another name.
pub fn https_url(url: &str) -> String {
    match url.strip_prefix("webcal://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

pub fn fetch_feed(url: &str) -> Result<String> {
    let url = https_url(url);
    tracing::info!(url = %url, "Fetching webcal data");
    let client = reqwest::blocking::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(READ_TIMEOUT)
        .build()?;
    let body = client.get(&url).send()?.error_for_status()?.text()?;
    tracing::info!(bytes = body.len(), "Fetched webcal data");
    Ok(body)
}

pub fn events_from_ical_url(ical_url: &str) -> Result<Vec<EventRecord>> {
    let body = fetch_feed(ical_url)?;
    parse_feed(body.as_bytes())
}

/// Parses every calendar in `reader` and returns its events in feed order.
pub fn parse_feed<B: BufRead>(reader: B) -> Result<Vec<EventRecord>> {
    let mut events = Vec::new();
    for calendar in ical::IcalParser::new(reader) {
        let calendar = calendar.map_err(|e| Error::Ical(e.to_string()))?;
        events.extend(parse_events(calendar.events));
    }
    tracing::info!(count = events.len(), "Parsed events from calendar");
    Ok(events)
}

fn parse_events(events: Vec<IcalEvent>) -> Vec<EventRecord> {
    events.iter().filter_map(parse_event).collect()
}

fn parse_event(event: &IcalEvent) -> Option<EventRecord> {
    let start_property = find_property(event, "DTSTART")?;
    let start = match parse_event_time(start_property, start_property.value.as_deref()?) {
        Some(start) => start,
        None => {
            tracing::warn!(value = ?start_property.value, "Skipping event with unparsable DTSTART");
            return None;
        }
    };

    let end = find_property(event, "DTEND")
        .and_then(|p| parse_event_time(p, p.value.as_deref()?))
        .filter(|end| end.is_date_only() == start.is_date_only())
        .unwrap_or_else(|| match start {
            EventTime::DateOnly(_) => start,
            EventTime::Instant(dt) => EventTime::Instant(dt + Duration::hours(1)),
        });

    let exdates: Vec<String> = event
        .properties
        .iter()
        .filter(|p| p.name == "EXDATE")
        .flat_map(|p| {
            p.value
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .filter(|v| !v.trim().is_empty())
                .filter_map(move |v| parse_event_time(p, v.trim()))
                .map(|t| t.to_iso8601())
                .collect::<Vec<_>>()
        })
        .collect();

    Some(EventRecord {
        uid: text_value(event, "UID").unwrap_or_default(),
        summary: text_value(event, "SUMMARY").unwrap_or_default(),
        description: text_value(event, "DESCRIPTION").unwrap_or_default(),
        location: text_value(event, "LOCATION").unwrap_or_default(),
        all_day: start.is_date_only(),
        start,
        end,
        rrule: find_property(event, "RRULE").and_then(|p| p.value.clone()),
        exdate: if exdates.is_empty() { None } else { Some(exdates) },
    })
}

fn find_property<'a>(event: &'a IcalEvent, name: &str) -> Option<&'a Property> {
    event.properties.iter().find(|p| p.name == name)
}

fn param<'a>(property: &'a Property, name: &str) -> Option<&'a str> {
    property
        .params
        .as_ref()?
        .iter()
        .find(|(param_name, _)| param_name.eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first())
        .map(String::as_str)
}

fn text_value(event: &IcalEvent, name: &str) -> Option<String> {
    find_property(event, name)
        .and_then(|p| p.value.as_deref())
        .map(unescape_text)
}

fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Reads a DATE or DATE-TIME value. UTC (`Z`) and TZID values become fixed
/// offsets; floating times are taken as UTC.
fn parse_event_time(property: &Property, value: &str) -> Option<EventTime> {
    let is_date = param(property, "VALUE").map_or(false, |v| v.eq_ignore_ascii_case("DATE"))
        || value.len() == 8;
    if is_date {
        return NaiveDate::parse_from_str(value, "%Y%m%d").ok().map(EventTime::DateOnly);
    }

    //Try getting an UTC time first
    if let Some(utc) = value.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S").ok()?;
        return Some(EventTime::Instant(Utc.fix().from_utc_datetime(&naive)));
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?;

    //Try using a timezone
    if let Some(tzid) = param(property, "TZID") {
        match tzid.trim_matches('"').parse::<Tz>() {
            Ok(timezone) => {
                let local = match timezone.from_local_datetime(&naive) {
                    LocalResult::Single(dt) => Some(dt),
                    LocalResult::Ambiguous(earliest, _) => {
                        tracing::warn!(tzid, "ambiguous local time, picking earliest");
                        Some(earliest)
                    }
                    LocalResult::None => {
                        tracing::warn!(tzid, "local time does not exist, reading as UTC");
                        None
                    }
                };
                if let Some(dt) = local {
                    return Some(EventTime::Instant(dt.with_timezone(&dt.offset().fix())));
                }
            }
            Err(_) => tracing::warn!(tzid, "unknown TZID, reading as UTC"),
        }
    }

    Some(EventTime::Instant(Utc.fix().from_utc_datetime(&naive)))
}

/// One fetch → persist → parse → persist cycle; returns the number of events saved.
pub fn refresh(config: &Config, url: &str) -> Result<usize> {
    let body = fetch_feed(url)?;
    write_atomic(&config.ics_path, body.as_bytes())?;
    tracing::info!(path = %config.ics_path.display(), "Saved webcal data");

    let events = parse_feed(body.as_bytes())?;
    save_events(
        &config.json_path,
        &events,
        Utc::now().with_timezone(&config.display_offset),
    )?;
    Ok(events.len())
}

/// Refreshes immediately, then once per interval. A failed cycle is logged
/// and retried on the next tick.
pub fn run_fetcher(config: &Config) -> Result<()> {
    let url = config.require_webcal_url()?;
    tracing::info!(
        url = %url,
        ics_path = %config.ics_path.display(),
        json_path = %config.json_path.display(),
        interval_secs = config.fetch_interval.as_secs(),
        "Starting webcal fetcher"
    );

    loop {
        if let Err(e) = refresh(config, url) {
            tracing::error!(
                error = %e,
                "Fetch failed, will retry in {} seconds",
                config.fetch_interval.as_secs()
            );
        }
        std::thread::sleep(config.fetch_interval);
    }
}
