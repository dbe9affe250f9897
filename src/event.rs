use chrono::prelude::*;
use chrono::{Duration, Months, Offset, SecondsFormat};
use serde::{Serialize, Serializer};

const COMPACT_DATE: &str = "%Y%m%d";
const COMPACT_DATETIME: &str = "%Y%m%dT%H%M%S";

/// Either a calendar date (all-day events) or an instant carrying its own UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTime {
    DateOnly(NaiveDate),
    Instant(DateTime<FixedOffset>),
}

impl EventTime {
    /// Calendar date, in the instant's own offset for timed values.
    pub fn date(&self) -> NaiveDate {
        match self {
            EventTime::DateOnly(d) => *d,
            EventTime::Instant(dt) => dt.date_naive(),
        }
    }

    pub fn is_date_only(&self) -> bool {
        matches!(self, EventTime::DateOnly(_))
    }

    pub fn add_days(self, days: i64) -> Self {
        match self {
            EventTime::DateOnly(d) => EventTime::DateOnly(d + Duration::days(days)),
            EventTime::Instant(dt) => EventTime::Instant(dt + Duration::days(days)),
        }
    }

    /// Calendar month arithmetic. A day-of-month missing from the target month
    /// clamps to that month's last day; time of day and offset are preserved.
    pub fn add_months(self, months: u32) -> Option<Self> {
        match self {
            EventTime::DateOnly(d) => d
                .checked_add_months(Months::new(months))
                .map(EventTime::DateOnly),
            EventTime::Instant(dt) => {
                let naive = dt.naive_local().checked_add_months(Months::new(months))?;
                dt.offset()
                    .from_local_datetime(&naive)
                    .single()
                    .map(EventTime::Instant)
            }
        }
    }

    /// Applies `span` when it matches this value's kind.
    pub fn shifted(self, span: Span) -> Option<Self> {
        match (self, span) {
            (EventTime::DateOnly(d), Span::Days(n)) => {
                Some(EventTime::DateOnly(d + Duration::days(n)))
            }
            (EventTime::Instant(dt), Span::Seconds(n)) => {
                Some(EventTime::Instant(dt + Duration::seconds(n)))
            }
            _ => None,
        }
    }

    /// `YYYYMMDD` for dates, `YYYYMMDDTHHMMSS` for instants.
    pub fn compact_stamp(&self) -> String {
        match self {
            EventTime::DateOnly(d) => d.format(COMPACT_DATE).to_string(),
            EventTime::Instant(dt) => dt.format(COMPACT_DATETIME).to_string(),
        }
    }

    pub fn to_iso8601(&self) -> String {
        match self {
            EventTime::DateOnly(d) => d.format("%Y-%m-%d").to_string(),
            EventTime::Instant(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, false),
        }
    }

    pub fn minute_of_day(&self) -> Option<u32> {
        match self {
            EventTime::DateOnly(_) => None,
            EventTime::Instant(dt) => Some(dt.hour() * 60 + dt.minute()),
        }
    }

    pub fn with_offset(self, offset: FixedOffset) -> Self {
        match self {
            EventTime::DateOnly(_) => self,
            EventTime::Instant(dt) => EventTime::Instant(dt.with_timezone(&offset)),
        }
    }
}

impl Serialize for EventTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

/// Length of an event, in whole days for all-day events and seconds otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    Days(i64),
    Seconds(i64),
}

impl Span {
    pub fn between(start: EventTime, end: EventTime) -> Option<Span> {
        match (start, end) {
            (EventTime::DateOnly(s), EventTime::DateOnly(e)) => {
                Some(Span::Days((e - s).num_days()))
            }
            (EventTime::Instant(s), EventTime::Instant(e)) => {
                Some(Span::Seconds((e - s).num_seconds()))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub uid: String,
    pub summary: String,
    pub description: String,
    pub location: String,
    pub all_day: bool,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rrule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exdate: Option<Vec<String>>,
}

impl EventRecord {
    pub fn all_day(uid: &str, summary: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(uid, summary, true, EventTime::DateOnly(start), EventTime::DateOnly(end))
    }

    pub fn timed(
        uid: &str,
        summary: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Self {
        Self::new(uid, summary, false, EventTime::Instant(start), EventTime::Instant(end))
    }

    fn new(uid: &str, summary: &str, all_day: bool, start: EventTime, end: EventTime) -> Self {
        EventRecord {
            uid: uid.to_string(),
            summary: summary.to_string(),
            description: String::new(),
            location: String::new(),
            all_day,
            start,
            end,
            rrule: None,
            exdate: None,
        }
    }

    pub fn with_rrule(mut self, rrule: &str) -> Self {
        self.rrule = Some(rrule.to_string());
        self
    }

    pub fn with_exdates<I, S>(mut self, exdates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exdate = Some(exdates.into_iter().map(Into::into).collect());
        self
    }

    /// Start and end dates, or `None` when the record breaks the
    /// "dates for all-day, instants otherwise" rule.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start, self.end) {
            (EventTime::DateOnly(s), EventTime::DateOnly(e)) if self.all_day => Some((s, e)),
            (EventTime::Instant(s), EventTime::Instant(e)) if !self.all_day => {
                Some((s.date_naive(), e.date_naive()))
            }
            _ => None,
        }
    }

    /// Re-expresses timed start/end in the display offset.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.start = self.start.with_offset(offset);
        self.end = self.end.with_offset(offset);
        self
    }
}

fn utc_instant(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    Utc.fix().from_utc_datetime(&naive)
}

/// Accepts RFC 3339, iCalendar basic format (with or without a trailing `Z`)
/// and plain dates. Values without an offset are read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt);
    }
    let floating = value.strip_suffix('Z').unwrap_or(value);
    for format in &[COMPACT_DATETIME, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(floating, format) {
            return Some(utc_instant(naive));
        }
    }
    parse_date(value)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(utc_instant)
}

/// Date part of an ISO-8601 or iCalendar date / date-time string.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date_part = value.split(|c| c == 'T' || c == ' ').next().unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, COMPACT_DATE))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_timestamp_accepts_feed_formats() {
        let expected = Utc.fix().with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("20250101T000000Z"), Some(expected));
        assert_eq!(parse_timestamp("20250101T000000"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01T03:00:00+03:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01"), Some(expected));
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn parse_date_takes_date_part() {
        assert_eq!(parse_date("2024-06-03T10:00:00+03:00"), Some(ymd(2024, 6, 3)));
        assert_eq!(parse_date("20240603"), Some(ymd(2024, 6, 3)));
        assert_eq!(parse_date("June 3rd"), None);
    }

    #[test]
    fn month_arithmetic_clamps_to_month_end() {
        let start = EventTime::DateOnly(ymd(2024, 1, 31));
        assert_eq!(start.add_months(1), Some(EventTime::DateOnly(ymd(2024, 2, 29))));

        let offset = FixedOffset::east_opt(3 * 3600).unwrap();
        let timed = EventTime::Instant(offset.with_ymd_and_hms(2023, 1, 31, 9, 30, 0).unwrap());
        assert_eq!(
            timed.add_months(1),
            Some(EventTime::Instant(offset.with_ymd_and_hms(2023, 2, 28, 9, 30, 0).unwrap()))
        );
    }

    #[test]
    fn compact_stamp_matches_kind() {
        let offset = FixedOffset::east_opt(0).unwrap();
        assert_eq!(EventTime::DateOnly(ymd(2024, 1, 1)).compact_stamp(), "20240101");
        let noon = offset.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(EventTime::Instant(noon).compact_stamp(), "20240101T120000");
    }

    #[test]
    fn date_span_rejects_mixed_kinds() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let mut event = EventRecord::all_day("a", "A", ymd(2024, 1, 1), ymd(2024, 1, 2));
        assert_eq!(event.date_span(), Some((ymd(2024, 1, 1), ymd(2024, 1, 2))));
        event.end = EventTime::Instant(offset.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(event.date_span(), None);
    }
}
