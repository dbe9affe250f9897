use chrono::prelude::*;
use std::collections::BTreeMap;

use crate::event::parse_timestamp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Unknown(String),
}

impl Frequency {
    fn parse(value: &str) -> Frequency {
        match value.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Frequency::Daily,
            "WEEKLY" => Frequency::Weekly,
            "MONTHLY" => Frequency::Monthly,
            "YEARLY" => Frequency::Yearly,
            _ => Frequency::Unknown(value.to_string()),
        }
    }
}

/// The supported subset of an RFC 5545 RRULE.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecurrenceRule {
    /// `None` when the rule has no FREQ part; expansion treats that like an unknown frequency.
    pub freq: Option<Frequency>,
    pub until: Option<DateTime<FixedOffset>>,
    pub count: Option<u32>,
    /// Weekday indices, 0 = Sunday .. 6 = Saturday. Only consulted for weekly rules.
    pub byday: Vec<u32>,
    /// Every `KEY=VALUE` pair of the source string, keys upper-cased.
    pub parts: BTreeMap<String, String>,
}

impl RecurrenceRule {
    /// An empty rule means "not recurring".
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn byday_contains(&self, weekday: Weekday) -> bool {
        self.byday.contains(&weekday.num_days_from_sunday())
    }
}

const DAY_CODES: &[(&str, u32)] = &[
    ("SU", 0),
    ("MO", 1),
    ("TU", 2),
    ("WE", 3),
    ("TH", 4),
    ("FR", 5),
    ("SA", 6),
];

/// Maps a comma-separated BYDAY list onto weekday indices, dropping unknown codes.
pub fn parse_byday(value: &str) -> Vec<u32> {
    value
        .split(',')
        .map(|code| code.trim().to_ascii_uppercase())
        .filter_map(|code| {
            let index = DAY_CODES.iter().find(|(c, _)| *c == code).map(|(_, i)| *i);
            if index.is_none() && !code.is_empty() {
                tracing::warn!(code = %code, "Dropping unrecognized BYDAY code");
            }
            index
        })
        .collect()
}

/// Parses `KEY=VALUE;KEY=VALUE`. Pairs without `=` are ignored and
/// constraints that fail to parse are dropped rather than rejected.
pub fn parse_rrule(rule: Option<&str>) -> RecurrenceRule {
    let mut parsed = RecurrenceRule::default();
    let rule = match rule {
        Some(r) if !r.trim().is_empty() => r,
        _ => return parsed,
    };

    for part in rule.split(';') {
        let mut pieces = part.splitn(2, '=');
        if let (Some(key), Some(value)) = (pieces.next(), pieces.next()) {
            if key.trim().is_empty() {
                continue;
            }
            parsed
                .parts
                .insert(key.trim().to_ascii_uppercase(), value.trim().to_string());
        }
    }

    parsed.freq = parsed.parts.get("FREQ").map(|f| Frequency::parse(f));

    if let Some(until) = parsed.parts.get("UNTIL") {
        parsed.until = parse_timestamp(until);
        if parsed.until.is_none() {
            tracing::warn!(until = %until, "Ignoring unparsable UNTIL");
        }
    }

    if let Some(count) = parsed.parts.get("COUNT") {
        parsed.count = count.parse().ok();
        if parsed.count.is_none() {
            tracing::warn!(count = %count, "Ignoring unparsable COUNT");
        }
    }

    if parsed.freq == Some(Frequency::Weekly) {
        if let Some(byday) = parsed.parts.get("BYDAY") {
            parsed.byday = parse_byday(byday);
        }
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_weekly_rule_with_byday_and_until() {
        let rule = parse_rrule(Some("FREQ=WEEKLY;BYDAY=MO,we;UNTIL=20250101T000000Z"));
        assert_eq!(rule.freq, Some(Frequency::Weekly));
        assert_eq!(rule.byday, vec![1, 3]);
        assert_eq!(
            rule.until,
            Some(FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(rule.count, None);
    }

    #[test]
    fn keys_are_case_insensitive() {
        let rule = parse_rrule(Some("freq=daily;count=3"));
        assert_eq!(rule.freq, Some(Frequency::Daily));
        assert_eq!(rule.count, Some(3));
    }

    #[test]
    fn empty_input_is_empty_rule() {
        assert!(parse_rrule(None).is_empty());
        assert!(parse_rrule(Some("")).is_empty());
        assert!(parse_rrule(Some("GARBAGE")).is_empty());
    }

    #[test]
    fn malformed_constraints_are_dropped() {
        let rule = parse_rrule(Some("FREQ=WEEKLY;UNTIL=someday;BYDAY=MO,XX,FR;INTERVAL=2"));
        assert_eq!(rule.until, None);
        assert_eq!(rule.byday, vec![1, 5]);
        assert_eq!(rule.parts.get("INTERVAL").map(String::as_str), Some("2"));
    }

    #[test]
    fn byday_is_ignored_outside_weekly() {
        let rule = parse_rrule(Some("FREQ=MONTHLY;BYDAY=MO"));
        assert!(rule.byday.is_empty());
    }

    #[test]
    fn unknown_frequency_is_kept() {
        let rule = parse_rrule(Some("FREQ=HOURLY"));
        assert_eq!(rule.freq, Some(Frequency::Unknown("HOURLY".to_string())));
    }
}
