use chrono::FixedOffset;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_ICS_PATH: &str = "/app/webcal.ics";
pub const DEFAULT_JSON_PATH: &str = "/app/webcal_events.json";
pub const DEFAULT_FETCH_INTERVAL_SECONDS: u64 = 60;
pub const DEFAULT_DISPLAY_OFFSET: &str = "+03:00";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Feed location; only the fetcher needs it.
    pub webcal_url: Option<String>,
    pub ics_path: PathBuf,
    pub json_path: PathBuf,
    pub fetch_interval: Duration,
    /// Offset timestamps are shown in.
    pub display_offset: FixedOffset,
    pub days_in_past: u32,
    pub days_in_future: u32,
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let display_offset =
            get("DISPLAY_OFFSET").unwrap_or_else(|| DEFAULT_DISPLAY_OFFSET.to_string());
        let display_offset = parse_offset(&display_offset)
            .ok_or_else(|| Error::Config(format!("invalid DISPLAY_OFFSET {:?}", display_offset)))?;

        Ok(Config {
            webcal_url: get("WEBCAL_URL"),
            ics_path: get("WEBCAL_FILE_PATH")
                .unwrap_or_else(|| DEFAULT_ICS_PATH.to_string())
                .into(),
            json_path: get("WEBCAL_JSON_PATH")
                .unwrap_or_else(|| DEFAULT_JSON_PATH.to_string())
                .into(),
            fetch_interval: Duration::from_secs(parse_number(
                "FETCH_INTERVAL_SECONDS",
                get("FETCH_INTERVAL_SECONDS"),
                DEFAULT_FETCH_INTERVAL_SECONDS,
            )?),
            display_offset,
            days_in_past: parse_number("DAYS_IN_PAST", get("DAYS_IN_PAST"), 1)?,
            days_in_future: parse_number("DAYS_IN_FUTURE", get("DAYS_IN_FUTURE"), 2)?,
        })
    }

    pub fn require_webcal_url(&self) -> Result<&str> {
        self.webcal_url.as_deref().ok_or_else(|| {
            Error::Config("WEBCAL_URL environment variable not configured".to_string())
        })
    }
}

fn parse_number<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("invalid {} {:?}", key, v))),
    }
}

/// Parses `Z`, `+HH:MM`, `-HH:MM` or `+HHMM`.
pub fn parse_offset(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match value.as_bytes().first()? {
        b'+' => (1, &value[1..]),
        b'-' => (-1, &value[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
