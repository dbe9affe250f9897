//! Weekly calendar views over a webcal feed.
//!
//! Events come from a JSON snapshot written by the fetcher (`feed`), are
//! expanded for the requested days (`expand`), placed into day buckets
//! (`window`) and laid out in columns for the time grid (`layout`).

pub mod api;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod event;
pub mod expand;
pub mod feed;
pub mod i18n;
pub mod layout;
pub mod render;
pub mod rrule;
pub mod snapshot;
pub mod window;

pub use crate::config::Config;
pub use crate::dedupe::{base_uid, dedupe};
pub use crate::error::{Error, Result};
pub use crate::event::{EventRecord, EventTime, Span};
pub use crate::expand::{expand, expand_all};
pub use crate::i18n::{Russian, Translate, Untranslated};
pub use crate::layout::{layout, layout_for_day, ColumnLayout};
pub use crate::rrule::{parse_rrule, Frequency, RecurrenceRule};
pub use crate::window::{filter_events, filter_events_with_recurring, DayBucket, WeekEvents};
