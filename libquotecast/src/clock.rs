//! Local time of the managed pages
//!
//! Every schedule is evaluated at a fixed +7h offset from UTC. This module
//! is the only place that offset is applied.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::Serialize;
use std::fmt;

/// Offset of the pages' local time from UTC, in hours
pub const LOCAL_UTC_OFFSET_HOURS: i32 = 7;

/// Hour and minute of an instant in page-local time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocalTime {
    pub hour: u8,
    pub minute: u8,
}

impl LocalTime {
    pub fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    /// First minute of the local day
    pub fn is_midnight(&self) -> bool {
        self.hour == 0 && self.minute == 0
    }
}

impl fmt::Display for LocalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Convert a UTC instant to page-local hour and minute
pub fn to_local(instant: DateTime<Utc>) -> LocalTime {
    let local = instant + Duration::hours(i64::from(LOCAL_UTC_OFFSET_HOURS));
    LocalTime {
        hour: local.hour() as u8,
        minute: local.minute() as u8,
    }
}

/// Render a Unix timestamp as page-local `YYYY-MM-DD HH:MM`
pub fn format_local_timestamp(timestamp: i64) -> String {
    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(instant) => (instant + Duration::hours(i64::from(LOCAL_UTC_OFFSET_HOURS)))
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => timestamp.to_string(),
    }
}
