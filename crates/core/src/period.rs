use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An inclusive instant range with independently optional bounds, used to
/// scope analytics queries. An absent bound means "no limit on that side".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (Some(s), Some(e)) => write!(f, "{s} to {e}"),
            (Some(s), None) => write!(f, "{s} onward"),
            (None, Some(e)) => write!(f, "up to {e}"),
            (None, None) => write!(f, "all time"),
        }
    }
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        DateRange {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn unbounded() -> Self {
        DateRange::default()
    }

    pub fn since(start: DateTime<Utc>) -> Self {
        DateRange {
            start: Some(start),
            end: None,
        }
    }

    pub fn until(end: DateTime<Utc>) -> Self {
        DateRange {
            start: None,
            end: Some(end),
        }
    }

    /// Both bounds are inclusive. Instants carry their own offsets, so the
    /// comparison is absolute regardless of the expense's local timezone.
    pub fn contains<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> bool {
        if let Some(start) = self.start {
            if *instant < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if *instant > end {
                return false;
            }
        }
        true
    }
}
