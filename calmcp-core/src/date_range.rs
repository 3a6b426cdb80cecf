//! Date and datetime arguments, and the date range used for event queries.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{ToolError, ToolResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Half-open range `[start, end)` handed to the gateway's range query.
///
/// Both bounds are floating (no timezone); each starts at midnight of the given day.
#[derive(Debug, Clone, PartialEq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    /// Build a range from optional `YYYY-MM-DD` bounds.
    ///
    /// Every bound that is given must parse. A range only exists when both are given;
    /// otherwise the caller lists everything.
    pub fn from_args(start: Option<&str>, end: Option<&str>) -> ToolResult<Option<Self>> {
        let start = start.map(parse_date).transpose()?;
        let end = end.map(parse_date).transpose()?;

        Ok(match (start, end) {
            (Some(start), Some(end)) => Some(DateRange {
                start: start.and_time(chrono::NaiveTime::MIN),
                end: end.and_time(chrono::NaiveTime::MIN),
            }),
            _ => None,
        })
    }
}

/// Parse a `YYYY-MM-DD` argument.
pub fn parse_date(s: &str) -> ToolResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|e| ToolError::Format {
        what: "date",
        expected: "YYYY-MM-DD",
        detail: format!("'{}' is not a valid date ({})", s, e),
    })
}

/// Parse a `YYYY-MM-DD HH:MM` argument.
pub fn parse_datetime(s: &str) -> ToolResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), DATETIME_FORMAT).map_err(|e| ToolError::Format {
        what: "datetime",
        expected: "YYYY-MM-DD HH:MM",
        detail: format!("'{}' is not a valid datetime ({})", s, e),
    })
}
