//! Semantic field bags for events and todos.
//!
//! Every optional property stays an `Option` so callers can tell "absent" from "empty";
//! the `*_label` accessors supply the display defaults used in tool lines.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

use crate::error::ToolError;

pub const NO_TITLE: &str = "No title";
pub const NO_START: &str = "No start time";
pub const NO_END: &str = "No end time";
pub const NO_DUE: &str = "No due date";

/// A point in time as carried by an iCalendar property.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemTime {
    Date(NaiveDate),
    DateTimeUtc(DateTime<Utc>),
    DateTimeFloating(NaiveDateTime),
    DateTimeZoned {
        datetime: NaiveDateTime,
        tzid: String,
    },
}

impl fmt::Display for ItemTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            ItemTime::DateTimeUtc(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S+00:00")),
            ItemTime::DateTimeFloating(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            ItemTime::DateTimeZoned { datetime, tzid } => {
                match tzid.parse::<chrono_tz::Tz>() {
                    Ok(tz) => match tz.offset_from_local_datetime(datetime).earliest() {
                        Some(offset) => {
                            let fixed = offset.fix();
                            write!(f, "{}{}", datetime.format("%Y-%m-%d %H:%M:%S"), fixed)
                        }
                        None => write!(f, "{} {}", datetime.format("%Y-%m-%d %H:%M:%S"), tzid),
                    },
                    Err(_) => write!(f, "{} {}", datetime.format("%Y-%m-%d %H:%M:%S"), tzid),
                }
            }
        }
    }
}

/// Fields that can be present on an item and written by an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Summary,
    Start,
    End,
    Description,
    Location,
    Due,
    Priority,
    Status,
    Completed,
}

impl Field {
    pub fn ics_name(&self) -> &'static str {
        match self {
            Field::Summary => "SUMMARY",
            Field::Start => "DTSTART",
            Field::End => "DTEND",
            Field::Description => "DESCRIPTION",
            Field::Location => "LOCATION",
            Field::Due => "DUE",
            Field::Priority => "PRIORITY",
            Field::Status => "STATUS",
            Field::Completed => "COMPLETED",
        }
    }
}

/// Fields read from a VEVENT.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFields {
    pub uid: Option<String>,
    pub summary: Option<String>,
    pub start: Option<ItemTime>,
    pub end: Option<ItemTime>,
    pub description: Option<String>,
    pub location: Option<String>,
}

impl EventFields {
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::Summary => self.summary.is_some(),
            Field::Start => self.start.is_some(),
            Field::End => self.end.is_some(),
            Field::Description => self.description.is_some(),
            Field::Location => self.location.is_some(),
            Field::Due | Field::Priority | Field::Status | Field::Completed => false,
        }
    }

    pub fn title(&self) -> &str {
        self.summary.as_deref().unwrap_or(NO_TITLE)
    }

    pub fn start_label(&self) -> String {
        time_label(self.start.as_ref(), NO_START)
    }

    pub fn end_label(&self) -> String {
        time_label(self.end.as_ref(), NO_END)
    }
}

/// Fields read from a VTODO.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoFields {
    pub uid: Option<String>,
    pub summary: Option<String>,
    /// Raw STATUS value; servers may carry values outside [`TodoStatus`]
    pub status: Option<String>,
    pub due: Option<ItemTime>,
    pub priority: Option<u8>,
    pub description: Option<String>,
    pub completed: Option<ItemTime>,
}

impl TodoFields {
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::Summary => self.summary.is_some(),
            Field::Description => self.description.is_some(),
            Field::Due => self.due.is_some(),
            Field::Priority => self.priority.is_some(),
            Field::Status => self.status.is_some(),
            Field::Completed => self.completed.is_some(),
            Field::Start | Field::End | Field::Location => false,
        }
    }

    pub fn title(&self) -> &str {
        self.summary.as_deref().unwrap_or(NO_TITLE)
    }

    /// Status with the NEEDS-ACTION default applied.
    pub fn status(&self) -> &str {
        self.status
            .as_deref()
            .unwrap_or(TodoStatus::NeedsAction.as_str())
    }

    pub fn is_completed(&self) -> bool {
        self.status() == TodoStatus::Completed.as_str()
    }

    /// ✓ for completed todos, ○ for everything else
    pub fn indicator(&self) -> &'static str {
        if self.is_completed() { "✓" } else { "○" }
    }

    pub fn due_label(&self) -> String {
        time_label(self.due.as_ref(), NO_DUE)
    }
}

fn time_label(time: Option<&ItemTime>, default: &str) -> String {
    time.map(|t| t.to_string())
        .unwrap_or_else(|| default.to_string())
}

/// Todo states accepted from callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoStatus {
    NeedsAction,
    InProcess,
    Completed,
    Cancelled,
}

impl TodoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::NeedsAction => "NEEDS-ACTION",
            TodoStatus::InProcess => "IN-PROCESS",
            TodoStatus::Completed => "COMPLETED",
            TodoStatus::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for TodoStatus {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEEDS-ACTION" => Ok(TodoStatus::NeedsAction),
            "IN-PROCESS" => Ok(TodoStatus::InProcess),
            "COMPLETED" => Ok(TodoStatus::Completed),
            "CANCELLED" => Ok(TodoStatus::Cancelled),
            _ => Err(ToolError::InvalidArgument {
                field: "status",
                value: s.to_string(),
                reason: "use one of NEEDS-ACTION, IN-PROCESS, COMPLETED, CANCELLED".to_string(),
            }),
        }
    }
}

/// Validate a caller-supplied priority (1 = highest, 9 = lowest).
pub fn check_priority(priority: i64) -> Result<u8, ToolError> {
    u8::try_from(priority)
        .ok()
        .filter(|p| (1..=9).contains(p))
        .ok_or_else(|| ToolError::InvalidArgument {
            field: "priority",
            value: priority.to_string(),
            reason: "must be between 1 (highest) and 9 (lowest)".to_string(),
        })
}

/// Changes requested for an event. `None` leaves the property untouched.
#[derive(Debug, Clone, Default)]
pub struct EventUpdate {
    pub summary: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub description: Option<String>,
    pub location: Option<String>,
}

/// Changes requested for a todo. `None` leaves the property untouched.
#[derive(Debug, Clone, Default)]
pub struct TodoUpdate {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub due: Option<NaiveDate>,
    pub priority: Option<u8>,
    pub status: Option<TodoStatus>,
}

impl TodoUpdate {
    pub fn complete() -> Self {
        TodoUpdate {
            status: Some(TodoStatus::Completed),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_todo_defaults() {
        let todo = TodoFields::default();
        assert_eq!(todo.title(), "No title");
        assert_eq!(todo.status(), "NEEDS-ACTION");
        assert_eq!(todo.due_label(), "No due date");
        assert_eq!(todo.priority, None);
        assert!(!todo.has(Field::Completed));
        assert_eq!(todo.indicator(), "○");
    }

    #[test]
    fn test_event_defaults() {
        let event = EventFields::default();
        assert_eq!(event.title(), "No title");
        assert_eq!(event.start_label(), "No start time");
        assert_eq!(event.end_label(), "No end time");
        assert!(!event.has(Field::Description));
    }

    #[test]
    fn test_status_parsing_is_case_insensitive() {
        assert_eq!("in-process".parse::<TodoStatus>().unwrap(), TodoStatus::InProcess);
        assert_eq!(" Completed ".parse::<TodoStatus>().unwrap(), TodoStatus::Completed);
        assert!("done".parse::<TodoStatus>().is_err());
    }

    #[test]
    fn test_priority_bounds() {
        assert_eq!(check_priority(1).unwrap(), 1);
        assert_eq!(check_priority(9).unwrap(), 9);
        assert!(check_priority(0).is_err());
        assert!(check_priority(10).is_err());
        assert!(check_priority(-3).is_err());
    }

    #[test]
    fn test_item_time_rendering() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let floating = date.and_hms_opt(15, 0, 0).unwrap();

        assert_eq!(ItemTime::Date(date).to_string(), "2025-03-20");
        assert_eq!(ItemTime::DateTimeFloating(floating).to_string(), "2025-03-20 15:00:00");
        assert_eq!(
            ItemTime::DateTimeUtc(floating.and_utc()).to_string(),
            "2025-03-20 15:00:00+00:00"
        );
        assert_eq!(
            ItemTime::DateTimeZoned {
                datetime: floating,
                tzid: "Europe/Berlin".to_string()
            }
            .to_string(),
            "2025-03-20 15:00:00+01:00"
        );
        assert_eq!(
            ItemTime::DateTimeZoned {
                datetime: floating,
                tzid: "Custom/Zone".to_string()
            }
            .to_string(),
            "2025-03-20 15:00:00 Custom/Zone"
        );
    }
}
