//! ICS generation for new items and field updates on existing ones.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use icalendar::parser::unfold;
use icalendar::{Calendar, CalendarComponent, Component, EventLike, Property, ValueType};
use tracing::debug;

use crate::error::ItemParseError;
use crate::fields::{EventFields, EventUpdate, Field, TodoFields, TodoStatus, TodoUpdate};

const PRODID: &str = "PRODID:-//calmcp//calmcp//EN";

/// Nested components the icalendar serializer stamps with a made-up UID and DTSTAMP.
const UNSTAMPED_COMPONENTS: [&str; 4] = ["VTIMEZONE", "STANDARD", "DAYLIGHT", "VALARM"];

/// Fields of an event to be created.
#[derive(Debug, Clone)]
pub struct NewEvent<'a> {
    pub uid: &'a str,
    pub summary: &'a str,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub description: Option<&'a str>,
    pub location: Option<&'a str>,
}

/// Fields of a todo to be created.
#[derive(Debug, Clone)]
pub struct NewTodo<'a> {
    pub uid: &'a str,
    pub summary: &'a str,
    pub status: TodoStatus,
    pub description: Option<&'a str>,
    pub due: Option<NaiveDate>,
    pub priority: Option<u8>,
}

/// Generate .ics content for a new event. Times are written floating.
pub fn generate_event(event: &NewEvent, now: DateTime<Utc>) -> String {
    let mut ics_event = icalendar::Event::new();
    ics_event.uid(event.uid);
    ics_event.summary(event.summary);
    ics_event.add_property("DTSTAMP", utc_stamp(now));
    ics_event.add_property(Field::Start.ics_name(), floating(event.start));
    ics_event.add_property(Field::End.ics_name(), floating(event.end));

    if let Some(desc) = event.description {
        ics_event.description(desc);
    }

    if let Some(loc) = event.location {
        ics_event.location(loc);
    }

    let mut cal = Calendar::new();
    cal.push(ics_event.done());
    strip_ics_bloat(&cal.done().to_string())
}

/// Generate .ics content for a new todo.
pub fn generate_todo(todo: &NewTodo, now: DateTime<Utc>) -> String {
    let mut ics_todo = icalendar::Todo::new();
    ics_todo.uid(todo.uid);
    ics_todo.summary(todo.summary);
    ics_todo.add_property(Field::Status.ics_name(), todo.status.as_str());
    ics_todo.add_property("DTSTAMP", utc_stamp(now));
    ics_todo.add_property("CREATED", utc_stamp(now));

    if let Some(desc) = todo.description {
        ics_todo.description(desc);
    }

    if let Some(due) = todo.due {
        ics_todo.append_property(date_property(Field::Due, due));
    }

    if let Some(priority) = todo.priority {
        ics_todo.add_property(Field::Priority.ics_name(), priority.to_string());
    }

    if todo.status == TodoStatus::Completed {
        ics_todo.add_property(Field::Completed.ics_name(), utc_stamp(now));
    }

    let mut cal = Calendar::new();
    cal.push(ics_todo.done());
    strip_ics_bloat(&cal.done().to_string())
}

/// Apply `update` to the first VEVENT of `content`, keeping every other property.
pub fn write_event_fields(
    content: &str,
    current: &EventFields,
    update: &EventUpdate,
    now: DateTime<Utc>,
) -> Result<String, ItemParseError> {
    let mut calendar: Calendar = unfold(content).parse().map_err(ItemParseError::Malformed)?;

    let event = calendar
        .components
        .iter_mut()
        .find_map(|c| match c {
            CalendarComponent::Event(e) => Some(e),
            _ => None,
        })
        .ok_or(ItemParseError::MissingComponent("VEVENT"))?;

    let has = |field| current.has(field);

    if let Some(ref summary) = update.summary {
        upsert(event, has(Field::Summary), Field::Summary, summary.clone());
    }
    if let Some(start) = update.start {
        upsert(event, has(Field::Start), Field::Start, floating(start));
    }
    if let Some(end) = update.end {
        upsert(event, has(Field::End), Field::End, floating(end));
    }
    if let Some(ref description) = update.description {
        upsert(event, has(Field::Description), Field::Description, description.clone());
    }
    if let Some(ref location) = update.location {
        upsert(event, has(Field::Location), Field::Location, location.clone());
    }

    event.add_property("LAST-MODIFIED", utc_stamp(now));
    event.add_property("DTSTAMP", utc_stamp(now));

    Ok(strip_injected_stamps(&calendar.to_string(), content))
}

/// Apply `update` to the first VTODO of `content`, keeping every other property.
///
/// A transition to COMPLETED also stamps COMPLETED with `now`.
pub fn write_todo_fields(
    content: &str,
    current: &TodoFields,
    update: &TodoUpdate,
    now: DateTime<Utc>,
) -> Result<String, ItemParseError> {
    let mut calendar: Calendar = unfold(content).parse().map_err(ItemParseError::Malformed)?;

    let todo = calendar
        .components
        .iter_mut()
        .find_map(|c| match c {
            CalendarComponent::Todo(t) => Some(t),
            _ => None,
        })
        .ok_or(ItemParseError::MissingComponent("VTODO"))?;

    let has = |field| current.has(field);

    if let Some(ref summary) = update.summary {
        upsert(todo, has(Field::Summary), Field::Summary, summary.clone());
    }
    if let Some(ref description) = update.description {
        upsert(todo, has(Field::Description), Field::Description, description.clone());
    }
    if let Some(due) = update.due {
        debug!(property = "DUE", existed = has(Field::Due), "writing property");
        todo.append_property(date_property(Field::Due, due));
    }
    if let Some(priority) = update.priority {
        upsert(todo, has(Field::Priority), Field::Priority, priority.to_string());
    }
    if let Some(status) = update.status {
        upsert(todo, has(Field::Status), Field::Status, status.as_str().to_string());
        if status == TodoStatus::Completed {
            upsert(todo, has(Field::Completed), Field::Completed, utc_stamp(now));
        }
    }

    todo.add_property("LAST-MODIFIED", utc_stamp(now));
    todo.add_property("DTSTAMP", utc_stamp(now));

    Ok(strip_injected_stamps(&calendar.to_string(), content))
}

/// Set a property, replacing it when present and adding it otherwise.
fn upsert<C: Component>(component: &mut C, existed: bool, field: Field, value: String) {
    debug!(property = field.ics_name(), existed, "writing property");
    component.add_property(field.ics_name(), value);
}

fn date_property(field: Field, date: NaiveDate) -> Property {
    let mut prop = Property::new(field.ics_name(), date.format("%Y%m%d").to_string());
    prop.append_parameter(ValueType::Date);
    prop
}

fn utc_stamp(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

fn floating(dt: NaiveDateTime) -> String {
    dt.format("%Y%m%dT%H%M%S").to_string()
}

/// Clean up ICS output from the icalendar crate
/// - Replace the crate's PRODID with ours
/// - Remove CALSCALE:GREGORIAN (it's the default)
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str(PRODID);
            result.push_str("\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

/// Drop DTSTAMP and UID lines inside VTIMEZONE/STANDARD/DAYLIGHT/VALARM that were not
/// part of `original`.
fn strip_injected_stamps(ics: &str, original: &str) -> String {
    let unfolded = unfold(original);
    let original_lines: HashSet<&str> = unfolded.lines().collect();

    let mut result = String::with_capacity(ics.len());
    let mut open: Vec<&str> = Vec::new();

    for line in ics.lines() {
        if let Some(name) = line.strip_prefix("BEGIN:") {
            open.push(name);
        } else if line.starts_with("END:") {
            open.pop();
        }

        let in_unstamped = open
            .last()
            .is_some_and(|name| UNSTAMPED_COMPONENTS.contains(name));

        if in_unstamped
            && (line.starts_with("DTSTAMP:") || line.starts_with("UID:"))
            && !original_lines.contains(line)
        {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}
