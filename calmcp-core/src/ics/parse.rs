//! Reading event and todo fields with the icalendar crate's parser.

use icalendar::{
    DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};

use crate::calendar::ComponentKind;
use crate::error::ItemParseError;
use crate::fields::{EventFields, ItemTime, TodoFields};

/// Parse the first VEVENT of an item.
pub fn read_event(content: &str) -> Result<EventFields, ItemParseError> {
    let unfolded = unfold(content);
    let calendar =
        read_calendar(&unfolded).map_err(|e| ItemParseError::Malformed(e.to_string()))?;
    let vevent = find_component(&calendar.components, ComponentKind::Event)?;

    Ok(EventFields {
        uid: text_prop(vevent, "UID"),
        summary: text_prop(vevent, "SUMMARY"),
        start: time_prop(vevent, "DTSTART")?,
        end: time_prop(vevent, "DTEND")?,
        description: text_prop(vevent, "DESCRIPTION"),
        location: text_prop(vevent, "LOCATION"),
    })
}

/// Parse the first VTODO of an item.
pub fn read_todo(content: &str) -> Result<TodoFields, ItemParseError> {
    let unfolded = unfold(content);
    let calendar =
        read_calendar(&unfolded).map_err(|e| ItemParseError::Malformed(e.to_string()))?;
    let vtodo = find_component(&calendar.components, ComponentKind::Todo)?;

    // Non-numeric priorities are not RFC 5545 values; treat them as unset
    let priority = vtodo
        .find_prop("PRIORITY")
        .and_then(|p| p.val.as_ref().trim().parse::<u8>().ok())
        .filter(|p| *p > 0);

    Ok(TodoFields {
        uid: text_prop(vtodo, "UID"),
        summary: text_prop(vtodo, "SUMMARY"),
        status: vtodo
            .find_prop("STATUS")
            .map(|p| p.val.as_ref().trim().to_string()),
        due: time_prop(vtodo, "DUE")?,
        priority,
        description: text_prop(vtodo, "DESCRIPTION"),
        completed: time_prop(vtodo, "COMPLETED")?,
    })
}

fn find_component<'a>(
    components: &'a [Component<'a>],
    kind: ComponentKind,
) -> Result<&'a Component<'a>, ItemParseError> {
    components
        .iter()
        .find(|c| c.name == kind.ics_name())
        .ok_or(ItemParseError::MissingComponent(kind.ics_name()))
}

fn text_prop(component: &Component, name: &str) -> Option<String> {
    component
        .find_prop(name)
        .map(|p| unescape_text(p.val.as_ref()))
}

/// Absent properties are fine; present but unreadable ones make the item unparseable.
fn time_prop(
    component: &Component,
    name: &'static str,
) -> Result<Option<ItemTime>, ItemParseError> {
    let Some(prop) = component.find_prop(name) else {
        return Ok(None);
    };

    DatePerhapsTime::try_from(prop)
        .map(|dpt| Some(to_item_time(dpt)))
        .map_err(|_| invalid(name, prop))
}

fn invalid(name: &'static str, prop: &Property) -> ItemParseError {
    ItemParseError::InvalidProperty {
        name,
        value: prop.val.to_string(),
    }
}

/// Convert icalendar's DatePerhapsTime to our ItemTime, preserving timezone info
fn to_item_time(dpt: DatePerhapsTime) -> ItemTime {
    match dpt {
        DatePerhapsTime::Date(d) => ItemTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            icalendar::CalendarDateTime::Utc(dt) => ItemTime::DateTimeUtc(dt),
            icalendar::CalendarDateTime::Floating(naive) => ItemTime::DateTimeFloating(naive),
            icalendar::CalendarDateTime::WithTimezone { date_time, tzid } => {
                ItemTime::DateTimeZoned {
                    datetime: date_time,
                    tzid,
                }
            }
        },
    }
}

/// Undo RFC 5545 TEXT escaping (`\n`, `\,`, `\;`, `\\`).
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
