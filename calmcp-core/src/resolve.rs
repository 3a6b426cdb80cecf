//! Locating calendars by name and items by summary.

use crate::calendar::{Calendar, ComponentKind};
use crate::error::{ItemParseError, ToolError, ToolResult};
use crate::fields::{EventFields, TodoFields};
use crate::gateway::{CalendarGateway, RawItem};
use crate::ics::{read_event, read_todo};

/// Field bags that can be read from a raw item.
pub trait ItemFields: Sized {
    const KIND: ComponentKind;

    fn read(data: &str) -> Result<Self, ItemParseError>;

    fn summary(&self) -> Option<&str>;
}

impl ItemFields for EventFields {
    const KIND: ComponentKind = ComponentKind::Event;

    fn read(data: &str) -> Result<Self, ItemParseError> {
        read_event(data)
    }

    fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }
}

impl ItemFields for TodoFields {
    const KIND: ComponentKind = ComponentKind::Todo;

    fn read(data: &str) -> Result<Self, ItemParseError> {
        read_todo(data)
    }

    fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }
}

/// Find a calendar by exact, case-sensitive name. The first one enumerated wins.
pub fn resolve_calendar<G: CalendarGateway + ?Sized>(
    gateway: &G,
    name: &str,
) -> ToolResult<Calendar> {
    gateway
        .list_calendars()?
        .into_iter()
        .find(|c| c.name == name)
        .ok_or_else(|| ToolError::CalendarNotFound(name.to_string()))
}

/// Outcome of matching items against a summary.
#[derive(Debug)]
pub enum Resolution<F> {
    NoMatch,
    Single(RawItem, F),
    Multiple(Vec<(RawItem, F)>),
}

impl<F> Resolution<F> {
    /// Only a single match may be mutated.
    pub fn into_target(
        self,
        kind: ComponentKind,
        summary: &str,
        calendar: &str,
    ) -> ToolResult<(RawItem, F)> {
        match self {
            Resolution::Single(item, fields) => Ok((item, fields)),
            Resolution::NoMatch => Err(ToolError::NoMatch {
                kind,
                summary: summary.to_string(),
                calendar: calendar.to_string(),
            }),
            Resolution::Multiple(_) => Err(ToolError::Ambiguous {
                kind,
                summary: summary.to_string(),
            }),
        }
    }
}

/// Match items whose SUMMARY equals `target` exactly.
///
/// Unparseable items and items without a SUMMARY never match.
pub fn resolve_item_by_summary<F: ItemFields>(items: Vec<RawItem>, target: &str) -> Resolution<F> {
    let mut matches: Vec<(RawItem, F)> = items
        .into_iter()
        .filter_map(|item| {
            let fields = F::read(&item.data).ok()?;
            (fields.summary() == Some(target)).then_some((item, fields))
        })
        .collect();

    match matches.len() {
        0 => Resolution::NoMatch,
        1 => {
            let (item, fields) = matches.remove(0);
            Resolution::Single(item, fields)
        }
        _ => Resolution::Multiple(matches),
    }
}
