//! The seam between tool handlers and the remote calendar server.
//!
//! Handlers only ever talk to a [`CalendarGateway`]. The CalDAV implementation lives in
//! `calmcp-provider-caldav`; tests use the in-memory gateway.

use crate::calendar::Calendar;
use crate::date_range::DateRange;
use crate::error::GatewayResult;

/// A calendar object resource as stored on the server.
#[derive(Debug, Clone, PartialEq)]
pub struct RawItem {
    pub href: String,
    pub etag: Option<String>,
    /// iCalendar text
    pub data: String,
}

impl RawItem {
    pub fn new(href: impl Into<String>, data: impl Into<String>) -> Self {
        RawItem {
            href: href.into(),
            etag: None,
            data: data.into(),
        }
    }
}

/// A freshly generated item that does not exist on the server yet.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub uid: String,
    pub data: String,
}

/// Remote calendar operations the tool handlers rely on.
///
/// Calls are blocking. Enumeration order of calendars and items is whatever the server
/// returns; handlers treat it as meaningful (first match, limit truncation).
pub trait CalendarGateway {
    fn list_calendars(&self) -> GatewayResult<Vec<Calendar>>;

    /// Events of a calendar, restricted server-side when a range is given.
    fn list_events(
        &self,
        calendar: &Calendar,
        range: Option<&DateRange>,
    ) -> GatewayResult<Vec<RawItem>>;

    fn list_todos(&self, calendar: &Calendar) -> GatewayResult<Vec<RawItem>>;

    /// Create a calendar collection named `name` at path segment `id`.
    fn create_calendar(&self, name: &str, id: &str) -> GatewayResult<Calendar>;

    /// Store a new event or todo in `calendar`.
    fn create(&self, calendar: &Calendar, item: &NewItem) -> GatewayResult<RawItem>;

    /// Write back a modified item.
    fn save(&self, item: &RawItem) -> GatewayResult<()>;

    fn delete(&self, item: &RawItem) -> GatewayResult<()>;
}
