//! In-memory gateway for tests.
//!
//! Calendars and items keep insertion order, so tests control enumeration order. Every
//! mutating call is counted and every event query records its range.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::calendar::Calendar;
use crate::date_range::DateRange;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{CalendarGateway, NewItem, RawItem};

#[derive(Default)]
struct State {
    calendars: Vec<(Calendar, Vec<RawItem>)>,
    failing: HashSet<String>,
    queried_ranges: Vec<Option<DateRange>>,
    mutations: usize,
    next_href: usize,
}

#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<State>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty calendar supporting events and todos.
    pub fn with_calendar(self, name: &str) -> Self {
        self.add_calendar(Calendar::new(name, format!("memory:/{}/", name)));
        self
    }

    pub fn add_calendar(&self, calendar: Calendar) {
        self.state().calendars.push((calendar, Vec::new()));
    }

    /// Store raw iCalendar text in the named calendar. Returns the item's href.
    pub fn add_item(&self, calendar: &str, data: impl Into<String>) -> String {
        let mut state = self.state();
        state.next_href += 1;
        let href = format!("memory:/{}/item-{}.ics", calendar, state.next_href);

        if let Some((_, items)) = state.calendars.iter_mut().find(|(c, _)| c.name == calendar) {
            items.push(RawItem::new(href.clone(), data));
        }
        href
    }

    /// Make every listing of the named calendar fail.
    pub fn fail_listing(&self, calendar: &str) {
        self.state().failing.insert(calendar.to_string());
    }

    /// Current items of a calendar, in insertion order.
    pub fn items(&self, calendar: &str) -> Vec<RawItem> {
        self.state()
            .calendars
            .iter()
            .find(|(c, _)| c.name == calendar)
            .map(|(_, items)| items.clone())
            .unwrap_or_default()
    }

    /// Number of create/save/delete/create_calendar calls so far.
    pub fn mutation_count(&self) -> usize {
        self.state().mutations
    }

    /// Ranges passed to `list_events`, one entry per call.
    pub fn queried_ranges(&self) -> Vec<Option<DateRange>> {
        self.state().queried_ranges.clone()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn list(&self, calendar: &Calendar, component: &str) -> GatewayResult<Vec<RawItem>> {
        let state = self.state();
        if state.failing.contains(&calendar.name) {
            return Err(GatewayError::Status {
                status: 500,
                message: format!("listing {} failed", calendar.name),
            });
        }

        let marker = format!("BEGIN:{}", component);
        Ok(state
            .calendars
            .iter()
            .find(|(c, _)| c.url == calendar.url)
            .map(|(_, items)| {
                items
                    .iter()
                    .filter(|item| item.data.contains(&marker))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn find_item_mut<'a>(state: &'a mut State, href: &str) -> GatewayResult<&'a mut RawItem> {
        state
            .calendars
            .iter_mut()
            .flat_map(|(_, items)| items.iter_mut())
            .find(|item| item.href == href)
            .ok_or_else(|| GatewayError::Status {
                status: 404,
                message: format!("{} not found", href),
            })
    }
}

impl CalendarGateway for MemoryGateway {
    fn list_calendars(&self) -> GatewayResult<Vec<Calendar>> {
        Ok(self
            .state()
            .calendars
            .iter()
            .map(|(c, _)| c.clone())
            .collect())
    }

    fn list_events(
        &self,
        calendar: &Calendar,
        range: Option<&DateRange>,
    ) -> GatewayResult<Vec<RawItem>> {
        self.state().queried_ranges.push(range.cloned());
        self.list(calendar, "VEVENT")
    }

    fn list_todos(&self, calendar: &Calendar) -> GatewayResult<Vec<RawItem>> {
        self.list(calendar, "VTODO")
    }

    fn create_calendar(&self, name: &str, id: &str) -> GatewayResult<Calendar> {
        let calendar = Calendar::new(name, format!("memory:/{}/", id));
        let mut state = self.state();
        state.mutations += 1;
        state.calendars.push((calendar.clone(), Vec::new()));
        Ok(calendar)
    }

    fn create(&self, calendar: &Calendar, item: &NewItem) -> GatewayResult<RawItem> {
        let mut state = self.state();
        state.mutations += 1;

        let raw = RawItem::new(format!("{}{}.ics", calendar.url, item.uid), item.data.clone());
        let (_, items) = state
            .calendars
            .iter_mut()
            .find(|(c, _)| c.url == calendar.url)
            .ok_or_else(|| GatewayError::Status {
                status: 404,
                message: format!("{} not found", calendar.url),
            })?;
        items.push(raw.clone());
        Ok(raw)
    }

    fn save(&self, item: &RawItem) -> GatewayResult<()> {
        let mut state = self.state();
        state.mutations += 1;
        let stored = Self::find_item_mut(&mut state, &item.href)?;
        stored.data = item.data.clone();
        Ok(())
    }

    fn delete(&self, item: &RawItem) -> GatewayResult<()> {
        let mut state = self.state();
        state.mutations += 1;
        for (_, items) in state.calendars.iter_mut() {
            items.retain(|i| i.href != item.href);
        }
        Ok(())
    }
}

/// A minimal VEVENT. `start` is an iCalendar date-time such as `20250320T150000`.
pub fn event_ics(uid: &str, summary: &str, start: &str, description: Option<&str>) -> String {
    let description = description
        .map(|d| format!("DESCRIPTION:{}\r\n", d))
        .unwrap_or_default();
    format!(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\nBEGIN:VEVENT\r\nUID:{uid}\r\n\
         SUMMARY:{summary}\r\nDTSTART:{start}\r\n{description}END:VEVENT\r\nEND:VCALENDAR\r\n"
    )
}

/// A minimal VTODO, without STATUS when `status` is `None`.
pub fn todo_ics(
    uid: &str,
    summary: &str,
    status: Option<&str>,
    description: Option<&str>,
) -> String {
    let status = status
        .map(|s| format!("STATUS:{}\r\n", s))
        .unwrap_or_default();
    let description = description
        .map(|d| format!("DESCRIPTION:{}\r\n", d))
        .unwrap_or_default();
    format!(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\nBEGIN:VTODO\r\nUID:{uid}\r\n\
         SUMMARY:{summary}\r\n{status}{description}END:VTODO\r\nEND:VCALENDAR\r\n"
    )
}

/// A VEVENT whose DTSTART cannot be read.
pub fn broken_event_ics(summary: &str) -> String {
    format!(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\nBEGIN:VEVENT\r\nUID:broken\r\n\
         SUMMARY:{summary}\r\nDTSTART:not-a-date\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n"
    )
}
