use tracing::info;

use super::CalendarTools;
use super::params::{CalendarName, CreateCalendar};
use crate::calendar::Calendar;
use crate::error::{GatewayResult, ToolError};
use crate::gateway::CalendarGateway;
use crate::resolve::resolve_calendar;

impl<G: CalendarGateway> CalendarTools<G> {
    pub fn get_calendar_info(&self, params: CalendarName) -> String {
        self.run("getting calendar info", || {
            let calendar = resolve_calendar(&self.gateway, &params.calendar_name)?;
            let events = self.gateway.list_events(&calendar, None)?;
            Ok(format!(
                "Calendar '{}' info: {} events, URL: {}",
                calendar.name,
                events.len(),
                calendar.url
            ))
        })
    }

    pub fn get_calendars(&self) -> String {
        self.run("retrieving calendars", || {
            let calendars = self.gateway.list_calendars()?;
            if calendars.is_empty() {
                return Ok("No calendars found.".to_string());
            }

            let lines: Vec<String> = calendars
                .iter()
                .map(|calendar| match self.count_items(calendar) {
                    Ok((events, todos)) => format!(
                        "{} - Events: {}, Todos: {} (Supports: {})",
                        calendar.name,
                        events,
                        todos,
                        calendar.components_label()
                    ),
                    Err(e) => format!("{} - Error: {}", calendar.name, e),
                })
                .collect();

            Ok(format!("Available calendars:\n{}", lines.join("\n")))
        })
    }

    pub fn get_calendar_capabilities(&self, params: CalendarName) -> String {
        self.run("checking capabilities", || {
            let calendar = resolve_calendar(&self.gateway, &params.calendar_name)?;
            Ok(format!(
                "Calendar '{}' supports: {}",
                calendar.name,
                calendar.components_label()
            ))
        })
    }

    pub fn create_calendar(&self, params: CreateCalendar) -> String {
        self.run("creating calendar", || {
            let name = params.calendar_name.as_str();
            let exists = self
                .gateway
                .list_calendars()?
                .iter()
                .any(|c| c.name == name);
            if exists {
                return Err(ToolError::CalendarExists(name.to_string()));
            }

            let id = slug::slugify(params.display_name.as_deref().unwrap_or(name));
            let calendar = self.gateway.create_calendar(name, &id)?;
            info!(name = %calendar.name, url = %calendar.url, "created calendar");

            Ok(format!("Calendar '{}' created successfully.", name))
        })
    }

    fn count_items(&self, calendar: &Calendar) -> GatewayResult<(usize, usize)> {
        let events = self.gateway.list_events(calendar, None)?.len();
        let todos = self.gateway.list_todos(calendar)?.len();
        Ok((events, todos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryGateway, event_ics, todo_ics};

    fn tools() -> CalendarTools<MemoryGateway> {
        let gateway = MemoryGateway::new().with_calendar("Work").with_calendar("Personal");
        gateway.add_item("Work", event_ics("e1", "Standup", "20250320T090000", None));
        gateway.add_item("Work", event_ics("e2", "Retro", "20250321T090000", None));
        gateway.add_item("Work", todo_ics("t1", "Email Bob", None, None));
        CalendarTools::new(gateway)
    }

    fn named(name: &str) -> CalendarName {
        CalendarName {
            calendar_name: name.to_string(),
        }
    }

    #[test]
    fn test_calendar_info_counts_events() {
        let tools = tools();
        assert_eq!(
            tools.get_calendar_info(named("Work")),
            "Calendar 'Work' info: 2 events, URL: memory:/Work/"
        );
        assert_eq!(tools.get_calendar_info(named("Gym")), "Calendar 'Gym' not found.");
    }

    #[test]
    fn test_get_calendars_reports_per_calendar_failures() {
        let tools = tools();
        tools.gateway().fail_listing("Personal");

        assert_eq!(
            tools.get_calendars(),
            "Available calendars:\n\
             Work - Events: 2, Todos: 1 (Supports: VEVENT, VTODO)\n\
             Personal - Error: server returned 500: listing Personal failed"
        );
    }

    #[test]
    fn test_no_calendars() {
        let tools = CalendarTools::new(MemoryGateway::new());
        assert_eq!(tools.get_calendars(), "No calendars found.");
    }

    #[test]
    fn test_capabilities() {
        let tools = tools();
        tools
            .gateway()
            .add_calendar(Calendar::new("Tasks", "memory:/tasks/").with_components(&["VTODO"]));

        assert_eq!(
            tools.get_calendar_capabilities(named("Tasks")),
            "Calendar 'Tasks' supports: VTODO"
        );
    }

    #[test]
    fn test_create_calendar_rejects_existing_name_without_mutation() {
        let tools = tools();

        let text = tools.create_calendar(CreateCalendar {
            calendar_name: "Work".to_string(),
            display_name: None,
        });

        assert_eq!(text, "Calendar 'Work' already exists.");
        assert_eq!(tools.gateway().mutation_count(), 0);
    }

    #[test]
    fn test_create_calendar_uses_slug_of_display_name() {
        let tools = tools();

        let text = tools.create_calendar(CreateCalendar {
            calendar_name: "Side Projects".to_string(),
            display_name: Some("My Side Projects".to_string()),
        });

        assert_eq!(text, "Calendar 'Side Projects' created successfully.");
        let created = resolve_calendar(tools.gateway(), "Side Projects").unwrap();
        assert_eq!(created.url, "memory:/my-side-projects/");
    }
}
