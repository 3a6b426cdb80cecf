use chrono::Utc;
use tracing::{info, warn};

use super::params::{CreateEvent, EventRef, GetEvents, SearchEvents, UpdateEvent};
use super::{CalendarTools, listing_text, search_text};
use crate::calendar::{Calendar, ComponentKind};
use crate::date_range::{DateRange, parse_datetime};
use crate::error::ToolResult;
use crate::fields::{EventFields, EventUpdate};
use crate::filter::{Limit, matches_query, truncate_description};
use crate::gateway::{CalendarGateway, NewItem, RawItem};
use crate::ics::{NewEvent, generate_event, read_event, write_event_fields};
use crate::resolve::{resolve_calendar, resolve_item_by_summary};

impl<G: CalendarGateway> CalendarTools<G> {
    pub fn get_calendar_events(&self, params: GetEvents) -> String {
        self.run("retrieving events", || {
            let range =
                DateRange::from_args(params.start_date.as_deref(), params.end_date.as_deref())?;
            let limit = Limit::from_arg(params.limit);

            let calendars = match params.calendar_name.as_deref() {
                Some(name) => vec![resolve_calendar(&self.gateway, name)?],
                None => self.gateway.list_calendars()?,
            };

            let mut lines = Vec::new();
            'calendars: for calendar in &calendars {
                for item in self.gateway.list_events(calendar, range.as_ref())? {
                    if limit.reached(lines.len()) {
                        break 'calendars;
                    }
                    lines.push(match read_event(&item.data) {
                        Ok(event) => event_line(&event, calendar),
                        Err(e) => format!("Error parsing event from {}: {}", calendar.name, e),
                    });
                }
            }

            Ok(listing_text("events", params.calendar_name.as_deref(), &lines))
        })
    }

    pub fn create_calendar_event(&self, params: CreateEvent) -> String {
        self.run("creating event", || {
            let calendar = resolve_calendar(&self.gateway, &params.calendar_name)?;
            let start = parse_datetime(&params.start_datetime)?;
            let end = parse_datetime(&params.end_datetime)?;

            let uid = uuid::Uuid::new_v4().to_string();
            let data = generate_event(
                &NewEvent {
                    uid: &uid,
                    summary: &params.summary,
                    start,
                    end,
                    description: params.description.as_deref(),
                    location: params.location.as_deref(),
                },
                Utc::now(),
            );

            let item = self.gateway.create(&calendar, &NewItem { uid, data })?;
            info!(calendar = %calendar.name, href = %item.href, "created event");

            Ok(format!(
                "Event '{}' created successfully in calendar '{}'",
                params.summary, calendar.name
            ))
        })
    }

    pub fn delete_calendar_event(&self, params: EventRef) -> String {
        self.run("deleting event", || {
            let calendar = resolve_calendar(&self.gateway, &params.calendar_name)?;
            let (item, _) = self.find_event(&calendar, &params.event_summary)?;

            self.gateway.delete(&item)?;
            info!(calendar = %calendar.name, href = %item.href, "deleted event");

            Ok(format!(
                "Event '{}' deleted successfully from calendar '{}'",
                params.event_summary, calendar.name
            ))
        })
    }

    pub fn update_calendar_event(&self, params: UpdateEvent) -> String {
        self.run("updating event", || {
            let calendar = resolve_calendar(&self.gateway, &params.calendar_name)?;
            let (mut item, current) = self.find_event(&calendar, &params.event_summary)?;

            let update = EventUpdate {
                summary: params.new_summary.clone(),
                start: params.new_start_datetime.as_deref().map(parse_datetime).transpose()?,
                end: params.new_end_datetime.as_deref().map(parse_datetime).transpose()?,
                description: params.new_description.clone(),
                location: params.new_location.clone(),
            };

            item.data = write_event_fields(&item.data, &current, &update, Utc::now())?;
            self.gateway.save(&item)?;
            info!(calendar = %calendar.name, href = %item.href, "updated event");

            Ok(format!(
                "Event '{}' updated successfully in calendar '{}'",
                params.event_summary, calendar.name
            ))
        })
    }

    pub fn search_calendar_events(&self, params: SearchEvents) -> String {
        self.run("searching events", || {
            let range =
                DateRange::from_args(params.start_date.as_deref(), params.end_date.as_deref())?;
            let limit = Limit::from_arg(params.limit);

            let calendars = self.gateway.list_calendars()?;
            if calendars.is_empty() {
                return Ok("No calendars found.".to_string());
            }

            let mut lines = Vec::new();
            'calendars: for calendar in &calendars {
                let items = match self.gateway.list_events(calendar, range.as_ref()) {
                    Ok(items) => items,
                    Err(e) => {
                        warn!(calendar = %calendar.name, error = %e, "skipping calendar in search");
                        continue;
                    }
                };

                for item in items {
                    let Ok(event) = read_event(&item.data) else {
                        continue;
                    };
                    if !matches_query(
                        &params.query,
                        event.summary.as_deref(),
                        event.description.as_deref(),
                    ) {
                        continue;
                    }

                    let mut line = format!(
                        "- {} in {} ({})",
                        event.title(),
                        calendar.name,
                        event.start_label()
                    );
                    if let Some(ref description) = event.description {
                        line.push_str(": ");
                        line.push_str(&truncate_description(description));
                    }
                    lines.push(line);

                    if limit.reached(lines.len()) {
                        break 'calendars;
                    }
                }
            }

            Ok(search_text("events", &params.query, &lines))
        })
    }

    fn find_event(
        &self,
        calendar: &Calendar,
        summary: &str,
    ) -> ToolResult<(RawItem, EventFields)> {
        let items = self.gateway.list_events(calendar, None)?;
        resolve_item_by_summary::<EventFields>(items, summary).into_target(
            ComponentKind::Event,
            summary,
            &calendar.name,
        )
    }
}

fn event_line(event: &EventFields, calendar: &Calendar) -> String {
    format!(
        "{} (from: {}, {} - {})",
        event.title(),
        calendar.name,
        event.start_label(),
        event.end_label()
    )
}
