//! Tool registry: names, descriptions and input schemas, and dispatch by name.

use calmcp_core::CalendarGateway;
use calmcp_core::tools::CalendarTools;
use calmcp_core::tools::params;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDef {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[derive(Debug, Error)]
pub enum CallError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: String,
        source: serde_json::Error,
    },
}

fn schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn string(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn integer(description: &str) -> Value {
    json!({ "type": "integer", "description": description })
}

const CALENDAR: &str = "Name of the calendar";
const DATE: &str = "Date in YYYY-MM-DD format";
const DATETIME: &str = "Date and time in YYYY-MM-DD HH:MM format";
const LIMIT: &str = "Maximum number of results (default 10, 0 for no limit)";
const STATUS: &str = "Todo status: NEEDS-ACTION, IN-PROCESS, COMPLETED or CANCELLED";
const PRIORITY: &str = "Priority from 1 (highest) to 9 (lowest)";

pub fn tool_defs() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "get_calendar_info",
            description: "Get information about a calendar, including its event count and URL",
            input_schema: schema(json!({ "calendar_name": string(CALENDAR) }), &["calendar_name"]),
        },
        ToolDef {
            name: "get_calendars",
            description: "List all calendars with their event and todo counts",
            input_schema: schema(json!({}), &[]),
        },
        ToolDef {
            name: "get_calendar_capabilities",
            description: "List the component types (events, todos) a calendar supports",
            input_schema: schema(json!({ "calendar_name": string(CALENDAR) }), &["calendar_name"]),
        },
        ToolDef {
            name: "get_calendar_events",
            description: "List events from one calendar or from all calendars, optionally within a date range",
            input_schema: schema(
                json!({
                    "calendar_name": string("Name of the calendar (all calendars when omitted)"),
                    "start_date": string(DATE),
                    "end_date": string(DATE),
                    "limit": integer(LIMIT),
                }),
                &[],
            ),
        },
        ToolDef {
            name: "create_calendar_event",
            description: "Create an event in a calendar",
            input_schema: schema(
                json!({
                    "calendar_name": string(CALENDAR),
                    "summary": string("Event title"),
                    "start_datetime": string(DATETIME),
                    "end_datetime": string(DATETIME),
                    "description": string("Event description"),
                    "location": string("Event location"),
                }),
                &["calendar_name", "summary", "start_datetime", "end_datetime"],
            ),
        },
        ToolDef {
            name: "delete_calendar_event",
            description: "Delete the event with the given title from a calendar",
            input_schema: schema(
                json!({
                    "calendar_name": string(CALENDAR),
                    "event_summary": string("Exact title of the event"),
                }),
                &["calendar_name", "event_summary"],
            ),
        },
        ToolDef {
            name: "update_calendar_event",
            description: "Update the event with the given title; only the provided fields change",
            input_schema: schema(
                json!({
                    "calendar_name": string(CALENDAR),
                    "event_summary": string("Exact title of the event"),
                    "new_summary": string("New title"),
                    "new_start_datetime": string(DATETIME),
                    "new_end_datetime": string(DATETIME),
                    "new_description": string("New description"),
                    "new_location": string("New location"),
                }),
                &["calendar_name", "event_summary"],
            ),
        },
        ToolDef {
            name: "search_calendar_events",
            description: "Search events in all calendars by title or description",
            input_schema: schema(
                json!({
                    "query": string("Text to look for (case-insensitive)"),
                    "start_date": string(DATE),
                    "end_date": string(DATE),
                    "limit": integer(LIMIT),
                }),
                &["query"],
            ),
        },
        ToolDef {
            name: "create_calendar",
            description: "Create a new calendar",
            input_schema: schema(
                json!({
                    "calendar_name": string(CALENDAR),
                    "display_name": string("Name used for the calendar's URL (defaults to calendar_name)"),
                }),
                &["calendar_name"],
            ),
        },
        ToolDef {
            name: "get_todos",
            description: "List todos from one calendar or from all calendars, optionally by status",
            input_schema: schema(
                json!({
                    "calendar_name": string("Name of the calendar (all calendars when omitted)"),
                    "status": string(STATUS),
                    "limit": integer(LIMIT),
                }),
                &[],
            ),
        },
        ToolDef {
            name: "create_todo",
            description: "Create a todo in a calendar",
            input_schema: schema(
                json!({
                    "calendar_name": string(CALENDAR),
                    "summary": string("Todo title"),
                    "description": string("Todo description"),
                    "due_date": string(DATE),
                    "priority": integer(PRIORITY),
                    "status": string(STATUS),
                }),
                &["calendar_name", "summary"],
            ),
        },
        ToolDef {
            name: "update_todo",
            description: "Update the todo with the given title; only the provided fields change",
            input_schema: schema(
                json!({
                    "calendar_name": string(CALENDAR),
                    "todo_summary": string("Exact title of the todo"),
                    "new_summary": string("New title"),
                    "new_description": string("New description"),
                    "new_due_date": string(DATE),
                    "new_priority": integer(PRIORITY),
                    "new_status": string(STATUS),
                }),
                &["calendar_name", "todo_summary"],
            ),
        },
        ToolDef {
            name: "delete_todo",
            description: "Delete the todo with the given title from a calendar",
            input_schema: schema(
                json!({
                    "calendar_name": string(CALENDAR),
                    "todo_summary": string("Exact title of the todo"),
                }),
                &["calendar_name", "todo_summary"],
            ),
        },
        ToolDef {
            name: "complete_todo",
            description: "Mark the todo with the given title as completed",
            input_schema: schema(
                json!({
                    "calendar_name": string(CALENDAR),
                    "todo_summary": string("Exact title of the todo"),
                }),
                &["calendar_name", "todo_summary"],
            ),
        },
        ToolDef {
            name: "search_todos",
            description: "Search todos in all calendars by title or description",
            input_schema: schema(
                json!({
                    "query": string("Text to look for (case-insensitive)"),
                    "status": string(STATUS),
                    "limit": integer(LIMIT),
                }),
                &["query"],
            ),
        },
    ]
}

fn args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, CallError> {
    // A call without arguments is the same as an empty object
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments).map_err(|source| CallError::InvalidArguments {
        tool: tool.to_string(),
        source,
    })
}

/// Run the named tool.
pub fn call<G: CalendarGateway>(
    tools: &CalendarTools<G>,
    name: &str,
    arguments: Value,
) -> Result<String, CallError> {
    let text = match name {
        "get_calendar_info" => {
            tools.get_calendar_info(args::<params::CalendarName>(name, arguments)?)
        }
        "get_calendars" => tools.get_calendars(),
        "get_calendar_capabilities" => {
            tools.get_calendar_capabilities(args::<params::CalendarName>(name, arguments)?)
        }
        "get_calendar_events" => tools.get_calendar_events(args(name, arguments)?),
        "create_calendar_event" => tools.create_calendar_event(args(name, arguments)?),
        "delete_calendar_event" => tools.delete_calendar_event(args(name, arguments)?),
        "update_calendar_event" => tools.update_calendar_event(args(name, arguments)?),
        "search_calendar_events" => tools.search_calendar_events(args(name, arguments)?),
        "create_calendar" => tools.create_calendar(args(name, arguments)?),
        "get_todos" => tools.get_todos(args(name, arguments)?),
        "create_todo" => tools.create_todo(args(name, arguments)?),
        "update_todo" => tools.update_todo(args(name, arguments)?),
        "delete_todo" => tools.delete_todo(args(name, arguments)?),
        "complete_todo" => tools.complete_todo(args(name, arguments)?),
        "search_todos" => tools.search_todos(args(name, arguments)?),
        other => return Err(CallError::UnknownTool(other.to_string())),
    };
    Ok(text)
}
