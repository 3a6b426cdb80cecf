//! Tool arguments as received from the transport.
//!
//! Optional strings that arrive empty are treated as absent.

use serde::{Deserialize, Deserializer};

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarName {
    pub calendar_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCalendar {
    pub calendar_name: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetEvents {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub calendar_name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvent {
    pub calendar_name: String,
    pub summary: String,
    pub start_datetime: String,
    pub end_datetime: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventRef {
    pub calendar_name: String,
    pub event_summary: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEvent {
    pub calendar_name: String,
    pub event_summary: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub new_summary: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub new_start_datetime: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub new_end_datetime: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub new_description: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub new_location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchEvents {
    pub query: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetTodos {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub calendar_name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTodo {
    pub calendar_name: String,
    pub summary: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TodoRef {
    pub calendar_name: String,
    pub todo_summary: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTodo {
    pub calendar_name: String,
    pub todo_summary: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub new_summary: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub new_description: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub new_due_date: Option<String>,
    #[serde(default)]
    pub new_priority: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub new_status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchTodos {
    pub query: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_strings_are_absent() {
        let params: UpdateTodo = serde_json::from_value(json!({
            "calendar_name": "Work",
            "todo_summary": "Email Bob",
            "new_summary": "",
            "new_status": "completed",
            "new_description": null
        }))
        .unwrap();

        assert_eq!(params.new_summary, None);
        assert_eq!(params.new_description, None);
        assert_eq!(params.new_status.as_deref(), Some("completed"));
        assert_eq!(params.new_priority, None);
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let err = serde_json::from_value::<CreateEvent>(json!({
            "calendar_name": "Work",
            "summary": "Standup"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("start_datetime"), "got: {}", err);
    }
}
