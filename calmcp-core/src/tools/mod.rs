//! Tool handlers. Each returns exactly one string; failures are rendered here.

mod calendars;
mod events;
pub mod params;
mod todos;

use tracing::warn;

use crate::error::ToolResult;
use crate::gateway::CalendarGateway;

/// The tool surface over a single gateway.
pub struct CalendarTools<G> {
    gateway: G,
}

impl<G: CalendarGateway> CalendarTools<G> {
    pub fn new(gateway: G) -> Self {
        CalendarTools { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Run a handler body and render its error, if any, for `action`.
    fn run(&self, action: &str, body: impl FnOnce() -> ToolResult<String>) -> String {
        match body() {
            Ok(text) => text,
            Err(e) => {
                warn!(action, error = %e, "tool call failed");
                e.render(action)
            }
        }
    }
}

/// Header plus semicolon-joined lines for the event and todo listings.
fn listing_text(kind: &str, calendar: Option<&str>, lines: &[String]) -> String {
    match (calendar, lines.is_empty()) {
        (Some(c), true) => format!("No {} found in calendar '{}'.", kind, c),
        (None, true) => format!("No {} found in any calendar.", kind),
        (Some(c), false) => format!(
            "{} in '{}' ({} found): {}",
            capitalize(kind),
            c,
            lines.len(),
            lines.join("; ")
        ),
        (None, false) => format!(
            "{} from all calendars ({} found): {}",
            capitalize(kind),
            lines.len(),
            lines.join("; ")
        ),
    }
}

fn search_text(kind: &str, query: &str, lines: &[String]) -> String {
    if lines.is_empty() {
        format!("No {} found matching '{}'", kind, query)
    } else {
        format!(
            "Found {} {} matching '{}':\n{}",
            lines.len(),
            kind,
            query,
            lines.join("\n")
        )
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
