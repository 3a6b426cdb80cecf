//! Error types for calmcp tool handlers.

use thiserror::Error;

use crate::calendar::ComponentKind;

/// Failures reported by a calendar gateway (network, protocol, server).
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid server response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Other(String),
}

/// A single raw item could not be mapped to its fields.
///
/// Never fatal to a batch: listings render it inline and keep going.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ItemParseError {
    #[error("malformed calendar data: {0}")]
    Malformed(String),

    #[error("no {0} component found")]
    MissingComponent(&'static str),

    #[error("invalid {name} value '{value}'")]
    InvalidProperty { name: &'static str, value: String },
}

/// Terminal outcome of a tool call, rendered to text once at the handler boundary.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Calendar '{0}' not found.")]
    CalendarNotFound(String),

    #[error("Calendar '{0}' already exists.")]
    CalendarExists(String),

    #[error("No {kind} found with summary '{summary}' in calendar '{calendar}'")]
    NoMatch {
        kind: ComponentKind,
        summary: String,
        calendar: String,
    },

    #[error("Multiple {kind}s found with summary '{summary}'. Please be more specific.")]
    Ambiguous { kind: ComponentKind, summary: String },

    #[error("Error parsing {what} format: {detail}. Please use {expected} format.")]
    Format {
        what: &'static str,
        expected: &'static str,
        detail: String,
    },

    #[error("Invalid {field} '{value}': {reason}")]
    InvalidArgument {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    ItemParse(#[from] ItemParseError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ToolError {
    /// Render for the caller. Uncategorized failures get the `Error <action>: ...` form,
    /// everything else already reads as a sentence.
    pub fn render(&self, action: &str) -> String {
        match self {
            ToolError::Gateway(e) => format!("Error {}: {}", action, e),
            ToolError::ItemParse(e) => format!("Error {}: {}", action, e),
            other => other.to_string(),
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
pub type ToolResult<T> = Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_errors_render_with_action() {
        let err = ToolError::from(GatewayError::Transport("connection refused".into()));
        assert_eq!(
            err.render("creating event"),
            "Error creating event: request failed: connection refused"
        );
    }

    #[test]
    fn test_ambiguity_renders_plural_kind() {
        let err = ToolError::Ambiguous {
            kind: ComponentKind::Todo,
            summary: "Email Bob".into(),
        };
        assert_eq!(
            err.render("updating todo"),
            "Multiple todos found with summary 'Email Bob'. Please be more specific."
        );
    }

    #[test]
    fn test_format_error_names_expected_format() {
        let err = ToolError::Format {
            what: "datetime",
            expected: "YYYY-MM-DD HH:MM",
            detail: "input contains invalid characters".into(),
        };
        assert_eq!(
            err.render("creating event"),
            "Error parsing datetime format: input contains invalid characters. Please use YYYY-MM-DD HH:MM format."
        );
    }
}
