//! Remote calendar collections as seen by the tool handlers.

use std::fmt;

/// The two kinds of calendar component the tools operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Event,
    Todo,
}

impl ComponentKind {
    /// iCalendar component name (VEVENT / VTODO)
    pub fn ics_name(&self) -> &'static str {
        match self {
            ComponentKind::Event => "VEVENT",
            ComponentKind::Todo => "VTODO",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Event => write!(f, "event"),
            ComponentKind::Todo => write!(f, "todo"),
        }
    }
}

/// A calendar collection on the remote server.
///
/// `name` is the only key the tools use; the URL is an opaque handle for the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct Calendar {
    pub name: String,
    pub url: String,
    /// Component names as reported by the server (e.g. "VEVENT", "VTODO")
    pub supported_components: Vec<String>,
}

impl Calendar {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Calendar {
            name: name.into(),
            url: url.into(),
            supported_components: vec!["VEVENT".to_string(), "VTODO".to_string()],
        }
    }

    pub fn with_components(mut self, components: &[&str]) -> Self {
        self.supported_components = components.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn components_label(&self) -> String {
        self.supported_components.join(", ")
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
