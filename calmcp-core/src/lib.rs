//! Calendar and todo tools over a remote calendar gateway.
//!
//! A tool call resolves a calendar by name, fetches its items through a
//! [`gateway::CalendarGateway`], filters them, and maps iCalendar properties to the text
//! returned to the caller.

pub mod calendar;
pub mod date_range;
pub mod error;
pub mod fields;
pub mod filter;
pub mod gateway;
pub mod ics;
pub mod resolve;
pub mod tools;

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

pub use calendar::{Calendar, ComponentKind};
pub use error::{GatewayError, GatewayResult, ToolError, ToolResult};
pub use gateway::{CalendarGateway, NewItem, RawItem};
pub use tools::CalendarTools;
