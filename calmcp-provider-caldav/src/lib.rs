//! CalDAV implementation of [`calmcp_core::CalendarGateway`].

mod client;
mod requests;
mod xml;

pub use client::{CalDavGateway, CalDavSettings, item_url};
