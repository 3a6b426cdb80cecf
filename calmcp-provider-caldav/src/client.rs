//! Blocking CalDAV gateway.
//!
//! Discovery follows RFC 6764/4791: PROPFIND `current-user-principal` on the configured URL,
//! then `calendar-home-set` on the principal, then a Depth 1 listing of the home.

use std::sync::Mutex;
use std::time::Duration;

use calmcp_core::date_range::DateRange;
use calmcp_core::{
    Calendar, CalendarGateway, ComponentKind, GatewayError, GatewayResult, NewItem, RawItem,
};
use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{CONTENT_TYPE, ETAG, IF_MATCH, IF_NONE_MATCH};
use tracing::{debug, info};
use url::Url;

use crate::requests;
use crate::xml;

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
const ICS_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

/// Connection settings for a CalDAV server.
#[derive(Debug, Clone)]
pub struct CalDavSettings {
    pub url: String,
    pub username: String,
    pub password: Option<String>,
    /// Skip discovery and list this collection directly
    pub calendar_home: Option<String>,
    pub timeout: Duration,
}

pub struct CalDavGateway {
    client: Client,
    base: Url,
    username: String,
    password: Option<String>,
    configured_home: Option<String>,
    home: Mutex<Option<Url>>,
}

impl CalDavGateway {
    /// Build the HTTP client. No request is sent until the first call.
    ///
    /// Must not be called from within an async context (the blocking client owns a runtime).
    pub fn new(settings: CalDavSettings) -> GatewayResult<Self> {
        let base = Url::parse(&settings.url).map_err(|e| {
            GatewayError::Other(format!("invalid CalDAV URL '{}': {}", settings.url, e))
        })?;

        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(settings.timeout)
            .build()
            .map_err(transport)?;

        Ok(CalDavGateway {
            client,
            base,
            username: settings.username,
            password: settings.password,
            configured_home: settings.calendar_home,
            home: Mutex::new(None),
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.username, self.password.as_deref())
    }

    fn propfind(&self, url: &Url, depth: &str, body: &'static str) -> GatewayResult<(Url, String)> {
        let response = self
            .request(dav_method(b"PROPFIND")?, url.as_str())
            .header(CONTENT_TYPE, XML_CONTENT_TYPE)
            .header("Depth", depth)
            .body(body)
            .send()
            .map_err(transport)?;

        let response = check_status(response)?;
        // Hrefs are relative to wherever redirects ended up
        let final_url = response.url().clone();
        let body = response.text().map_err(transport)?;
        Ok((final_url, body))
    }

    /// The calendar home collection, discovered once and then reused.
    fn calendar_home(&self) -> GatewayResult<Url> {
        let mut cached = self.home.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(home) = cached.as_ref() {
            return Ok(home.clone());
        }

        let home = match self.configured_home.as_deref() {
            Some(path) => self
                .base
                .join(path)
                .map_err(|e| {
                    GatewayError::Other(format!("invalid calendar home '{}': {}", path, e))
                })?,
            None => self.discover_home()?,
        };

        info!(home = %home, "using calendar home");
        *cached = Some(home.clone());
        Ok(home)
    }

    fn discover_home(&self) -> GatewayResult<Url> {
        let (final_url, body) = self.propfind(&self.base, "0", requests::CURRENT_USER_PRINCIPAL)?;
        let principal = xml::property_href(&body, "current-user-principal", &final_url)?;
        debug!(principal = %principal, "found principal");

        let (final_url, body) = self.propfind(&principal, "0", requests::CALENDAR_HOME_SET)?;
        xml::property_href(&body, "calendar-home-set", &final_url)
    }

    fn query(
        &self,
        calendar: &Calendar,
        kind: ComponentKind,
        range: Option<&DateRange>,
    ) -> GatewayResult<Vec<RawItem>> {
        let url = parse_url(&calendar.url)?;
        let response = self
            .request(dav_method(b"REPORT")?, url.as_str())
            .header(CONTENT_TYPE, XML_CONTENT_TYPE)
            .header("Depth", "1")
            .body(requests::calendar_query(kind, range))
            .send()
            .map_err(transport)?;

        let response = check_status(response)?;
        let body = response.text().map_err(transport)?;
        let items = xml::calendar_items(&body, &url)?;
        debug!(calendar = %calendar.name, kind = %kind, count = items.len(), "fetched items");
        Ok(items)
    }

    fn put(
        &self,
        url: &str,
        data: &str,
        precondition: Option<(reqwest::header::HeaderName, &str)>,
    ) -> GatewayResult<Option<String>> {
        let mut request = self
            .request(Method::PUT, url)
            .header(CONTENT_TYPE, ICS_CONTENT_TYPE)
            .body(data.to_string());
        if let Some((header, value)) = precondition {
            request = request.header(header, value);
        }

        let response = check_status(request.send().map_err(transport)?)?;
        Ok(response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string))
    }
}

impl CalendarGateway for CalDavGateway {
    fn list_calendars(&self) -> GatewayResult<Vec<Calendar>> {
        let home = self.calendar_home()?;
        let (final_url, body) = self.propfind(&home, "1", requests::LIST_COLLECTIONS)?;

        Ok(xml::collections(&body, &final_url)?
            .into_iter()
            .filter(|c| c.is_calendar)
            .map(|c| {
                let calendar = Calendar::new(c.name(), c.url.to_string());
                if c.components.is_empty() {
                    calendar
                } else {
                    let components: Vec<&str> = c.components.iter().map(String::as_str).collect();
                    calendar.with_components(&components)
                }
            })
            .collect())
    }

    fn list_events(
        &self,
        calendar: &Calendar,
        range: Option<&DateRange>,
    ) -> GatewayResult<Vec<RawItem>> {
        self.query(calendar, ComponentKind::Event, range)
    }

    fn list_todos(&self, calendar: &Calendar) -> GatewayResult<Vec<RawItem>> {
        self.query(calendar, ComponentKind::Todo, None)
    }

    fn create_calendar(&self, name: &str, id: &str) -> GatewayResult<Calendar> {
        let home = self.calendar_home()?;
        let url = home
            .join(&format!("{}/", id))
            .map_err(|e| GatewayError::Other(format!("invalid calendar id '{}': {}", id, e)))?;

        let response = self
            .request(dav_method(b"MKCALENDAR")?, url.as_str())
            .header(CONTENT_TYPE, XML_CONTENT_TYPE)
            .body(requests::mkcalendar(name))
            .send()
            .map_err(transport)?;
        check_status(response)?;

        Ok(Calendar::new(name, url.to_string()))
    }

    fn create(&self, calendar: &Calendar, item: &NewItem) -> GatewayResult<RawItem> {
        let url = item_url(&calendar.url, &item.uid);
        let etag = self.put(&url, &item.data, Some((IF_NONE_MATCH, "*")))?;

        Ok(RawItem {
            href: url,
            etag,
            data: item.data.clone(),
        })
    }

    fn save(&self, item: &RawItem) -> GatewayResult<()> {
        let precondition = item.etag.as_deref().map(|etag| (IF_MATCH, etag));
        self.put(&item.href, &item.data, precondition)?;
        Ok(())
    }

    fn delete(&self, item: &RawItem) -> GatewayResult<()> {
        let response = self
            .request(Method::DELETE, &item.href)
            .send()
            .map_err(transport)?;

        // Already gone counts as deleted
        if response.status().as_u16() == 404 {
            return Ok(());
        }
        check_status(response)?;
        Ok(())
    }
}

fn dav_method(name: &'static [u8]) -> GatewayResult<Method> {
    Method::from_bytes(name).map_err(|e| GatewayError::Other(e.to_string()))
}

fn transport(e: reqwest::Error) -> GatewayError {
    GatewayError::Transport(e.to_string())
}

fn parse_url(url: &str) -> GatewayResult<Url> {
    Url::parse(url).map_err(|e| GatewayError::Other(format!("invalid URL '{}': {}", url, e)))
}

fn check_status(response: Response) -> GatewayResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .ok()
        .map(|body| body.trim().chars().take(200).collect::<String>())
        .filter(|body| !body.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    Err(GatewayError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Build the URL for an item resource.
pub fn item_url(calendar_url: &str, uid: &str) -> String {
    let base = calendar_url.trim_end_matches('/');
    format!("{}/{}.ics", base, uid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_url() {
        assert_eq!(
            item_url("https://dav.example.com/cal/work/", "abc"),
            "https://dav.example.com/cal/work/abc.ics"
        );
        assert_eq!(
            item_url("https://dav.example.com/cal/work", "abc"),
            "https://dav.example.com/cal/work/abc.ics"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = CalDavGateway::new(CalDavSettings {
            url: "not a url".into(),
            username: "alice".into(),
            password: None,
            calendar_home: None,
            timeout: Duration::from_secs(5),
        });

        assert!(matches!(result, Err(GatewayError::Other(msg)) if msg.contains("not a url")));
    }
}
