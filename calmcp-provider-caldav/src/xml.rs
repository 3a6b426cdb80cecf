//! Multistatus response parsing.
//!
//! Elements are matched by local name only; servers disagree on namespace prefixes.

use calmcp_core::{GatewayError, GatewayResult, RawItem};
use roxmltree::{Document, Node};
use url::Url;

/// A collection found in a Depth 1 listing of the calendar home.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub url: Url,
    pub display_name: Option<String>,
    pub is_calendar: bool,
    pub components: Vec<String>,
}

impl Collection {
    /// Display name, or the last path segment when the server sends none.
    pub fn name(&self) -> String {
        self.display_name.clone().unwrap_or_else(|| {
            self.url
                .path()
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string()
        })
    }
}

fn parse(body: &str) -> GatewayResult<Document<'_>> {
    Document::parse(body).map_err(|e| GatewayError::InvalidResponse(e.to_string()))
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.tag_name().name() == name)
}

fn descendant<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.descendants().find(|n| n.tag_name().name() == name)
}

fn text_of(node: Node) -> Option<String> {
    node.text().map(str::trim).filter(|t| !t.is_empty()).map(str::to_string)
}

fn responses<'a, 'input>(doc: &'a Document<'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    doc.root_element()
        .children()
        .filter(|n| n.tag_name().name() == "response")
}

fn resolve_href(base: &Url, href: &str) -> GatewayResult<Url> {
    base.join(href)
        .map_err(|e| GatewayError::InvalidResponse(format!("bad href '{}': {}", href, e)))
}

/// The `href` inside a property such as `current-user-principal` or `calendar-home-set`.
pub fn property_href(body: &str, property: &str, base: &Url) -> GatewayResult<Url> {
    let doc = parse(body)?;
    let href = descendant(doc.root_element(), property)
        .and_then(|prop| descendant(prop, "href"))
        .and_then(text_of)
        .ok_or_else(|| GatewayError::InvalidResponse(format!("no {} in response", property)))?;

    resolve_href(base, &href)
}

/// Collections listed under `home`, excluding `home` itself.
pub fn collections(body: &str, home: &Url) -> GatewayResult<Vec<Collection>> {
    let doc = parse(body)?;
    let mut found = Vec::new();

    for response in responses(&doc) {
        let Some(href) = child(response, "href").and_then(text_of) else {
            continue;
        };
        let url = resolve_href(home, &href)?;
        if url.path().trim_end_matches('/') == home.path().trim_end_matches('/') {
            continue;
        }

        let is_calendar = descendant(response, "resourcetype")
            .is_some_and(|rt| child(rt, "calendar").is_some());

        let components = descendant(response, "supported-calendar-component-set")
            .map(|set| {
                set.children()
                    .filter(|n| n.tag_name().name() == "comp")
                    .filter_map(|n| n.attribute("name"))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        found.push(Collection {
            url,
            display_name: descendant(response, "displayname").and_then(text_of),
            is_calendar,
            components,
        });
    }

    Ok(found)
}

/// Items with calendar data from a calendar-query REPORT. Hrefs become absolute URLs.
pub fn calendar_items(body: &str, base: &Url) -> GatewayResult<Vec<RawItem>> {
    let doc = parse(body)?;
    let mut items = Vec::new();

    for response in responses(&doc) {
        let Some(href) = child(response, "href").and_then(text_of) else {
            continue;
        };
        // Responses without calendar-data are collection or error entries
        let Some(data) = descendant(response, "calendar-data").and_then(|n| n.text()) else {
            continue;
        };

        items.push(RawItem {
            href: resolve_href(base, &href)?.to_string(),
            etag: descendant(response, "getetag").and_then(text_of),
            data: data.to_string(),
        });
    }

    Ok(items)
}
