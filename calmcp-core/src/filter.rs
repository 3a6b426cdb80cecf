//! Status filter, output limit and search matching shared by listing and search tools.

use crate::fields::TodoFields;

pub const DEFAULT_LIMIT: u32 = 10;
pub const DESCRIPTION_PREVIEW_CHARS: usize = 100;

/// Maximum number of lines a listing produces. `0` lifts the bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit(Option<usize>);

impl Limit {
    pub fn from_arg(limit: Option<u32>) -> Self {
        match limit.unwrap_or(DEFAULT_LIMIT) {
            0 => Limit(None),
            n => Limit(Some(n as usize)),
        }
    }

    pub fn reached(&self, produced: usize) -> bool {
        self.0.is_some_and(|max| produced >= max)
    }
}

impl Default for Limit {
    fn default() -> Self {
        Limit::from_arg(None)
    }
}

/// Case-insensitive status comparison; a todo without STATUS counts as NEEDS-ACTION.
pub fn status_matches(wanted: Option<&str>, todo: &TodoFields) -> bool {
    wanted.is_none_or(|w| w.trim().eq_ignore_ascii_case(todo.status()))
}

/// Case-insensitive substring match against summary or the full description.
pub fn matches_query(query: &str, summary: Option<&str>, description: Option<&str>) -> bool {
    let needle = query.to_lowercase();
    [summary, description]
        .into_iter()
        .flatten()
        .any(|text| text.to_lowercase().contains(&needle))
}

/// Cut a description to its first 100 characters, marking the cut with "...".
pub fn truncate_description(description: &str) -> String {
    if description.chars().count() <= DESCRIPTION_PREVIEW_CHARS {
        return description.to_string();
    }
    let mut preview: String = description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_and_zero_means_unbounded() {
        assert!(Limit::default().reached(10));
        assert!(!Limit::default().reached(9));
        assert!(Limit::from_arg(Some(2)).reached(2));
        assert!(!Limit::from_arg(Some(0)).reached(10_000));
    }

    #[test]
    fn test_missing_status_counts_as_needs_action() {
        let todo = TodoFields::default();
        assert!(status_matches(Some("needs-action"), &todo));
        assert!(!status_matches(Some("COMPLETED"), &todo));
        assert!(status_matches(None, &todo));

        let done = TodoFields {
            status: Some("COMPLETED".into()),
            ..Default::default()
        };
        assert!(status_matches(Some("Completed"), &done));
    }

    #[test]
    fn test_query_matches_summary_or_description() {
        assert!(matches_query("DENT", Some("Dentist"), None));
        assert!(matches_query("insurance", Some("Dentist"), Some("Bring Insurance card")));
        assert!(!matches_query("gym", Some("Dentist"), None));
        assert!(!matches_query("gym", None, None));
    }

    #[test]
    fn test_truncation_is_by_character() {
        let short = "é".repeat(100);
        assert_eq!(truncate_description(&short), short);

        let long = "é".repeat(150);
        let preview = truncate_description(&long);
        assert_eq!(preview.chars().count(), 103);
        assert!(preview.ends_with("é..."));
    }
}
