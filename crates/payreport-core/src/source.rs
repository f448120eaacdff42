//! Source identity

use serde::{Deserialize, Serialize};

/// An upstream category of events (e.g. one error-tracking issue),
/// identified by a stable id plus a human-readable display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub id: String,
    pub name: String,
}

impl SourceRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Directory name used to key this source's chunks on disk:
    /// a slug of the display name suffixed with the stable id.
    pub fn dir_name(&self) -> String {
        format!("{}-{}", slugify(&self.name), self.id)
    }
}

/// Reduce a display name to a filesystem-safe slug.
pub fn slugify(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();

    // Collapse runs of dashes and trim the ends
    let slug = cleaned
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<&str>>()
        .join("-");

    if slug.is_empty() {
        "source".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Card Declines (EU)"), "card-declines-eu");
        assert_eq!(slugify("Payment   Errors"), "payment-errors");
    }

    #[test]
    fn test_slugify_empty_falls_back() {
        assert_eq!(slugify("***"), "source");
    }

    #[test]
    fn test_dir_name_includes_id() {
        let source = SourceRef::new("12345", "Card Declines");
        assert_eq!(source.dir_name(), "card-declines-12345");
    }
}
