//! core::naming
//!
//! Document filename convention.
//!
//! A document named `{display}.{schema_type}.md` declares which schema it
//! follows: `customer-service.simple-agent.md` is the document
//! "customer-service" of schema type "simple-agent". Files that do not follow
//! the convention are still valid documents, they just carry no schema type.

use serde::Serialize;

/// Markdown suffix every managed document carries.
pub const MARKDOWN_SUFFIX: &str = ".md";

/// Parts of a conventionally named document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFilename {
    pub name: String,
    pub schema_type: String,
}

/// Split `{display}.{schema_type}.md` into its parts.
///
/// Returns `None` when the name does not end in `.md`, has fewer than two
/// dot-separated segments before the suffix, or has an empty segment.
///
/// # Example
///
/// ```
/// use gitmark::core::naming::parse_filename;
///
/// let parsed = parse_filename("customer-service.simple-agent.md").unwrap();
/// assert_eq!(parsed.name, "customer-service");
/// assert_eq!(parsed.schema_type, "simple-agent");
///
/// assert!(parse_filename("readme.md").is_none());
/// ```
pub fn parse_filename(filename: &str) -> Option<ParsedFilename> {
    let stem = filename.strip_suffix(MARKDOWN_SUFFIX)?;
    let (name, schema_type) = stem.rsplit_once('.')?;
    if name.is_empty() || schema_type.is_empty() {
        return None;
    }
    Some(ParsedFilename {
        name: name.to_string(),
        schema_type: schema_type.to_string(),
    })
}

/// Build `{display}.{schema_type}.md`.
pub fn build_filename(name: &str, schema_type: &str) -> String {
    format!("{name}.{schema_type}{MARKDOWN_SUFFIX}")
}

/// Human-facing name: the display part when the convention applies,
/// otherwise the filename without `.md`.
pub fn display_name(filename: &str) -> String {
    match parse_filename(filename) {
        Some(parsed) => parsed.name,
        None => filename
            .strip_suffix(MARKDOWN_SUFFIX)
            .unwrap_or(filename)
            .to_string(),
    }
}

pub fn schema_type(filename: &str) -> Option<String> {
    parse_filename(filename).map(|p| p.schema_type)
}

pub fn is_valid_filename_format(filename: &str) -> bool {
    parse_filename(filename).is_some()
}

/// Whether a path names a markdown document.
pub fn is_markdown(path: &str) -> bool {
    path.ends_with(MARKDOWN_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_conventional_name() {
        assert_eq!(
            parse_filename("customer-service.simple-agent.md"),
            Some(ParsedFilename {
                name: "customer-service".into(),
                schema_type: "simple-agent".into()
            })
        );
    }

    #[test]
    fn dots_in_display_name_belong_to_the_name() {
        let parsed = parse_filename("v1.2.release-notes.md").unwrap();
        assert_eq!(parsed.name, "v1.2");
        assert_eq!(parsed.schema_type, "release-notes");
    }

    #[test]
    fn rejects_unconventional_names() {
        assert!(parse_filename("readme.md").is_none());
        assert!(parse_filename(".agent.md").is_none());
        assert!(parse_filename("name..md").is_none());
        assert!(parse_filename("name.agent.txt").is_none());
    }

    #[test]
    fn build_then_parse() {
        let filename = build_filename("onboarding", "user-story");
        assert_eq!(filename, "onboarding.user-story.md");
        assert_eq!(schema_type(&filename).as_deref(), Some("user-story"));
    }

    #[test]
    fn display_name_falls_back_to_stem() {
        assert_eq!(display_name("readme.md"), "readme");
        assert_eq!(display_name("a.b.md"), "a");
        assert_eq!(display_name("notes"), "notes");
    }

    #[test]
    fn markdown_detection() {
        assert!(is_markdown("docs/a.md"));
        assert!(!is_markdown("schemas/a.json"));
        assert!(is_valid_filename_format("a.b.md"));
        assert!(!is_valid_filename_format("a.md"));
    }
}
