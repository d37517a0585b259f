//! core::types
//!
//! Shared data model for documents, revisions and write results.
//!
//! These are plain serde-friendly structs. Drivers produce them, the file
//! service enriches them, and the CLI prints them as JSON.

use serde::{Deserialize, Serialize};

/// Decoded frontmatter header: a string-keyed mapping of JSON-like values.
pub type Frontmatter = serde_json::Map<String, serde_json::Value>;

/// A markdown file as listed by a provider driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// Last path segment.
    pub name: String,
    /// Path relative to the driver's root path.
    pub path: String,
    /// Provider content hash (blob id).
    pub revision_id: String,
}

/// A file's decoded content at some revision.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    pub frontmatter: Frontmatter,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Result of a create, update or delete on a provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub success: bool,
    /// Blob id of the written content. Absent for deletes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<String>,
    /// Id of the commit that carried the change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,
}

/// Commit author as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionAuthor {
    pub name: String,
    pub email: String,
    /// Authoring timestamp as the provider formats it (ISO-8601).
    pub date: String,
}

/// One entry of a file's commit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionHistoryEntry {
    /// Full commit id.
    pub revision_id: String,
    /// Abbreviated commit id (first 7 characters on GitHub and Gitea).
    pub short_id: String,
    pub message: String,
    pub author: RevisionAuthor,
    /// Web URL of the commit.
    pub url: String,
}

/// Abbreviate a commit id the way the providers display it.
pub fn short_id(commit_id: &str) -> String {
    commit_id.chars().take(7).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_takes_seven_chars() {
        assert_eq!(short_id("0123456789abcdef"), "0123456");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn file_content_serializes_camel_case_and_skips_none() {
        let content = FileContent {
            frontmatter: Frontmatter::new(),
            content: "# Hi".into(),
            revision_id: Some("abc".into()),
            path: None,
        };
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["revisionId"], "abc");
        assert!(json.get("path").is_none());
    }
}
