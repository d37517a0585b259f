//! files::types
//!
//! Request and result types of the file service.

use serde::{Deserialize, Serialize};

use crate::core::types::Frontmatter;

/// Default number of rows per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Listing filters and pagination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Case-insensitive substring of the name, display name or schema type.
    pub search: Option<String>,
    /// Exact schema type.
    pub schema_type: Option<String>,
    /// 1-based page number.
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> usize {
        self.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

/// One row of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileItem {
    pub name: String,
    /// Repository path, including the namespace directory.
    pub path: String,
    pub revision_id: String,
    pub display_name: String,
    pub schema_type: Option<String>,
    /// Whether the name follows `{display}.{schema_type}.md`.
    pub is_valid_format: bool,
    pub namespace: String,
}

/// A document as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub name: String,
    pub path: String,
    pub namespace: String,
    pub revision_id: Option<String>,
    pub frontmatter: Frontmatter,
    pub content: String,
}

/// Input of a create.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFile {
    pub filename: String,
    pub namespace: Option<String>,
    #[serde(default)]
    pub frontmatter: Frontmatter,
    #[serde(default)]
    pub content: String,
}

/// Input of an update. Without a revision id the current one is used.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFile {
    #[serde(default)]
    pub frontmatter: Frontmatter,
    #[serde(default)]
    pub content: String,
    pub revision_id: Option<String>,
}

/// Result of a create, update or delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    pub path: String,
    pub revision_id: Option<String>,
    pub commit_id: Option<String>,
}

/// Result of a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    pub old_path: String,
    pub new_path: String,
    /// Revision of the file at its new path.
    pub revision_id: Option<String>,
    /// Commit that removed the old path.
    pub commit_id: Option<String>,
}
