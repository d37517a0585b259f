//! core::paths
//!
//! Path safety for document paths and centralized routing for the schema
//! repository's on-disk layout.
//!
//! # Document paths
//!
//! Every caller-supplied path is checked by [`validate_path`] before any
//! namespace prefix is added or any provider is called. A valid path is
//! relative, contains no `..` and no `/./`.
//!
//! # Schema working directory layout
//!
//! ```text
//! <work_dir>/
//!   current/              live working copy
//!     schemas/<id>.json
//!     templates/<schema_type>/<name>.md
//!   backup/               previous copy, removed after a grace period
//!   staging-<uuid>/       fresh clone being prepared
//! ```
//!
//! No code outside this module joins these names by hand.

use std::path::{Path, PathBuf};

use crate::core::errors::AppError;

/// Check that a document path cannot escape the repository root.
///
/// # Errors
///
/// `AppError::Validation` when the path is empty, absolute, contains a `..`
/// or `/./` sequence, or contains a NUL or backslash.
///
/// # Example
///
/// ```
/// use gitmark::core::paths::validate_path;
///
/// assert!(validate_path("team-x/notes.md").is_ok());
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("/abs.md").is_err());
/// assert!(validate_path("a/./b.md").is_err());
/// ```
pub fn validate_path(path: &str) -> Result<(), AppError> {
    if path.is_empty() {
        return Err(AppError::Validation("path must not be empty".into()));
    }
    if path.starts_with('/') {
        return Err(AppError::Validation(format!(
            "path must be relative: '{path}'"
        )));
    }
    if path.contains("..") {
        return Err(AppError::Validation(format!(
            "path must not contain '..': '{path}'"
        )));
    }
    if path.contains("/./") {
        return Err(AppError::Validation(format!(
            "path must not contain '/./': '{path}'"
        )));
    }
    if path.contains('\0') || path.contains('\\') {
        return Err(AppError::Validation(format!(
            "path contains a forbidden character: '{path}'"
        )));
    }
    Ok(())
}

/// Join a root prefix and a relative path with exactly one separator.
///
/// An empty root returns the relative path unchanged.
pub fn join_remote(root: &str, relative: &str) -> String {
    let root = root.trim_matches('/');
    let relative = relative.trim_start_matches('/');
    match (root.is_empty(), relative.is_empty()) {
        (true, _) => relative.to_string(),
        (false, true) => root.to_string(),
        (false, false) => format!("{root}/{relative}"),
    }
}

/// Strip a root prefix from a provider-reported path.
///
/// Paths outside the root are returned unchanged.
pub fn strip_root<'a>(root: &str, full: &'a str) -> &'a str {
    let root = root.trim_matches('/');
    if root.is_empty() {
        return full;
    }
    full.strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(full)
}

/// Routing for the schema repository's working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRepoPaths {
    root: PathBuf,
}

impl SchemaRepoPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Live working copy.
    pub fn current(&self) -> PathBuf {
        self.root.join("current")
    }

    /// Previous working copy kept during the swap grace period.
    pub fn backup(&self) -> PathBuf {
        self.root.join("backup")
    }

    /// Fresh clone target, unique per attempt.
    pub fn staging(&self) -> PathBuf {
        self.root.join(format!("staging-{}", uuid::Uuid::new_v4()))
    }

    /// Staging directories currently on disk.
    pub fn staging_dirs(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };
        entries
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with("staging-"))
            .map(|e| e.path())
            .collect()
    }

    /// Everything a repository writes under the root. Other entries in a
    /// configured work dir are left alone.
    pub fn owned_entries(&self) -> Vec<PathBuf> {
        let mut owned = vec![self.current(), self.backup()];
        owned.extend(self.staging_dirs());
        owned
    }

    /// `schemas/` directory inside a copy.
    pub fn schemas_dir(copy: &Path) -> PathBuf {
        copy.join("schemas")
    }

    /// `templates/` directory inside a copy.
    pub fn templates_dir(copy: &Path) -> PathBuf {
        copy.join("templates")
    }

    /// `schemas/<id>.json` inside a copy.
    pub fn schema_file(copy: &Path, id: &str) -> PathBuf {
        Self::schemas_dir(copy).join(format!("{id}.json"))
    }
}
