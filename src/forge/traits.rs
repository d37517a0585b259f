//! forge::traits
//!
//! Provider driver trait for reading and writing documents in a hosted
//! repository.
//!
//! # Design
//!
//! The `ProviderDriver` trait is async because every operation is a REST
//! call. All methods return `Result<_, ProviderError>`; the file service
//! decides what a provider failure means for its caller.
//!
//! Paths passed to and returned from a driver are relative to the driver's
//! configured root path. Revision ids are provider blob ids and are used as
//! optimistic-concurrency tokens on update and delete.
//!
//! # Example
//!
//! ```ignore
//! use gitmark::forge::{ProviderDriver, ProviderError};
//!
//! async fn bump(driver: &dyn ProviderDriver) -> Result<(), ProviderError> {
//!     let file = driver.get_file("notes.md").await?;
//!     let revision = file.revision_id.clone().unwrap_or_default();
//!     driver
//!         .update_file("notes.md", &file.frontmatter, "updated", &revision)
//!         .await?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::{FileContent, FileInfo, Frontmatter, RevisionHistoryEntry, UpdateResult};

/// Number of history entries requested from a provider.
pub const HISTORY_PAGE_SIZE: usize = 20;

/// Errors from provider operations.
///
/// These error types map to common failure modes when interacting
/// with hosting APIs.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested file or revision was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A create targeted a path that already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The supplied revision id is stale.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),

    /// The response could not be decoded.
    #[error("malformed response: {0}")]
    MalformedPayload(String),

    /// The driver was built from unusable settings.
    #[error("invalid driver configuration: {0}")]
    InvalidConfig(String),
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }
}

/// The kind of operation a request belongs to. Status mapping differs per
/// kind: a 422 on create means the file exists, on update it means the
/// revision is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Read,
    Create,
    Update,
    Delete,
}

/// The trait every hosting provider implements.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so one driver can be shared by
/// concurrent requests behind an `Arc`.
///
/// # Error Handling
///
/// - `NotFound`: file, directory or revision does not exist
/// - `AlreadyExists`: create on an occupied path
/// - `Conflict`: the revision id passed to update/delete is stale
/// - everything else: provider or transport failure
#[async_trait]
pub trait ProviderDriver: Send + Sync {
    /// Provider name (e.g., "github", "gitlab").
    fn name(&self) -> &'static str;

    /// List every regular file directly inside `dir` (any extension).
    async fn list_entries(&self, dir: &str) -> Result<Vec<FileInfo>, ProviderError>;

    /// List markdown files at the root path.
    async fn list_files(&self) -> Result<Vec<FileInfo>, ProviderError> {
        let entries = self.list_entries("").await?;
        Ok(entries
            .into_iter()
            .filter(|f| crate::core::naming::is_markdown(&f.name))
            .collect())
    }

    /// List markdown files inside each namespace directory, concatenated in
    /// namespace order. A namespace whose directory does not exist
    /// contributes nothing.
    async fn list_files_under_namespaces(
        &self,
        namespaces: &[String],
    ) -> Result<Vec<FileInfo>, ProviderError> {
        let mut files = Vec::new();
        for namespace in namespaces {
            match self.list_entries(namespace).await {
                Ok(entries) => files.extend(
                    entries
                        .into_iter()
                        .filter(|f| crate::core::naming::is_markdown(&f.name)),
                ),
                Err(ProviderError::NotFound(_)) => {
                    tracing::debug!(provider = self.name(), %namespace, "namespace directory missing");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(files)
    }

    /// Read and decode the file at the head of the default branch.
    async fn get_file(&self, path: &str) -> Result<FileContent, ProviderError>;

    /// Read and decode the file as of a commit id.
    async fn get_file_at_revision(
        &self,
        path: &str,
        revision: &str,
    ) -> Result<FileContent, ProviderError>;

    /// Create a file; fails with `AlreadyExists` when the path is taken.
    async fn create_file(
        &self,
        path: &str,
        frontmatter: &Frontmatter,
        content: &str,
    ) -> Result<UpdateResult, ProviderError>;

    /// Replace a file whose current revision is `revision_id`; fails with
    /// `Conflict` when the file has moved on.
    async fn update_file(
        &self,
        path: &str,
        frontmatter: &Frontmatter,
        content: &str,
        revision_id: &str,
    ) -> Result<UpdateResult, ProviderError>;

    /// Delete a file whose current revision is `revision_id`.
    async fn delete_file(&self, path: &str, revision_id: &str)
        -> Result<UpdateResult, ProviderError>;

    /// The most recent commits touching `path`, newest first.
    async fn list_revisions(&self, path: &str) -> Result<Vec<RevisionHistoryEntry>, ProviderError>;
}
