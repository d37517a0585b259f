//! forge::mock
//!
//! In-memory provider driver for deterministic testing.
//!
//! # Design
//!
//! The mock driver stores documents in memory and enforces the same
//! contract the hosted providers do: creates fail on occupied paths,
//! updates and deletes fail with `Conflict` when the revision id is stale.
//! All checks and mutations happen under one mutex, so two concurrent
//! updates carrying the same revision produce exactly one success.
//!
//! Revision ids are the SHA-256 of the stored text; commit ids are the
//! SHA-256 of a monotonically increasing counter.
//!
//! # Example
//!
//! ```
//! use gitmark::forge::mock::MockDriver;
//! use gitmark::forge::ProviderDriver;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let driver = MockDriver::new();
//! let created = driver
//!     .create_file("notes.md", &Default::default(), "# Notes")
//!     .await
//!     .unwrap();
//! assert!(created.success);
//!
//! let file = driver.get_file("notes.md").await.unwrap();
//! assert_eq!(file.content, "# Notes");
//! assert_eq!(file.revision_id, created.revision_id);
//! # });
//! ```

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{ProviderDriver, ProviderError, HISTORY_PAGE_SIZE};
use crate::core::frontmatter;
use crate::core::types::{
    short_id, FileContent, FileInfo, Frontmatter, RevisionAuthor, RevisionHistoryEntry,
    UpdateResult,
};

/// Mock driver for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockDriver {
    inner: Arc<Mutex<MockDriverInner>>,
}

#[derive(Debug, Default)]
struct MockDriverInner {
    /// Current files by path.
    files: BTreeMap<String, StoredFile>,
    /// Every version ever written, by commit id.
    snapshots: BTreeMap<String, BTreeMap<String, String>>,
    /// Commits touching each path, oldest first.
    history: BTreeMap<String, Vec<RevisionHistoryEntry>>,
    /// Commits made so far.
    commit_count: u64,
    /// Operation to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

#[derive(Debug, Clone)]
struct StoredFile {
    raw: String,
    revision_id: String,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    ListEntries(ProviderError),
    GetFile(ProviderError),
    GetFileAtRevision(ProviderError),
    CreateFile(ProviderError),
    UpdateFile(ProviderError),
    DeleteFile(ProviderError),
    ListRevisions(ProviderError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    ListEntries { dir: String },
    GetFile { path: String },
    GetFileAtRevision { path: String, revision: String },
    CreateFile { path: String, raw: String },
    UpdateFile { path: String, revision_id: String },
    DeleteFile { path: String, revision_id: String },
    ListRevisions { path: String },
}

impl MockDriver {
    /// Create an empty mock driver.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockDriverInner::default())),
        }
    }

    /// Create a mock driver holding the given raw documents at `path`.
    ///
    /// Each seeded file gets one initial commit.
    pub fn with_files<I, P, R>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, R)>,
        P: Into<String>,
        R: Into<String>,
    {
        let driver = Self::new();
        {
            let mut inner = driver.lock();
            for (path, raw) in files {
                let path = path.into();
                inner.write(&path, raw.into(), "Seed");
            }
        }
        driver
    }

    /// Configure the mock to fail on a specific operation.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.lock().fail_on = Some(fail_on);
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.lock().fail_on = None;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.lock().operations.clear();
    }

    /// Raw stored text of a file (for test verification).
    pub fn raw_file(&self, path: &str) -> Option<String> {
        self.lock().files.get(path).map(|f| f.raw.clone())
    }

    /// Paths of all stored files, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }

    /// Number of commits made so far.
    pub fn commit_count(&self) -> u64 {
        self.lock().commit_count
    }

    fn lock(&self) -> MutexGuard<'_, MockDriverInner> {
        // A panicking test thread must not hide state from the others.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, op: MockOperation) {
        self.lock().operations.push(op);
    }

    /// Check if we should fail and return the error if so.
    fn check_fail(&self, expected: &str) -> Result<(), ProviderError> {
        let inner = self.lock();
        let err = match &inner.fail_on {
            Some(FailOn::ListEntries(e)) if expected == "list_entries" => e,
            Some(FailOn::GetFile(e)) if expected == "get_file" => e,
            Some(FailOn::GetFileAtRevision(e)) if expected == "get_file_at_revision" => e,
            Some(FailOn::CreateFile(e)) if expected == "create_file" => e,
            Some(FailOn::UpdateFile(e)) if expected == "update_file" => e,
            Some(FailOn::DeleteFile(e)) if expected == "delete_file" => e,
            Some(FailOn::ListRevisions(e)) if expected == "list_revisions" => e,
            _ => return Ok(()),
        };
        Err(err.clone())
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriverInner {
    fn next_commit(&mut self) -> String {
        self.commit_count += 1;
        hash(&format!("commit-{}", self.commit_count))
    }

    fn snapshot(&mut self, commit_id: &str) {
        let tree = self
            .files
            .iter()
            .map(|(path, file)| (path.clone(), file.raw.clone()))
            .collect();
        self.snapshots.insert(commit_id.to_string(), tree);
    }

    fn push_history(&mut self, path: &str, commit_id: &str, message: String) {
        self.history
            .entry(path.to_string())
            .or_default()
            .push(RevisionHistoryEntry {
                revision_id: commit_id.to_string(),
                short_id: short_id(commit_id),
                message,
                author: RevisionAuthor {
                    name: "Mock Author".into(),
                    email: "mock@example.com".into(),
                    date: format!("2024-01-01T00:00:{:02}Z", self.commit_count % 60),
                },
                url: format!("https://example.com/mock/commit/{commit_id}"),
            });
    }

    /// Store `raw` at `path` as a new commit; returns the write result.
    fn write(&mut self, path: &str, raw: String, verb: &str) -> UpdateResult {
        let revision_id = hash(&raw);
        self.files.insert(
            path.to_string(),
            StoredFile {
                raw,
                revision_id: revision_id.clone(),
            },
        );
        let commit_id = self.next_commit();
        self.snapshot(&commit_id);
        self.push_history(path, &commit_id, format!("{verb} {path}"));
        UpdateResult {
            success: true,
            revision_id: Some(revision_id),
            commit_id: Some(commit_id),
        }
    }

    fn require_revision(&self, path: &str, revision_id: &str) -> Result<(), ProviderError> {
        let current = self
            .files
            .get(path)
            .ok_or_else(|| ProviderError::NotFound(path.to_string()))?;
        if current.revision_id != revision_id {
            return Err(ProviderError::Conflict(format!(
                "{path} does not match {revision_id}"
            )));
        }
        Ok(())
    }
}

fn hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

fn decoded(path: &str, raw: &str) -> FileContent {
    let mut content = frontmatter::decode(raw);
    content.revision_id = Some(hash(raw));
    content.path = Some(path.to_string());
    content
}

fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

#[async_trait]
impl ProviderDriver for MockDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn list_entries(&self, dir: &str) -> Result<Vec<FileInfo>, ProviderError> {
        self.record(MockOperation::ListEntries {
            dir: dir.to_string(),
        });
        self.check_fail("list_entries")?;

        let dir = dir.trim_matches('/');
        let inner = self.lock();
        let mut found_dir = dir.is_empty();
        let mut entries = Vec::new();
        for (path, file) in &inner.files {
            let rest = if dir.is_empty() {
                Some(path.as_str())
            } else {
                path.strip_prefix(dir).and_then(|r| r.strip_prefix('/'))
            };
            let Some(rest) = rest else { continue };
            found_dir = true;
            if !rest.contains('/') {
                entries.push(FileInfo {
                    name: file_name(path).to_string(),
                    path: path.clone(),
                    revision_id: file.revision_id.clone(),
                });
            }
        }
        if !found_dir {
            return Err(ProviderError::NotFound(dir.to_string()));
        }
        Ok(entries)
    }

    async fn get_file(&self, path: &str) -> Result<FileContent, ProviderError> {
        self.record(MockOperation::GetFile {
            path: path.to_string(),
        });
        self.check_fail("get_file")?;

        let inner = self.lock();
        inner
            .files
            .get(path)
            .map(|file| decoded(path, &file.raw))
            .ok_or_else(|| ProviderError::NotFound(path.to_string()))
    }

    async fn get_file_at_revision(
        &self,
        path: &str,
        revision: &str,
    ) -> Result<FileContent, ProviderError> {
        self.record(MockOperation::GetFileAtRevision {
            path: path.to_string(),
            revision: revision.to_string(),
        });
        self.check_fail("get_file_at_revision")?;

        let inner = self.lock();
        inner
            .snapshots
            .get(revision)
            .and_then(|tree| tree.get(path))
            .map(|raw| decoded(path, raw))
            .ok_or_else(|| ProviderError::NotFound(format!("{path}@{revision}")))
    }

    async fn create_file(
        &self,
        path: &str,
        frontmatter: &Frontmatter,
        content: &str,
    ) -> Result<UpdateResult, ProviderError> {
        let raw = frontmatter::encode(frontmatter, content);
        self.record(MockOperation::CreateFile {
            path: path.to_string(),
            raw: raw.clone(),
        });
        self.check_fail("create_file")?;

        let mut inner = self.lock();
        if inner.files.contains_key(path) {
            return Err(ProviderError::AlreadyExists(path.to_string()));
        }
        Ok(inner.write(path, raw, "Create"))
    }

    async fn update_file(
        &self,
        path: &str,
        frontmatter: &Frontmatter,
        content: &str,
        revision_id: &str,
    ) -> Result<UpdateResult, ProviderError> {
        self.record(MockOperation::UpdateFile {
            path: path.to_string(),
            revision_id: revision_id.to_string(),
        });
        self.check_fail("update_file")?;

        let mut inner = self.lock();
        inner.require_revision(path, revision_id)?;
        Ok(inner.write(path, frontmatter::encode(frontmatter, content), "Update"))
    }

    async fn delete_file(
        &self,
        path: &str,
        revision_id: &str,
    ) -> Result<UpdateResult, ProviderError> {
        self.record(MockOperation::DeleteFile {
            path: path.to_string(),
            revision_id: revision_id.to_string(),
        });
        self.check_fail("delete_file")?;

        let mut inner = self.lock();
        inner.require_revision(path, revision_id)?;
        inner.files.remove(path);
        let commit_id = inner.next_commit();
        inner.snapshot(&commit_id);
        inner.push_history(path, &commit_id, format!("Delete {path}"));
        Ok(UpdateResult {
            success: true,
            revision_id: None,
            commit_id: Some(commit_id),
        })
    }

    async fn list_revisions(&self, path: &str) -> Result<Vec<RevisionHistoryEntry>, ProviderError> {
        self.record(MockOperation::ListRevisions {
            path: path.to_string(),
        });
        self.check_fail("list_revisions")?;

        let inner = self.lock();
        Ok(inner
            .history
            .get(path)
            .map(|entries| {
                entries
                    .iter()
                    .rev()
                    .take(HISTORY_PAGE_SIZE)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
