//! git::interface
//!
//! Git interface implementation using git2.
//!
//! # Architecture
//!
//! The schema repository needs three things from Git: clone a remote into a
//! fresh directory, tell whether a directory is a repository, and read the
//! commit a working copy is at. Cloning sits behind the [`Cloner`] trait so
//! the schema repository can be driven by a fixture in tests.
//!
//! # Timeouts
//!
//! git2 clones are blocking. [`Git2Cloner`] runs them on the blocking pool
//! under `tokio::time::timeout`. When the timeout fires a shared flag is
//! raised, the transfer-progress callback sees it and aborts the transfer,
//! and the clone is reported as [`GitError::Timeout`].
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use gitmark::git::{CloneRequest, Cloner, Git2Cloner};
//!
//! Git2Cloner
//!     .clone_repo(&CloneRequest {
//!         url: "https://github.com/acme/schemas.git".into(),
//!         dest: "/tmp/schemas".into(),
//!         shallow: true,
//!         timeout: Duration::from_secs(60),
//!     })
//!     .await?;
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Time allowed for an aborted clone to unwind after a timeout.
const ABORT_GRACE: Duration = Duration::from_secs(5);

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Path is not a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was opened
        path: PathBuf,
    },

    /// The clone failed.
    #[error("clone of {url} failed: {message}")]
    CloneFailed {
        /// Source URL
        url: String,
        /// Description of the failure
        message: String,
    },

    /// The clone did not finish in time and was aborted.
    #[error("clone of {url} timed out after {seconds}s")]
    Timeout {
        /// Source URL
        url: String,
        /// The timeout that elapsed
        seconds: u64,
    },

    /// Internal git2 or runtime error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

/// One clone to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneRequest {
    /// Remote URL or local path of the source repository.
    pub url: String,
    /// Directory to create; must not exist yet.
    pub dest: PathBuf,
    /// Fetch only the tip commit (ignored for local sources).
    pub shallow: bool,
    pub timeout: Duration,
}

/// Produces a fresh working copy of a repository.
#[async_trait]
pub trait Cloner: Send + Sync {
    async fn clone_repo(&self, request: &CloneRequest) -> Result<(), GitError>;
}

/// [`Cloner`] backed by git2.
#[derive(Debug, Clone, Copy, Default)]
pub struct Git2Cloner;

#[async_trait]
impl Cloner for Git2Cloner {
    async fn clone_repo(&self, request: &CloneRequest) -> Result<(), GitError> {
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let url = request.url.clone();
        let dest = request.dest.clone();
        let shallow = request.shallow;

        tracing::debug!(url = %request.url, dest = %request.dest.display(), shallow, "cloning");
        let mut handle =
            tokio::task::spawn_blocking(move || clone_blocking(&url, &dest, shallow, &flag));

        match tokio::time::timeout(request.timeout, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(GitError::Internal {
                message: format!("clone task failed: {join}"),
            }),
            Err(_) => {
                cancel.store(true, Ordering::SeqCst);
                if tokio::time::timeout(ABORT_GRACE, handle).await.is_err() {
                    tracing::warn!(url = %request.url, "timed-out clone did not stop in time");
                }
                Err(GitError::Timeout {
                    url: request.url.clone(),
                    seconds: request.timeout.as_secs(),
                })
            }
        }
    }
}

fn clone_blocking(
    url: &str,
    dest: &Path,
    shallow: bool,
    cancel: &AtomicBool,
) -> Result<(), GitError> {
    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.transfer_progress(|_| !cancel.load(Ordering::SeqCst));

    let mut fetch = git2::FetchOptions::new();
    fetch.remote_callbacks(callbacks);
    // libgit2's local transport does not support shallow fetches.
    if shallow && is_network_url(url) {
        fetch.depth(1);
    }

    git2::build::RepoBuilder::new()
        .fetch_options(fetch)
        .clone(url, dest)
        .map(|_| ())
        .map_err(|e| {
            if cancel.load(Ordering::SeqCst) {
                GitError::CloneFailed {
                    url: url.to_string(),
                    message: "aborted".into(),
                }
            } else {
                GitError::CloneFailed {
                    url: url.to_string(),
                    message: e.message().to_string(),
                }
            }
        })
}

/// Whether a clone URL goes over the network.
///
/// # Example
///
/// ```
/// use gitmark::git::is_network_url;
///
/// assert!(is_network_url("https://github.com/acme/schemas.git"));
/// assert!(is_network_url("git@github.com:acme/schemas.git"));
/// assert!(!is_network_url("/srv/git/schemas"));
/// assert!(!is_network_url("file:///srv/git/schemas"));
/// ```
pub fn is_network_url(url: &str) -> bool {
    if let Some((scheme, _)) = url.split_once("://") {
        return scheme != "file";
    }
    // scp-like syntax: user@host:path
    match url.split_once(':') {
        Some((host, _)) => host.contains('@') && !host.contains('/'),
        None => false,
    }
}

/// Whether `path` is the root of a Git working copy.
pub fn is_git_repo(path: &Path) -> bool {
    git2::Repository::open(path).is_ok()
}

/// Commit id checked out in the working copy at `path`; `None` for an
/// empty repository.
pub fn head_commit(path: &Path) -> Result<Option<String>, GitError> {
    let repo = git2::Repository::open(path).map_err(|_| GitError::NotARepo {
        path: path.to_path_buf(),
    })?;
    let head = match repo.head() {
        Ok(head) => head,
        Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let commit = head.peel_to_commit()?;
    Ok(Some(commit.id().to_string()))
}
