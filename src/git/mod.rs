//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to git2. No other module imports
//! it. Documents are never read from a local clone; Git is used only to
//! fetch the schema/template repository.
//!
//! # Responsibilities
//!
//! - Cloning a repository into a fresh directory, bounded by a timeout
//! - Detecting whether a directory is a working copy
//! - Reading the checked-out commit of a working copy
//!
//! # Invariants
//!
//! - A clone either completes or reports an error; callers clone into a
//!   staging directory and only rename it into place on success
//! - No other module calls git2 directly

mod interface;

pub use interface::{
    head_commit, is_git_repo, is_network_url, CloneRequest, Cloner, Git2Cloner, GitError,
};
