//! gitmark - Markdown documents stored in hosted Git repositories
//!
//! gitmark reads and writes Markdown files with a frontmatter header in a
//! GitHub, GitLab or Gitea repository through the provider's REST API. Files
//! are grouped into per-user and per-group namespace directories, and
//! documents can be created from templates that a separate schema repository
//! provides.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to services)
//! - [`files`] - Document operations scoped to namespaces
//! - [`schemas`] - Schema/template repository with cache and fallbacks
//! - [`namespace`] - Maps caller identity to namespace directories
//! - [`forge`] - Provider drivers (GitHub, GitLab, Gitea, in-memory mock)
//! - [`git`] - Single interface for all Git operations
//! - [`auth`] - Caller identity capability
//! - [`core`] - Domain types, frontmatter codec, configuration, errors
//!
//! # Invariants
//!
//! 1. Every write carries the revision it was based on; stale writes conflict
//! 2. A caller filename never escapes its namespace directory
//! 3. A failed schema refresh leaves the previous working copy in service

pub mod auth;
pub mod cli;
pub mod core;
pub mod files;
pub mod forge;
pub mod git;
pub mod namespace;
pub mod schemas;
