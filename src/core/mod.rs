//! core
//!
//! Core domain types shared by every other module.
//!
//! # Modules
//!
//! - [`types`] - Documents, revisions and write results
//! - [`frontmatter`] - Frontmatter header codec
//! - [`naming`] - `{display}.{schema_type}.md` filename convention
//! - [`paths`] - Path safety and schema working-directory layout
//! - [`errors`] - Application error taxonomy
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Nothing here performs network or git I/O
//! - Decoding is total: malformed input degrades, it does not fail

pub mod config;
pub mod errors;
pub mod frontmatter;
pub mod naming;
pub mod paths;
pub mod types;
