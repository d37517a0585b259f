//! forge
//!
//! Abstraction over Git hosting providers (GitHub, GitLab, Gitea).
//!
//! # Architecture
//!
//! The `ProviderDriver` trait defines how documents are read and written
//! in a hosted repository. Services use the [`create_driver`] factory
//! rather than importing specific drivers directly.
//!
//! - Drivers translate one provider's REST API; they do not know about
//!   namespaces or filenames conventions.
//! - Driver failures are `ProviderError`s; the file service maps them.
//!
//! # Modules
//!
//! - `traits`: `ProviderDriver` trait and `ProviderError`
//! - `http`: transport shared by the REST drivers
//! - [`github`], [`gitlab`], [`gitea`]: provider drivers
//! - [`mock`]: in-memory driver for deterministic testing
//! - `factory`: platform selection and driver creation

mod factory;
pub mod gitea;
pub mod github;
pub mod gitlab;
mod http;
pub mod mock;
mod traits;

pub use factory::{create_driver, valid_platform_names, Platform};
pub use traits::*;
