//! schemas
//!
//! Schema and template definitions served from a separately cloned Git
//! repository.
//!
//! # Layout
//!
//! ```text
//! schemas/<id>.json                    schema documents
//! templates/<schema_type>/<name>.md    frontmatter + body with {{placeholders}}
//! ```
//!
//! # Modules
//!
//! - [`SchemaRepository`] - working copy lifecycle, atomic refresh, read fallback
//! - `cache` - lookup cache with a single expiry timestamp
//! - `local` / `remote` - the working-copy and provider-API sources
//! - `defaults` - built-in schemas and templates
//! - [`render_template`] / [`validate_values`] - placeholder substitution and
//!   value checks
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gitmark::core::config::SchemaRepoSettings;
//! use gitmark::git::Git2Cloner;
//! use gitmark::schemas::SchemaRepository;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let settings = SchemaRepoSettings {
//!     enabled: true,
//!     git_url: Some("https://github.com/acme/schemas.git".into()),
//!     ..SchemaRepoSettings::default()
//! };
//! let repo = SchemaRepository::open(settings, None, Arc::new(Git2Cloner)).await;
//! for schema in repo.get_schemas().await {
//!     println!("{} - {}", schema.id, schema.title);
//! }
//! repo.destroy();
//! # });
//! ```

mod cache;
mod defaults;
mod local;
mod remote;
mod render;
mod repository;
mod types;

pub use cache::ALL_TEMPLATES;
pub use render::{render_template, validate_values};
pub use repository::{SchemaRepository, BACKUP_GRACE};
pub use types::{
    CacheStats, GitInfo, RepoState, Schema, SchemaField, SchemaInfo, TemplateInfo,
    ValidationReport,
};
