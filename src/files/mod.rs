//! files
//!
//! Document operations: list, read, create, update, delete, move and
//! history, scoped to namespaces.
//!
//! # Architecture
//!
//! [`FileService`] composes a [`ProviderDriver`] with the
//! [`NamespaceResolver`]. It owns three responsibilities and nothing else:
//!
//! 1. **Path resolution**: every caller filename passes path-safety checks
//!    and is placed under its namespace directory before the driver sees it
//! 2. **Error meaning**: driver failures become [`AppError`]s with the
//!    operation and filename that failed
//! 3. **Composition**: listing filters and pagination, revision lookup for
//!    writes without a revision id, and move as create-then-delete
//!
//! The remote repository is the only storage; nothing is written locally.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use gitmark::core::config::NamespaceSettings;
//! use gitmark::files::{CreateFile, FileService};
//! use gitmark::forge::mock::MockDriver;
//! use gitmark::namespace::NamespaceResolver;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let service = FileService::new(
//!     Arc::new(MockDriver::new()),
//!     Arc::new(NamespaceResolver::new(NamespaceSettings::default())),
//! );
//! let created = service
//!     .create(CreateFile {
//!         filename: "foo.bar.md".into(),
//!         namespace: Some("team-x".into()),
//!         content: "# Hi".into(),
//!         ..CreateFile::default()
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(created.path, "team-x/foo.bar.md");
//!
//! let doc = service.get("foo.bar.md", Some("team-x")).await.unwrap();
//! assert_eq!(doc.content, "# Hi");
//! # });
//! ```

mod types;

pub use types::{
    CreateFile, Document, FileItem, ListQuery, MoveOutcome, UpdateFile, WriteOutcome,
    DEFAULT_PAGE_SIZE,
};

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::core::errors::AppError;
use crate::core::naming;
use crate::core::types::{FileContent, FileInfo, RevisionHistoryEntry};
use crate::forge::{ProviderDriver, ProviderError};
use crate::namespace::{NamespaceContext, NamespaceResolver};
use crate::schemas::SchemaRepository;

/// Resource name used in not-found errors.
const FILE: &str = "file";

/// Document operations over one provider repository.
pub struct FileService {
    driver: Arc<dyn ProviderDriver>,
    namespaces: Arc<NamespaceResolver>,
}

impl std::fmt::Debug for FileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileService")
            .field("driver", &self.driver.name())
            .field("namespaces", &self.namespaces)
            .finish()
    }
}

impl FileService {
    pub fn new(driver: Arc<dyn ProviderDriver>, namespaces: Arc<NamespaceResolver>) -> Self {
        Self { driver, namespaces }
    }

    pub fn driver(&self) -> &Arc<dyn ProviderDriver> {
        &self.driver
    }

    pub fn namespaces(&self) -> &NamespaceResolver {
        &self.namespaces
    }

    /// List documents.
    ///
    /// A non-empty `scope` lists inside those namespace directories.
    /// Otherwise only shared files (at the root) are listed. The default
    /// namespace in a scope stands for the root, where its files are
    /// stored.
    pub async fn list(
        &self,
        query: &ListQuery,
        scope: Option<&[String]>,
    ) -> Result<Vec<FileItem>, AppError> {
        let listed = match scope {
            Some(namespaces) if !namespaces.is_empty() => self.list_scope(namespaces).await,
            _ => self.list_root().await,
        };
        let files = match listed {
            Ok(files) => files,
            Err(ProviderError::NotFound(message)) => {
                tracing::debug!(%message, "document root missing, listing nothing");
                Vec::new()
            }
            Err(err) => return Err(file_operation("list", "all files", err)),
        };

        let items = files.into_iter().map(|f| self.to_item(f));
        Ok(filter_and_paginate(items, query))
    }

    async fn list_root(&self) -> Result<Vec<FileInfo>, ProviderError> {
        let files = self.driver.list_files().await?;
        Ok(files.into_iter().filter(|f| !f.path.contains('/')).collect())
    }

    async fn list_scope(&self, namespaces: &[String]) -> Result<Vec<FileInfo>, ProviderError> {
        let default = self.namespaces.default_namespace();
        let mut files = Vec::new();
        for namespace in namespaces {
            if namespace == default {
                match self.list_root().await {
                    Ok(root) => files.extend(root),
                    Err(ProviderError::NotFound(_)) => {}
                    Err(err) => return Err(err),
                }
            } else {
                let listed = self
                    .driver
                    .list_files_under_namespaces(std::slice::from_ref(namespace))
                    .await?;
                files.extend(listed);
            }
        }
        Ok(files)
    }

    /// List what the caller may see: its namespaces when it is
    /// authenticated and separation is enabled, shared files otherwise.
    pub async fn list_for(
        &self,
        query: &ListQuery,
        ctx: &NamespaceContext,
    ) -> Result<Vec<FileItem>, AppError> {
        if self.namespaces.is_enabled() && !ctx.is_anonymous() {
            self.list(query, Some(&ctx.available_namespaces)).await
        } else {
            self.list(query, None).await
        }
    }

    fn to_item(&self, file: FileInfo) -> FileItem {
        let namespace = match file.path.split_once('/') {
            Some((namespace, _)) => namespace.to_string(),
            None => self.namespaces.default_namespace().to_string(),
        };
        FileItem {
            display_name: naming::display_name(&file.name),
            schema_type: naming::schema_type(&file.name),
            is_valid_format: naming::is_valid_filename_format(&file.name),
            name: file.name,
            path: file.path,
            revision_id: file.revision_id,
            namespace,
        }
    }

    /// Read a document at the head of the branch.
    pub async fn get(&self, filename: &str, namespace: Option<&str>) -> Result<Document, AppError> {
        let path = self.namespaces.storage_path(filename, namespace)?;
        let content = self
            .driver
            .get_file(&path)
            .await
            .map_err(|e| map_error("get", filename, e))?;
        Ok(self.document(filename, path, namespace, content))
    }

    /// Read a document as of a commit.
    pub async fn get_at_revision(
        &self,
        filename: &str,
        revision: &str,
        namespace: Option<&str>,
    ) -> Result<Document, AppError> {
        let path = self.namespaces.storage_path(filename, namespace)?;
        let mut content = self
            .driver
            .get_file_at_revision(&path, revision)
            .await
            .map_err(|e| map_error("version", filename, e))?;
        if content.revision_id.is_none() {
            content.revision_id = Some(revision.to_string());
        }
        Ok(self.document(filename, path, namespace, content))
    }

    fn document(
        &self,
        filename: &str,
        path: String,
        namespace: Option<&str>,
        content: FileContent,
    ) -> Document {
        Document {
            name: filename.to_string(),
            path,
            namespace: namespace
                .filter(|ns| !ns.is_empty())
                .unwrap_or(self.namespaces.default_namespace())
                .to_string(),
            revision_id: content.revision_id,
            frontmatter: content.frontmatter,
            content: content.content,
        }
    }

    /// Create a document.
    ///
    /// # Errors
    ///
    /// `Validation` when the name is unsafe, not markdown, or taken.
    pub async fn create(&self, request: CreateFile) -> Result<WriteOutcome, AppError> {
        require_markdown(&request.filename)?;
        let path = self
            .namespaces
            .storage_path(&request.filename, request.namespace.as_deref())?;

        let result = self
            .driver
            .create_file(&path, &request.frontmatter, &request.content)
            .await
            .map_err(|e| map_error("create", &request.filename, e))?;
        tracing::info!(%path, revision = ?result.revision_id, "created document");
        Ok(WriteOutcome {
            path,
            revision_id: result.revision_id,
            commit_id: result.commit_id,
        })
    }

    /// Create a document whose body is rendered from a template.
    ///
    /// The values are checked against the template's schema first; any
    /// content already in `request` is replaced by the rendered body.
    ///
    /// # Errors
    ///
    /// `Validation` listing every failed check, plus the errors of
    /// [`create`](Self::create) and of the template lookup.
    pub async fn create_from_template(
        &self,
        schemas: &SchemaRepository,
        template_id: &str,
        values: &Map<String, Value>,
        mut request: CreateFile,
    ) -> Result<WriteOutcome, AppError> {
        let report = schemas.validate_template_values(template_id, values).await?;
        if !report.valid {
            return Err(AppError::Validation(format!(
                "template values rejected: {}",
                report.errors.join(", ")
            )));
        }
        request.content = schemas.render_template(template_id, values).await?;
        tracing::debug!(template = %template_id, filename = %request.filename, "creating from template");
        self.create(request).await
    }

    /// Replace a document's frontmatter and content.
    ///
    /// # Errors
    ///
    /// `Conflict` when the revision id is stale.
    pub async fn update(
        &self,
        filename: &str,
        request: UpdateFile,
        namespace: Option<&str>,
    ) -> Result<WriteOutcome, AppError> {
        let path = self.namespaces.storage_path(filename, namespace)?;
        let revision = match request.revision_id {
            Some(revision) => revision,
            None => self.current_revision("update", filename, &path).await?,
        };

        let result = self
            .driver
            .update_file(&path, &request.frontmatter, &request.content, &revision)
            .await
            .map_err(|e| map_error("update", filename, e))?;
        tracing::info!(%path, revision = ?result.revision_id, "updated document");
        Ok(WriteOutcome {
            path,
            revision_id: result.revision_id,
            commit_id: result.commit_id,
        })
    }

    /// Delete a document.
    pub async fn delete(
        &self,
        filename: &str,
        revision_id: Option<&str>,
        namespace: Option<&str>,
    ) -> Result<WriteOutcome, AppError> {
        let path = self.namespaces.storage_path(filename, namespace)?;
        let revision = match revision_id {
            Some(revision) => revision.to_string(),
            None => self.current_revision("delete", filename, &path).await?,
        };

        let result = self
            .driver
            .delete_file(&path, &revision)
            .await
            .map_err(|e| map_error("delete", filename, e))?;
        tracing::info!(%path, "deleted document");
        Ok(WriteOutcome {
            path,
            revision_id: None,
            commit_id: result.commit_id,
        })
    }

    async fn current_revision(
        &self,
        operation: &'static str,
        filename: &str,
        path: &str,
    ) -> Result<String, AppError> {
        let current = self
            .driver
            .get_file(path)
            .await
            .map_err(|e| map_error(operation, filename, e))?;
        current.revision_id.ok_or_else(|| AppError::FileOperation {
            operation,
            filename: filename.to_string(),
            source: "provider returned no revision id".into(),
        })
    }

    /// Rename a document, within its namespace or into `target_namespace`.
    ///
    /// Creates the target, then deletes the source. When the delete fails
    /// the new file is removed again and the error is returned.
    ///
    /// # Errors
    ///
    /// `NotFound` when the source is missing, `Conflict` when the target
    /// exists.
    pub async fn move_file(
        &self,
        filename: &str,
        new_filename: &str,
        namespace: Option<&str>,
        target_namespace: Option<&str>,
    ) -> Result<MoveOutcome, AppError> {
        require_markdown(new_filename)?;
        let old_path = self.namespaces.storage_path(filename, namespace)?;
        let new_path = self
            .namespaces
            .storage_path(new_filename, target_namespace.or(namespace))?;
        if old_path == new_path {
            return Err(AppError::Validation(format!(
                "source and target are the same: '{old_path}'"
            )));
        }

        let source = self
            .driver
            .get_file(&old_path)
            .await
            .map_err(|e| map_error("move", filename, e))?;
        let Some(source_revision) = source.revision_id.clone() else {
            return Err(AppError::FileOperation {
                operation: "move",
                filename: filename.to_string(),
                source: "provider returned no revision id".into(),
            });
        };

        match self.driver.get_file(&new_path).await {
            Ok(_) => return Err(target_exists(new_filename)),
            Err(ProviderError::NotFound(_)) => {}
            Err(err) => return Err(map_error("move", filename, err)),
        }

        let created = self
            .driver
            .create_file(&new_path, &source.frontmatter, &source.content)
            .await
            .map_err(|e| match e {
                ProviderError::AlreadyExists(_) => target_exists(new_filename),
                other => map_error("move", filename, other),
            })?;

        let deleted = match self.driver.delete_file(&old_path, &source_revision).await {
            Ok(deleted) => deleted,
            Err(err) => {
                self.roll_back_create(&new_path, created.revision_id.as_deref()).await;
                return Err(map_error("move", filename, err));
            }
        };

        tracing::info!(%old_path, %new_path, "moved document");
        Ok(MoveOutcome {
            old_path,
            new_path,
            revision_id: created.revision_id,
            commit_id: deleted.commit_id,
        })
    }

    async fn roll_back_create(&self, path: &str, revision_id: Option<&str>) {
        let Some(revision_id) = revision_id else {
            tracing::warn!(%path, "cannot roll back move target without a revision id");
            return;
        };
        if let Err(err) = self.driver.delete_file(path, revision_id).await {
            tracing::warn!(%path, error = %err, "failed to roll back move target");
        }
    }

    /// Commits touching a document, newest first, at most `limit`.
    pub async fn history(
        &self,
        filename: &str,
        limit: usize,
        namespace: Option<&str>,
    ) -> Result<Vec<RevisionHistoryEntry>, AppError> {
        let path = self.namespaces.storage_path(filename, namespace)?;
        let mut entries = self
            .driver
            .list_revisions(&path)
            .await
            .map_err(|e| map_error("history", filename, e))?;
        entries.truncate(limit);
        Ok(entries)
    }
}

fn filter_and_paginate(items: impl Iterator<Item = FileItem>, query: &ListQuery) -> Vec<FileItem> {
    let search = query
        .search
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);
    let schema_type = query.schema_type.as_deref().filter(|s| !s.is_empty());

    items
        .filter(|item| match &search {
            Some(term) => {
                item.name.to_lowercase().contains(term)
                    || item.display_name.to_lowercase().contains(term)
                    || item
                        .schema_type
                        .as_deref()
                        .is_some_and(|t| t.to_lowercase().contains(term))
            }
            None => true,
        })
        .filter(|item| match schema_type {
            Some(wanted) => item.schema_type.as_deref() == Some(wanted),
            None => true,
        })
        .skip((query.page() - 1).saturating_mul(query.limit()))
        .take(query.limit())
        .collect()
}

fn require_markdown(filename: &str) -> Result<(), AppError> {
    if naming::is_markdown(filename) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "filename must end in {}: '{filename}'",
            naming::MARKDOWN_SUFFIX
        )))
    }
}

fn target_exists(filename: &str) -> AppError {
    AppError::Conflict(format!("target file already exists: {filename}"))
}

fn file_operation(operation: &'static str, filename: &str, err: ProviderError) -> AppError {
    AppError::FileOperation {
        operation,
        filename: filename.to_string(),
        source: Box::new(err),
    }
}

/// What a driver failure means for a document operation.
fn map_error(operation: &'static str, filename: &str, err: ProviderError) -> AppError {
    match err {
        ProviderError::NotFound(_) => AppError::not_found(FILE, filename),
        ProviderError::AlreadyExists(_) => {
            AppError::Validation(format!("file already exists: {filename}"))
        }
        ProviderError::Conflict(message) => {
            AppError::Conflict(format!("{filename} was changed concurrently: {message}"))
        }
        other => file_operation(operation, filename, other),
    }
}
