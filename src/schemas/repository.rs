//! schemas::repository
//!
//! The schema/template repository: a cloned working copy with periodic
//! refresh, a shared lookup cache, and a three-tier read fallback.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --initialize()--> Cloning --ok--> Ready --pull--> Ready
//!                                        \--err--> Degraded
//! ```
//!
//! Git mode is active when the repository is enabled, the mode is `git`
//! and a clone URL is configured. Otherwise the state stays
//! `Uninitialized` and reads go to the remote API and the built-in set.
//!
//! # Atomic refresh
//!
//! Every clone lands in a fresh `staging-<uuid>` directory and is checked
//! for a `schemas/` directory before anything else happens. A pull then
//! removes the stale backup, renames `current` to `backup` and the staging
//! copy to `current`, all under the write side of the swap guard, and
//! only then clears the cache. A failure before the first rename deletes
//! the staging copy and leaves the working copy and the cache as they
//! were. Pull failures are logged, never returned.
//!
//! # Reads
//!
//! Each lookup tries, in order: the cache (while valid), the working copy
//! (when `Ready`), the remote API source (when configured), the built-in
//! defaults. Only the last tier's failure reaches the caller.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::cache::{SchemaCache, ALL_TEMPLATES};
use super::remote::RemoteSource;
use super::render::{render_template, validate_values};
use super::types::{CacheStats, GitInfo, RepoState, Schema, SchemaInfo, TemplateInfo, ValidationReport};
use super::{defaults, local};
use crate::core::config::{SchemaRepoSettings, SchemaSourceMode};
use crate::core::errors::AppError;
use crate::core::paths::SchemaRepoPaths;
use crate::forge::{ProviderDriver, ProviderError};
use crate::git::{self, CloneRequest, Cloner};

/// Delay before a replaced working copy is deleted.
pub const BACKUP_GRACE: Duration = Duration::from_secs(5);

/// Git-backed schema and template repository.
pub struct SchemaRepository {
    settings: SchemaRepoSettings,
    paths: SchemaRepoPaths,
    /// The root was generated under the temp dir rather than configured.
    owns_root: bool,
    remote: Option<RemoteSource>,
    cloner: Arc<dyn Cloner>,
    state: Mutex<RepoState>,
    cache: Mutex<SchemaCache>,
    /// Read by working-copy lookups, written by the renames of a swap.
    swap: RwLock<()>,
    /// One pull at a time.
    pulling: tokio::sync::Mutex<()>,
    pull_task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for SchemaRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRepository")
            .field("work_dir", &self.paths.root())
            .field("mode", &self.settings.mode)
            .field("state", &self.state())
            .field("remote", &self.remote)
            .finish()
    }
}

impl SchemaRepository {
    /// Create an uninitialized repository. Nothing is cloned until
    /// [`initialize`](Self::initialize).
    pub fn new(
        settings: SchemaRepoSettings,
        remote: Option<Arc<dyn ProviderDriver>>,
        cloner: Arc<dyn Cloner>,
    ) -> Arc<Self> {
        let owns_root = settings.work_dir.is_none();
        let root = settings.work_dir.clone().unwrap_or_else(|| {
            std::env::temp_dir().join(format!(
                "schema-repo-{}-{}",
                std::process::id(),
                uuid::Uuid::new_v4()
            ))
        });
        Arc::new(SchemaRepository {
            paths: SchemaRepoPaths::new(root),
            owns_root,
            remote: remote.map(RemoteSource::new),
            cloner,
            state: Mutex::new(RepoState::Uninitialized),
            cache: Mutex::new(SchemaCache::default()),
            swap: RwLock::new(()),
            pulling: tokio::sync::Mutex::new(()),
            pull_task: Mutex::new(None),
            settings,
        })
    }

    /// Create and initialize a repository.
    pub async fn open(
        settings: SchemaRepoSettings,
        remote: Option<Arc<dyn ProviderDriver>>,
        cloner: Arc<dyn Cloner>,
    ) -> Arc<Self> {
        let repo = Self::new(settings, remote, cloner);
        repo.initialize().await;
        repo
    }

    /// Whether a working copy is used at all.
    pub fn git_enabled(&self) -> bool {
        self.settings.enabled
            && self.settings.mode == SchemaSourceMode::Git
            && self.git_url().is_some()
    }

    fn git_url(&self) -> Option<&str> {
        self.settings.git_url.as_deref().filter(|u| !u.is_empty())
    }

    pub fn state(&self) -> RepoState {
        *lock(&self.state)
    }

    fn set_state(&self, state: RepoState) {
        *lock(&self.state) = state;
    }

    pub fn work_dir(&self) -> &Path {
        self.paths.root()
    }

    /// Bring up the working copy and start the pull timer.
    ///
    /// A valid copy left in the working directory by an earlier run is
    /// reused. Failures leave the repository `Degraded`; they are not
    /// returned.
    pub async fn initialize(self: &Arc<Self>) -> RepoState {
        if !self.git_enabled() {
            tracing::debug!(mode = %self.settings.mode, "schema repository git mode off");
            return self.state();
        }

        self.set_state(RepoState::Cloning);
        match self.prepare_working_copy().await {
            Ok(()) => {
                self.set_state(RepoState::Ready);
                tracing::info!(path = %self.paths.current().display(), "schema repository ready");
                if self.settings.pull_interval_secs > 0 {
                    self.start_pull_timer();
                }
            }
            Err(err) => {
                self.set_state(RepoState::Degraded);
                tracing::warn!(error = %err, "schema repository unavailable, using remote and built-in schemas");
            }
        }
        self.state()
    }

    async fn prepare_working_copy(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.paths.root()).map_err(|e| io_failure("create work dir", e))?;
        // A clone abandoned by an earlier run can still hold a staging dir.
        for stale in self.paths.staging_dirs() {
            tracing::debug!(path = %stale.display(), "removing stale staging copy");
            remove_quietly(&stale);
        }

        let current = self.paths.current();
        if current.exists() {
            if is_valid_copy(&current) {
                tracing::info!(path = %current.display(), "reusing existing schema working copy");
                return Ok(());
            }
            tracing::warn!(path = %current.display(), "existing working copy invalid, re-cloning");
            fs::remove_dir_all(&current).map_err(|e| io_failure("remove invalid working copy", e))?;
        }

        let staging = self.clone_to_staging().await?;
        let _guard = write(&self.swap);
        fs::rename(&staging, &current).map_err(|e| {
            remove_quietly(&staging);
            io_failure("move clone into place", e)
        })
    }

    /// Clone into a fresh staging directory and check its layout.
    async fn clone_to_staging(&self) -> Result<PathBuf, AppError> {
        let url = self
            .git_url()
            .ok_or_else(|| AppError::schema_repository("no clone URL configured"))?;
        let staging = self.paths.staging();
        let request = CloneRequest {
            url: url.to_string(),
            dest: staging.clone(),
            shallow: self.settings.shallow_clone,
            timeout: Duration::from_secs(self.settings.clone_timeout_secs),
        };

        tracing::info!(url, "cloning schema repository");
        if let Err(err) = self.cloner.clone_repo(&request).await {
            remove_quietly(&staging);
            return Err(AppError::SchemaRepository {
                message: "clone failed".into(),
                source: Some(Box::new(err)),
            });
        }
        if !is_valid_copy(&staging) {
            remove_quietly(&staging);
            return Err(AppError::schema_repository(
                "cloned repository has no schemas directory",
            ));
        }
        Ok(staging)
    }

    /// Fetch a fresh copy and swap it in. Returns whether the working copy
    /// was replaced.
    pub async fn pull_now(&self) -> bool {
        let _pulling = self.pulling.lock().await;
        if !self.git_enabled() {
            return false;
        }

        let staging = match self.clone_to_staging().await {
            Ok(staging) => staging,
            Err(err) => {
                tracing::error!(error = %err, "schema repository pull failed, keeping current copy");
                return false;
            }
        };
        if let Err(err) = self.swap_in(&staging) {
            remove_quietly(&staging);
            tracing::error!(error = %err, "schema repository swap failed, keeping current copy");
            return false;
        }

        self.clear_cache();
        self.set_state(RepoState::Ready);
        tracing::info!("schema repository updated");

        if self.settings.auto_cleanup {
            let backup = self.paths.backup();
            tokio::spawn(async move {
                tokio::time::sleep(BACKUP_GRACE).await;
                if let Err(err) = fs::remove_dir_all(&backup) {
                    if err.kind() != io::ErrorKind::NotFound {
                        tracing::warn!(path = %backup.display(), error = %err, "failed to remove schema backup");
                    }
                }
            });
        }
        true
    }

    fn swap_in(&self, staging: &Path) -> io::Result<()> {
        let _guard = write(&self.swap);
        let current = self.paths.current();
        let backup = self.paths.backup();

        if backup.exists() {
            fs::remove_dir_all(&backup)?;
        }
        if current.exists() {
            fs::rename(&current, &backup)?;
        }
        if let Err(err) = fs::rename(staging, &current) {
            if backup.exists() && !current.exists() {
                let _ = fs::rename(&backup, &current);
            }
            return Err(err);
        }
        Ok(())
    }

    fn start_pull_timer(self: &Arc<Self>) {
        let period = Duration::from_secs(self.settings.pull_interval_secs);
        let weak = Arc::downgrade(self);
        tracing::info!(every_secs = period.as_secs(), "starting periodic schema pulls");

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(repo) = weak.upgrade() else {
                    break;
                };
                repo.pull_now().await;
            }
        });

        if let Some(old) = lock(&self.pull_task).replace(handle) {
            old.abort();
        }
    }

    /// Stop the pull timer and, with auto-cleanup, delete the working
    /// copies.
    ///
    /// A generated work dir is removed entirely. In a configured one only
    /// `current`, `backup` and `staging-*` are removed.
    pub fn destroy(&self) {
        if let Some(task) = lock(&self.pull_task).take() {
            task.abort();
        }
        if self.settings.auto_cleanup {
            let _guard = write(&self.swap);
            if self.owns_root {
                remove_quietly(self.paths.root());
            } else {
                for path in self.paths.owned_entries() {
                    remove_quietly(&path);
                }
            }
        }
        self.clear_cache();
        self.set_state(RepoState::Uninitialized);
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// All schemas. Never fails: the built-in set is the last resort.
    pub async fn get_schemas(&self) -> Vec<SchemaInfo> {
        if let Some(list) = self.cached(SchemaCache::schema_list) {
            return list;
        }

        match self.read_local(local::read_schemas) {
            Some(Ok(schemas)) => return self.remember_schema_list(schemas),
            Some(Err(err)) => tracing::warn!(error = %err, "local schema listing failed"),
            None => {}
        }

        if let Some(remote) = &self.remote {
            match remote.schemas().await {
                Ok(schemas) if !schemas.is_empty() => return self.remember_schema_list(schemas),
                Ok(_) => tracing::debug!(provider = remote.name(), "remote has no schemas"),
                Err(err) => {
                    tracing::warn!(provider = remote.name(), error = %err, "remote schema listing failed")
                }
            }
        }

        defaults::schemas().into_iter().map(|s| s.info).collect()
    }

    /// One schema with its document.
    ///
    /// # Errors
    ///
    /// `Validation` for an unsafe id, `NotFound` when no tier has it.
    pub async fn get_schema(&self, id: &str) -> Result<Schema, AppError> {
        check_segment(id, "schema id")?;
        if let Some(schema) = self.cached(|c| c.schema(id)) {
            return Ok(schema);
        }

        match self.read_local(|copy| local::read_schema(copy, id)) {
            Some(Ok(schema)) => return Ok(self.remember_schema(schema)),
            Some(Err(err)) => tracing::debug!(%id, error = %err, "schema not in working copy"),
            None => {}
        }

        if let Some(remote) = &self.remote {
            match remote.schema(id).await {
                Ok(schema) => return Ok(self.remember_schema(schema)),
                Err(ProviderError::NotFound(_)) => tracing::debug!(%id, "schema not in remote"),
                Err(err) => tracing::warn!(%id, error = %err, "remote schema lookup failed"),
            }
        }

        defaults::schema(id).ok_or_else(|| AppError::not_found("schema", id))
    }

    /// Templates of one schema type, or of all types.
    pub async fn get_templates(&self, schema_type: Option<&str>) -> Result<Vec<TemplateInfo>, AppError> {
        if let Some(ty) = schema_type {
            check_segment(ty, "schema type")?;
        }
        let key = schema_type.unwrap_or(ALL_TEMPLATES);
        if let Some(templates) = self.cached(|c| c.templates(key)) {
            return Ok(templates);
        }

        match self.read_local(|copy| local::read_templates(copy, schema_type)) {
            Some(Ok(templates)) => return Ok(self.remember_templates(key, templates)),
            Some(Err(err)) => tracing::warn!(error = %err, "local template listing failed"),
            None => {}
        }

        if let Some(remote) = &self.remote {
            match remote.templates(schema_type).await {
                Ok(templates) if !templates.is_empty() => {
                    return Ok(self.remember_templates(key, templates))
                }
                Ok(_) => tracing::debug!(provider = remote.name(), "remote has no templates"),
                Err(err) => {
                    tracing::warn!(provider = remote.name(), error = %err, "remote template listing failed")
                }
            }
        }

        Ok(defaults::templates(schema_type))
    }

    /// One template by `{schema_type}/{name}` id. A trailing `.md` on the
    /// name is accepted.
    pub async fn get_template(&self, id: &str) -> Result<TemplateInfo, AppError> {
        let (schema_type, name) = parse_template_id(id)?;
        let id = format!("{schema_type}/{name}");
        if let Some(template) = self.cached(|c| c.template(&id)) {
            return Ok(template);
        }

        if let Some(Ok(Some(template))) =
            self.read_local(|copy| Ok(local::read_template(copy, schema_type, name)))
        {
            return Ok(template);
        }

        if let Some(remote) = &self.remote {
            match remote.template(schema_type, name).await {
                Ok(Some(template)) => return Ok(template),
                Ok(None) => tracing::debug!(%id, "template not in remote"),
                Err(err) => tracing::warn!(%id, error = %err, "remote template lookup failed"),
            }
        }

        defaults::template_by_id(&id).ok_or_else(|| AppError::not_found("template", id))
    }

    /// Render a template with `values`.
    pub async fn render_template(&self, id: &str, values: &Map<String, Value>) -> Result<String, AppError> {
        let template = self.get_template(id).await?;
        Ok(render_template(&template.content, values))
    }

    /// Check `values` against the schema of the template's type.
    pub async fn validate_template_values(
        &self,
        id: &str,
        values: &Map<String, Value>,
    ) -> Result<ValidationReport, AppError> {
        let template = self.get_template(id).await?;
        let schema = self.get_schema(&template.schema_type).await?;
        Ok(validate_values(&schema.info.fields, values))
    }

    // ========================================================================
    // Cache
    // ========================================================================

    pub fn clear_cache(&self) {
        lock(&self.cache).clear();
    }

    pub fn is_cache_valid(&self) -> bool {
        lock(&self.cache).is_valid_at(Instant::now(), self.cache_timeout())
    }

    fn cache_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.cache_timeout_secs)
    }

    pub fn cache_stats(&self) -> CacheStats {
        let (schemas, templates, last_update) = {
            let cache = lock(&self.cache);
            (cache.schema_count(), cache.template_count(), cache.last_update())
        };
        let state = self.state();

        let git = (state == RepoState::Ready).then(|| {
            let _guard = read(&self.swap);
            let current = self.paths.current();
            GitInfo {
                is_git_repo: git::is_git_repo(&current),
                head_commit: git::head_commit(&current).ok().flatten(),
                repo_path: current,
                mode: self.settings.mode,
                pull_interval_secs: self.settings.pull_interval_secs,
            }
        });

        CacheStats {
            schemas,
            templates,
            last_update,
            state,
            git,
        }
    }

    fn cached<T>(&self, get: impl FnOnce(&SchemaCache) -> Option<T>) -> Option<T> {
        let cache = lock(&self.cache);
        if !cache.is_valid_at(Instant::now(), self.cache_timeout()) {
            return None;
        }
        get(&cache)
    }

    fn remember_schema_list(&self, schemas: Vec<Schema>) -> Vec<SchemaInfo> {
        let infos = schemas.iter().map(|s| s.info.clone()).collect();
        lock(&self.cache).store_schema_list(schemas);
        infos
    }

    fn remember_schema(&self, schema: Schema) -> Schema {
        lock(&self.cache).store_schema(schema.clone());
        schema
    }

    fn remember_templates(&self, key: &str, templates: Vec<TemplateInfo>) -> Vec<TemplateInfo> {
        lock(&self.cache).store_templates(key, templates.clone());
        templates
    }

    /// Run a read against the working copy while holding the swap guard.
    /// `None` when there is no usable copy.
    fn read_local<T>(
        &self,
        read_copy: impl FnOnce(&Path) -> Result<T, AppError>,
    ) -> Option<Result<T, AppError>> {
        if self.state() != RepoState::Ready {
            return None;
        }
        let _guard = read(&self.swap);
        Some(read_copy(&self.paths.current()))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read(guard: &RwLock<()>) -> RwLockReadGuard<'_, ()> {
    guard.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(guard: &RwLock<()>) -> RwLockWriteGuard<'_, ()> {
    guard.write().unwrap_or_else(PoisonError::into_inner)
}

fn is_valid_copy(copy: &Path) -> bool {
    SchemaRepoPaths::schemas_dir(copy).is_dir()
}

fn remove_quietly(path: &Path) {
    if let Err(err) = fs::remove_dir_all(path) {
        if err.kind() != io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %err, "failed to remove schema directory");
        }
    }
}

fn io_failure(action: &str, err: io::Error) -> AppError {
    AppError::SchemaRepository {
        message: format!("failed to {action}"),
        source: Some(Box::new(err)),
    }
}

/// Reject ids that could leave their directory.
fn check_segment(value: &str, what: &str) -> Result<(), AppError> {
    if value.is_empty()
        || value.starts_with('.')
        || value.contains(['/', '\\', '\0'])
        || value.contains("..")
    {
        return Err(AppError::Validation(format!("invalid {what} '{value}'")));
    }
    Ok(())
}

fn parse_template_id(id: &str) -> Result<(&str, &str), AppError> {
    let invalid = || {
        AppError::Validation(format!(
            "invalid template id '{id}', expected schemaType/templateName"
        ))
    };
    let (schema_type, name) = id.split_once('/').ok_or_else(invalid)?;
    let name = name.strip_suffix(".md").unwrap_or(name);
    if schema_type.is_empty() || name.is_empty() {
        return Err(invalid());
    }
    check_segment(schema_type, "schema type")?;
    check_segment(name, "template name")?;
    Ok((schema_type, name))
}
