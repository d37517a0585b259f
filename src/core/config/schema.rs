//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Example
//!
//! ```toml
//! [provider]
//! platform = "github"
//! token = "ghp_xxx"
//! owner = "acme"
//! repo = "handbook"
//! path = "docs"
//!
//! [namespaces]
//! enabled = true
//! user_claim = "preferred_username"
//!
//! [schema_repo]
//! enabled = true
//! mode = "git"
//! git_url = "https://github.com/acme/schemas.git"
//! pull_interval_secs = 300
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! # Validation
//!
//! Values are validated after parsing and after environment overrides,
//! so a bad `GIT_PROVIDER` is reported the same way as a bad file value.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Log levels accepted by `logging.level`.
pub const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Full configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Hosting provider that stores the documents.
    pub provider: ProviderConfig,
    pub namespaces: NamespaceSettings,
    pub schema_repo: SchemaRepoSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.provider.validate_platform()?;
        self.namespaces.validate()?;
        self.schema_repo.validate()?;

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue(format!(
                "invalid log level '{}', must be one of: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}

/// Connection settings for one hosting provider repository.
///
/// `owner` holds the GitLab project id (numeric or `group/project`) when
/// `repo` is empty.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// `github`, `gitlab` or `gitea`.
    pub platform: String,
    pub token: String,
    pub owner: String,
    pub repo: String,
    /// Root directory inside the repository; empty means the repository root.
    pub path: String,
    /// API or instance URL override (GitHub Enterprise, self-hosted GitLab/Gitea).
    pub base_url: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            platform: "github".to_string(),
            token: String::new(),
            owner: String::new(),
            repo: String::new(),
            path: String::new(),
            base_url: None,
        }
    }
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("platform", &self.platform)
            .field("has_token", &!self.token.is_empty())
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("path", &self.path)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ProviderConfig {
    /// Check that the platform names a supported provider.
    pub fn validate_platform(&self) -> Result<(), ConfigError> {
        let valid = crate::forge::valid_platform_names();
        if !valid.contains(&self.platform.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue(format!(
                "invalid platform '{}', must be one of: {}",
                self.platform,
                valid.join(", ")
            )));
        }
        Ok(())
    }

    /// Check that the settings needed to talk to the provider are present.
    ///
    /// Only checked when a driver is actually built, so commands that never
    /// touch documents run without credentials.
    pub fn validate_credentials(&self) -> Result<(), ConfigError> {
        if self.token.is_empty() {
            return Err(ConfigError::InvalidValue(format!(
                "{} token is required",
                self.platform
            )));
        }
        if self.owner.is_empty() {
            return Err(ConfigError::InvalidValue(format!(
                "{} owner (or project id) is required",
                self.platform
            )));
        }
        if self.repo.is_empty() && !self.platform.eq_ignore_ascii_case("gitlab") {
            return Err(ConfigError::InvalidValue(format!(
                "{} repo is required",
                self.platform
            )));
        }
        Ok(())
    }
}

/// Namespace partitioning settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct NamespaceSettings {
    pub enabled: bool,
    /// Identity claim naming the user's own namespace.
    pub user_claim: String,
    /// Identity claim listing group namespaces.
    pub groups_claim: String,
    /// Namespace of files at the repository root.
    pub default_namespace: String,
}

impl Default for NamespaceSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            user_claim: "sub".to_string(),
            groups_claim: "groups".to_string(),
            default_namespace: "shared".to_string(),
        }
    }
}

impl NamespaceSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        let ns = &self.default_namespace;
        if ns.is_empty() || ns.contains('/') || ns.contains("..") {
            return Err(ConfigError::InvalidValue(format!(
                "invalid default namespace '{ns}'"
            )));
        }
        Ok(())
    }
}

/// Where schema and template definitions come from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SchemaSourceMode {
    /// Clone `git_url` and read the working copy.
    #[default]
    Git,
    /// Read through a provider API (`schema_repo.api`).
    Api,
}

impl std::fmt::Display for SchemaSourceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaSourceMode::Git => write!(f, "git"),
            SchemaSourceMode::Api => write!(f, "api"),
        }
    }
}

/// Schema/template repository settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaRepoSettings {
    pub enabled: bool,
    pub mode: SchemaSourceMode,
    /// Clone URL for `git` mode.
    pub git_url: Option<String>,
    /// Working directory; a fresh temp directory when unset.
    pub work_dir: Option<PathBuf>,
    pub shallow_clone: bool,
    /// Remove the working directory on shutdown and old backups after a swap.
    pub auto_cleanup: bool,
    /// Seconds between pulls; 0 disables periodic pulls.
    pub pull_interval_secs: u64,
    /// Seconds a cached lookup stays valid.
    pub cache_timeout_secs: u64,
    /// Upper bound on one clone.
    pub clone_timeout_secs: u64,
    /// Provider repository read in `api` mode, and as a fallback in `git` mode.
    pub api: Option<ProviderConfig>,
}

impl Default for SchemaRepoSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: SchemaSourceMode::Git,
            git_url: None,
            work_dir: None,
            shallow_clone: true,
            auto_cleanup: true,
            pull_interval_secs: 300,
            cache_timeout_secs: 300,
            clone_timeout_secs: 60,
            api: None,
        }
    }
}

impl SchemaRepoSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "schema_repo.cache_timeout_secs must be at least 1".into(),
            ));
        }
        if self.clone_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "schema_repo.clone_timeout_secs must be at least 1".into(),
            ));
        }
        if let Some(api) = &self.api {
            api.validate_platform()?;
        }
        if !self.enabled {
            return Ok(());
        }
        match self.mode {
            SchemaSourceMode::Git if self.git_url.as_deref().unwrap_or("").is_empty() => Err(
                ConfigError::InvalidValue("schema_repo.git_url is required in git mode".into()),
            ),
            SchemaSourceMode::Api if self.api.is_none() => Err(ConfigError::InvalidValue(
                "schema_repo.api is required in api mode".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
