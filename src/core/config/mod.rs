//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment variables (`GIT_PROVIDER`, `GITHUB_TOKEN`, ...)
//! 4. CLI flags (not handled here)
//!
//! # Config File Locations
//!
//! Searched in order:
//! 1. The explicit path passed to [`Config::load`] (must exist)
//! 2. `$GITMARK_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/gitmark/config.toml`
//! 4. `~/.gitmark/config.toml`
//!
//! A missing file is not an error: deployments that configure everything
//! through the environment need no file at all.
//!
//! # Example
//!
//! ```no_run
//! use gitmark::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("platform: {}", config.settings.provider.platform);
//! println!("namespaces: {}", config.settings.namespaces.enabled);
//! ```

pub mod schema;

pub use schema::{
    LoggingSettings, NamespaceSettings, ProviderConfig, SchemaRepoSettings, SchemaSourceMode,
    Settings,
};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("config file not found: '{0}'")]
    NotFound(PathBuf),

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings: Settings,
    /// Path to the config file (if one was loaded)
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the standard locations and the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or
    /// parsed, if an explicit path does not exist, or if the merged values
    /// fail validation.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_config_file(),
        };
        Self::load_with(path.as_deref(), |key| std::env::var(key).ok())
    }

    /// Load from an optional file with a custom environment lookup.
    pub fn load_with<F>(path: Option<&Path>, env: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match path {
            Some(path) => Self::read_settings(path)?,
            None => Settings::default(),
        };
        apply_env_overrides(&mut settings, env)?;
        settings.validate()?;

        Ok(Config {
            settings,
            loaded_from: path.map(Path::to_path_buf),
        })
    }

    fn find_config_file() -> Option<PathBuf> {
        // 1. Check $GITMARK_CONFIG
        if let Ok(path) = std::env::var("GITMARK_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/gitmark/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("gitmark/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.gitmark/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".gitmark/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Read and parse a config file.
    fn read_settings(path: &Path) -> Result<Settings, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}

/// Apply the deployment environment variables on top of file settings.
fn apply_env_overrides<F>(settings: &mut Settings, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let provider = &mut settings.provider;
    if let Some(platform) = env("GIT_PROVIDER") {
        provider.platform = platform.to_lowercase();
    }
    match provider.platform.as_str() {
        "github" => {
            set_string(&mut provider.token, env("GITHUB_TOKEN"));
            set_string(&mut provider.owner, env("GITHUB_OWNER"));
            set_string(&mut provider.repo, env("GITHUB_REPO"));
            set_option(&mut provider.base_url, env("GITHUB_BASE_URL"));
        }
        "gitlab" => {
            set_string(&mut provider.token, env("GITLAB_TOKEN"));
            if let Some(project) = env("GITLAB_PROJECT_ID") {
                provider.owner = project;
                provider.repo.clear();
            }
            set_option(&mut provider.base_url, env("GITLAB_URL"));
        }
        "gitea" => {
            set_string(&mut provider.token, env("GITEA_TOKEN"));
            set_string(&mut provider.owner, env("GITEA_OWNER"));
            set_string(&mut provider.repo, env("GITEA_REPO"));
            set_option(&mut provider.base_url, env("GITEA_URL"));
        }
        _ => {}
    }
    set_string(&mut provider.path, env("GIT_PATH"));

    let namespaces = &mut settings.namespaces;
    set_bool(&mut namespaces.enabled, "NAMESPACE_ENABLED", env("NAMESPACE_ENABLED"))?;
    set_string(&mut namespaces.user_claim, env("NAMESPACE_USER_CLAIM"));
    set_string(&mut namespaces.groups_claim, env("NAMESPACE_GROUPS_CLAIM"));
    set_string(&mut namespaces.default_namespace, env("DEFAULT_NAMESPACE"));

    let repo = &mut settings.schema_repo;
    set_bool(&mut repo.enabled, "SCHEMA_REPO_ENABLED", env("SCHEMA_REPO_ENABLED"))?;
    if let Some(mode) = env("SCHEMA_REPO_TYPE") {
        repo.mode = match mode.to_lowercase().as_str() {
            "git" => SchemaSourceMode::Git,
            "api" => SchemaSourceMode::Api,
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "SCHEMA_REPO_TYPE must be 'git' or 'api', got '{other}'"
                )))
            }
        };
    }
    set_option(&mut repo.git_url, env("SCHEMA_REPO_URL"));
    set_u64(&mut repo.pull_interval_secs, "SCHEMA_PULL_INTERVAL", env("SCHEMA_PULL_INTERVAL"))?;
    set_u64(&mut repo.cache_timeout_secs, "SCHEMA_CACHE_TIMEOUT", env("SCHEMA_CACHE_TIMEOUT"))?;
    set_bool(&mut repo.shallow_clone, "SCHEMA_SHALLOW_CLONE", env("SCHEMA_SHALLOW_CLONE"))?;
    set_bool(&mut repo.auto_cleanup, "SCHEMA_AUTO_CLEANUP", env("SCHEMA_AUTO_CLEANUP"))?;

    let api_keys = [
        "SCHEMA_GIT_PLATFORM",
        "SCHEMA_GIT_TOKEN",
        "SCHEMA_GIT_OWNER",
        "SCHEMA_GIT_REPO",
        "SCHEMA_GIT_BASE_URL",
    ];
    if api_keys.iter().any(|key| env(key).is_some()) {
        let api = repo.api.get_or_insert_with(ProviderConfig::default);
        if let Some(platform) = env("SCHEMA_GIT_PLATFORM") {
            api.platform = platform.to_lowercase();
        }
        set_string(&mut api.token, env("SCHEMA_GIT_TOKEN"));
        set_string(&mut api.owner, env("SCHEMA_GIT_OWNER"));
        set_string(&mut api.repo, env("SCHEMA_GIT_REPO"));
        set_option(&mut api.base_url, env("SCHEMA_GIT_BASE_URL"));
    }

    set_string(&mut settings.logging.level, env("LOG_LEVEL").map(|l| l.to_lowercase()));

    Ok(())
}

fn set_string(target: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn set_option(target: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        *target = Some(value);
    }
}

fn set_bool(target: &mut bool, key: &str, value: Option<String>) -> Result<(), ConfigError> {
    if let Some(value) = value {
        *target = match value.to_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" | "" => false,
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "{key} must be a boolean, got '{other}'"
                )))
            }
        };
    }
    Ok(())
}

fn set_u64(target: &mut u64, key: &str, value: Option<String>) -> Result<(), ConfigError> {
    if let Some(value) = value {
        *target = value.trim().parse().map_err(|_| {
            ConfigError::InvalidValue(format!("{key} must be a whole number, got '{value}'"))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn load_empty_defaults() {
        let config = Config::load_with(None, env_from(&[])).unwrap();
        assert_eq!(config.settings.provider.platform, "github");
        assert!(!config.settings.namespaces.enabled);
        assert_eq!(config.settings.namespaces.default_namespace, "shared");
        assert_eq!(config.settings.schema_repo.cache_timeout_secs, 300);
        assert!(config.loaded_from().is_none());
    }

    #[test]
    fn load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [provider]
            platform = "gitlab"
            token = "glpat"
            owner = "group/project"

            [logging]
            level = "warn"
            "#,
        )
        .unwrap();

        let config = Config::load_with(Some(&path), env_from(&[])).unwrap();
        assert_eq!(config.settings.provider.platform, "gitlab");
        assert_eq!(config.settings.provider.owner, "group/project");
        assert_eq!(config.settings.logging.level, "warn");
        assert_eq!(config.loaded_from(), Some(path.as_path()));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");
        let result = Config::load(Some(&missing));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn unparseable_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[provider\nplatform = ").unwrap();
        let result = Config::load_with(Some(&path), env_from(&[]));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn env_overrides_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[provider]\nplatform = \"github\"\nowner = \"file-owner\"\n").unwrap();

        let config = Config::load_with(
            Some(&path),
            env_from(&[
                ("GITHUB_OWNER", "env-owner"),
                ("GITHUB_TOKEN", "ghp"),
                ("GIT_PATH", "docs"),
            ]),
        )
        .unwrap();
        assert_eq!(config.settings.provider.owner, "env-owner");
        assert_eq!(config.settings.provider.token, "ghp");
        assert_eq!(config.settings.provider.path, "docs");
    }

    #[test]
    fn gitlab_project_id_maps_to_owner() {
        let config = Config::load_with(
            None,
            env_from(&[
                ("GIT_PROVIDER", "gitlab"),
                ("GITLAB_TOKEN", "t"),
                ("GITLAB_PROJECT_ID", "4242"),
                ("GITLAB_URL", "https://gitlab.acme.dev"),
            ]),
        )
        .unwrap();
        let provider = &config.settings.provider;
        assert_eq!(provider.platform, "gitlab");
        assert_eq!(provider.owner, "4242");
        assert!(provider.repo.is_empty());
        assert_eq!(provider.base_url.as_deref(), Some("https://gitlab.acme.dev"));
    }

    #[test]
    fn unknown_provider_from_env_rejected() {
        let result = Config::load_with(None, env_from(&[("GIT_PROVIDER", "svn")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn namespace_and_schema_env() {
        let config = Config::load_with(
            None,
            env_from(&[
                ("NAMESPACE_ENABLED", "true"),
                ("NAMESPACE_USER_CLAIM", "email"),
                ("DEFAULT_NAMESPACE", "common"),
                ("SCHEMA_REPO_ENABLED", "true"),
                ("SCHEMA_REPO_URL", "https://example.com/schemas.git"),
                ("SCHEMA_PULL_INTERVAL", "60"),
                ("SCHEMA_SHALLOW_CLONE", "false"),
            ]),
        )
        .unwrap();
        let s = &config.settings;
        assert!(s.namespaces.enabled);
        assert_eq!(s.namespaces.user_claim, "email");
        assert_eq!(s.namespaces.default_namespace, "common");
        assert!(s.schema_repo.enabled);
        assert_eq!(s.schema_repo.pull_interval_secs, 60);
        assert!(!s.schema_repo.shallow_clone);
    }

    #[test]
    fn schema_api_env_builds_api_section() {
        let config = Config::load_with(
            None,
            env_from(&[
                ("SCHEMA_REPO_TYPE", "api"),
                ("SCHEMA_REPO_ENABLED", "true"),
                ("SCHEMA_GIT_PLATFORM", "gitea"),
                ("SCHEMA_GIT_OWNER", "acme"),
                ("SCHEMA_GIT_REPO", "schemas"),
            ]),
        )
        .unwrap();
        let api = config.settings.schema_repo.api.unwrap();
        assert_eq!(api.platform, "gitea");
        assert_eq!(api.owner, "acme");
    }

    #[test]
    fn malformed_numbers_and_bools_rejected() {
        assert!(Config::load_with(None, env_from(&[("SCHEMA_PULL_INTERVAL", "soon")])).is_err());
        assert!(Config::load_with(None, env_from(&[("NAMESPACE_ENABLED", "maybe")])).is_err());
        assert!(Config::load_with(None, env_from(&[("SCHEMA_REPO_TYPE", "svn")])).is_err());
    }
}
