//! forge::factory
//!
//! Driver selection and creation.
//!
//! # Design
//!
//! This module is the one place that knows which driver type serves which
//! platform. Callers use [`create_driver`] and hold the result as
//! `Arc<dyn ProviderDriver>`; nothing else imports a concrete driver.
//!
//! # Example
//!
//! ```ignore
//! use gitmark::core::config::ProviderConfig;
//! use gitmark::forge::create_driver;
//!
//! let driver = create_driver(&ProviderConfig {
//!     platform: "gitea".into(),
//!     token: "t".into(),
//!     owner: "acme".into(),
//!     repo: "handbook".into(),
//!     ..ProviderConfig::default()
//! })?;
//! assert_eq!(driver.name(), "gitea");
//! ```

use std::sync::Arc;

use super::gitea::GiteaDriver;
use super::github::GitHubDriver;
use super::gitlab::GitLabDriver;
use super::traits::ProviderDriver;
use crate::core::config::ProviderConfig;
use crate::core::errors::AppError;

/// Supported hosting platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    GitHub,
    GitLab,
    Gitea,
}

impl Platform {
    /// Get all supported platforms.
    ///
    /// # Example
    ///
    /// ```
    /// use gitmark::forge::Platform;
    ///
    /// assert!(Platform::all().contains(&Platform::Gitea));
    /// ```
    pub fn all() -> &'static [Platform] {
        &[Platform::GitHub, Platform::GitLab, Platform::Gitea]
    }

    /// The platform name as used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::GitHub => "github",
            Platform::GitLab => "gitlab",
            Platform::Gitea => "gitea",
        }
    }

    /// Parse a platform name, ignoring case.
    ///
    /// # Example
    ///
    /// ```
    /// use gitmark::forge::Platform;
    ///
    /// assert_eq!(Platform::parse("GitLab"), Some(Platform::GitLab));
    /// assert_eq!(Platform::parse("bitbucket"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "github" => Some(Platform::GitHub),
            "gitlab" => Some(Platform::GitLab),
            "gitea" => Some(Platform::Gitea),
            _ => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Create the driver for `config.platform`.
///
/// # Errors
///
/// `AppError::Configuration` when the platform is unknown or the
/// credentials the platform needs are missing.
pub fn create_driver(config: &ProviderConfig) -> Result<Arc<dyn ProviderDriver>, AppError> {
    let platform = Platform::parse(&config.platform).ok_or_else(|| {
        AppError::Configuration(format!(
            "unsupported git provider '{}'. Supported providers: {}",
            config.platform,
            valid_platform_names().join(", ")
        ))
    })?;
    config.validate_credentials()?;

    tracing::debug!(%platform, owner = %config.owner, repo = %config.repo, "creating provider driver");
    let driver: Arc<dyn ProviderDriver> = match platform {
        Platform::GitHub => Arc::new(GitHubDriver::new(config)),
        Platform::GitLab => Arc::new(GitLabDriver::new(config)),
        Platform::Gitea => Arc::new(GiteaDriver::new(config)),
    };
    Ok(driver)
}

/// Valid platform names for configuration validation.
pub fn valid_platform_names() -> &'static [&'static str] {
    &["github", "gitlab", "gitea"]
}
