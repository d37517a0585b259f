//! core::errors
//!
//! Application error taxonomy shared by the orchestration layer, the
//! namespace resolver and the schema repository.
//!
//! # Design
//!
//! Lower layers keep their own error enums (`ProviderError`, `GitError`,
//! `ConfigError`). They are converted into [`AppError`] at the module
//! boundary that knows what the failure means for the caller: a provider
//! `NotFound` is a user-facing not-found, a provider `Conflict` is an
//! optimistic-concurrency conflict, everything else is wrapped with the
//! operation and filename that failed.
//!
//! Every variant maps to a stable [`ErrorKind`], an HTTP-ish status code and
//! a machine-readable code string, so an outer HTTP layer can build its
//! response without matching on messages.

use std::fmt;

use thiserror::Error;

use crate::core::config::ConfigError;
use crate::forge::ProviderError;

/// Boxed source error carried by wrapping variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse classification of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Validation,
    NotFound,
    Conflict,
    GitProvider,
    FileOperation,
    SchemaRepository,
    Namespace,
}

impl ErrorKind {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "CONFIGURATION_ERROR",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::GitProvider => "GIT_PROVIDER_ERROR",
            ErrorKind::FileOperation => "FILE_OPERATION_ERROR",
            ErrorKind::SchemaRepository => "SCHEMA_REPOSITORY_ERROR",
            ErrorKind::Namespace => "NAMESPACE_ERROR",
        }
    }

    /// Status code an HTTP surface would answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Configuration => 500,
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::GitProvider => 502,
            ErrorKind::FileOperation => 422,
            ErrorKind::SchemaRepository => 503,
            ErrorKind::Namespace => 403,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors surfaced by the document and schema services.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid configuration (including unknown platforms).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Invalid input: unsafe paths, duplicate creates, malformed values.
    #[error("validation error: {0}")]
    Validation(String),

    /// The requested resource does not exist.
    #[error("{resource} not found: {identifier}")]
    NotFound {
        resource: &'static str,
        identifier: String,
    },

    /// Optimistic-concurrency mismatch or an occupied move target.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A hosting provider call failed for a reason the caller cannot fix.
    #[error("{provider} error: {message}")]
    GitProvider {
        provider: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A file operation failed; carries the operation and the filename.
    #[error("failed to {operation} '{filename}': {source}")]
    FileOperation {
        operation: &'static str,
        filename: String,
        #[source]
        source: BoxError,
    },

    /// The schema repository could not answer.
    #[error("schema repository error: {message}")]
    SchemaRepository {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The caller may not access the namespace.
    #[error("namespace '{namespace}': {message}")]
    Namespace { namespace: String, message: String },
}

impl AppError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Configuration(_) => ErrorKind::Configuration,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::NotFound { .. } => ErrorKind::NotFound,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::GitProvider { .. } => ErrorKind::GitProvider,
            AppError::FileOperation { .. } => ErrorKind::FileOperation,
            AppError::SchemaRepository { .. } => ErrorKind::SchemaRepository,
            AppError::Namespace { .. } => ErrorKind::Namespace,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    pub fn not_found(resource: &'static str, identifier: impl Into<String>) -> Self {
        AppError::NotFound {
            resource,
            identifier: identifier.into(),
        }
    }

    /// Wrap a provider error that has no more specific meaning.
    pub fn provider(provider: impl Into<String>, err: ProviderError) -> Self {
        AppError::GitProvider {
            provider: provider.into(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    pub fn schema_repository(message: impl Into<String>) -> Self {
        AppError::SchemaRepository {
            message: message.into(),
            source: None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}
