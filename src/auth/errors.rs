//! auth::errors
//!
//! Identity error types.
//!
//! # Example
//!
//! ```
//! use gitmark::auth::AuthError;
//!
//! let err = AuthError::InvalidClaims("expected a JSON object".to_string());
//! assert!(err.to_string().contains("JSON object"));
//! ```

use thiserror::Error;

/// Errors from building an identity.
///
/// Messages never include raw claim values, which may carry tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Claims could not be parsed or are not an object.
    #[error("invalid identity claims: {0}")]
    InvalidClaims(String),
}
