//! auth - caller identity
//!
//! Token validation is not part of this crate. The core depends on an
//! [`IdentityProvider`] capability that yields the caller's claims, or
//! nothing for an anonymous caller, and the namespace resolver turns those
//! claims into accessible namespaces.
//!
//! # Components
//!
//! - [`Identity`] - claims of an authenticated caller
//! - [`IdentityProvider`] - async capability returning `Option<Identity>`
//! - [`AnonymousIdentityProvider`] - always anonymous
//! - [`StaticIdentityProvider`] - a fixed identity (CLI `--claims`, tests)
//!
//! # Example
//!
//! ```
//! use gitmark::auth::{IdentityProvider, StaticIdentityProvider};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let provider = StaticIdentityProvider::from_json(r#"{"sub":"alice"}"#).unwrap();
//! let identity = provider.identity().await.unwrap();
//! assert_eq!(identity.claim_str("sub").as_deref(), Some("alice"));
//! # });
//! ```

mod errors;
mod identity;

pub use errors::AuthError;
pub use identity::Identity;

/// Supplies the identity of the current caller.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The caller's identity, or `None` when the caller is anonymous.
    async fn identity(&self) -> Option<Identity>;
}

/// Every caller is anonymous.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousIdentityProvider;

#[async_trait::async_trait]
impl IdentityProvider for AnonymousIdentityProvider {
    async fn identity(&self) -> Option<Identity> {
        None
    }
}

/// Every caller carries the same, preconfigured identity.
#[derive(Debug, Clone)]
pub struct StaticIdentityProvider {
    identity: Identity,
}

impl StaticIdentityProvider {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    /// Build from a JSON object of claims.
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        Identity::from_json(json).map(Self::new)
    }
}

#[async_trait::async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn identity(&self) -> Option<Identity> {
        Some(self.identity.clone())
    }
}
