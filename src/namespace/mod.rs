//! namespace
//!
//! Maps callers to namespaces and namespaces to directory prefixes.
//!
//! # Design
//!
//! A namespace is a top-level directory of the document repository. When
//! namespace separation is enabled, an authenticated caller may access the
//! namespace named after their user claim plus one per group claim. When it
//! is disabled, or the caller is anonymous, everyone shares the configured
//! default namespace, whose files live at the repository root.
//!
//! Claim values are sanitized to `[a-z0-9_-]` before they are used as
//! directory names, so no identity can produce a path separator or `..`.
//!
//! # Example
//!
//! ```
//! use gitmark::auth::Identity;
//! use gitmark::core::config::NamespaceSettings;
//! use gitmark::namespace::NamespaceResolver;
//!
//! let resolver = NamespaceResolver::new(NamespaceSettings {
//!     enabled: true,
//!     ..NamespaceSettings::default()
//! });
//! let identity = Identity::from_json(r#"{"sub":"A.B@x","groups":["Team X"]}"#).unwrap();
//! let ctx = resolver.resolve(Some(&identity));
//! assert_eq!(ctx.user_id, "a-b-x");
//! assert_eq!(ctx.available_namespaces, vec!["a-b-x", "team-x"]);
//! ```

use serde::Serialize;

use crate::auth::Identity;
use crate::core::config::NamespaceSettings;
use crate::core::errors::AppError;
use crate::core::paths::validate_path;

/// User id of a caller without an identity.
pub const ANONYMOUS_USER: &str = "anonymous";

/// User id when an identity carries no usable user claim.
pub const UNKNOWN_USER: &str = "unknown-user";

/// Namespaces a caller may access, built once per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceContext {
    pub user_id: String,
    pub user_groups: Vec<String>,
    /// The user's namespace first, then group namespaces. Never empty.
    pub available_namespaces: Vec<String>,
    pub default_namespace: String,
}

impl NamespaceContext {
    pub fn is_anonymous(&self) -> bool {
        self.user_id == ANONYMOUS_USER
    }
}

/// How a listed namespace relates to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceKind {
    /// The default namespace at the repository root.
    System,
    /// The caller's own namespace.
    User,
    /// A namespace granted by a group claim.
    Group,
}

/// One namespace open to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NamespaceKind,
    /// Repository directory holding its files; empty for the root.
    pub directory: String,
}

/// A path split into its namespace and the path inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacedPath {
    pub namespace: String,
    pub relative_path: String,
}

/// Namespace resolution and path mapping.
#[derive(Debug, Clone)]
pub struct NamespaceResolver {
    settings: NamespaceSettings,
}

impl NamespaceResolver {
    pub fn new(settings: NamespaceSettings) -> Self {
        Self { settings }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Namespace of files at the repository root.
    pub fn default_namespace(&self) -> &str {
        &self.settings.default_namespace
    }

    /// Build the caller's namespace context.
    pub fn resolve(&self, identity: Option<&Identity>) -> NamespaceContext {
        let identity = match identity {
            Some(identity) if self.settings.enabled => identity,
            _ => return self.anonymous_context(),
        };

        let user_id = identity
            .claim_str(&self.settings.user_claim)
            .or_else(|| identity.claim_str("sub"))
            .map(|claim| sanitize(&claim))
            .unwrap_or_else(|| UNKNOWN_USER.to_string());

        let mut user_groups: Vec<String> = Vec::new();
        for group in identity.claim_strings(&self.settings.groups_claim) {
            let group = sanitize(&group);
            if !user_groups.contains(&group) {
                user_groups.push(group);
            }
        }

        let mut available_namespaces = vec![user_id.clone()];
        available_namespaces.extend(user_groups.iter().filter(|g| **g != user_id).cloned());

        tracing::debug!(%user_id, namespaces = ?available_namespaces, "resolved namespaces");
        NamespaceContext {
            default_namespace: user_id.clone(),
            user_id,
            user_groups,
            available_namespaces,
        }
    }

    fn anonymous_context(&self) -> NamespaceContext {
        NamespaceContext {
            user_id: ANONYMOUS_USER.to_string(),
            user_groups: Vec::new(),
            available_namespaces: vec![self.settings.default_namespace.clone()],
            default_namespace: self.settings.default_namespace.clone(),
        }
    }

    /// Whether `namespace` is open to the caller. Always true when
    /// separation is disabled.
    pub fn is_accessible(&self, namespace: &str, ctx: &NamespaceContext) -> bool {
        !self.settings.enabled || ctx.available_namespaces.iter().any(|ns| ns == namespace)
    }

    /// The namespaces open to the caller, in `available_namespaces` order.
    ///
    /// With separation disabled, or for an anonymous caller, that is the
    /// default namespace alone.
    pub fn list_namespaces(&self, ctx: &NamespaceContext) -> Vec<NamespaceInfo> {
        if !self.settings.enabled || ctx.is_anonymous() {
            return vec![self.info(&self.settings.default_namespace, NamespaceKind::System)];
        }
        ctx.available_namespaces
            .iter()
            .map(|name| {
                let kind = if *name == ctx.user_id {
                    NamespaceKind::User
                } else {
                    NamespaceKind::Group
                };
                self.info(name, kind)
            })
            .collect()
    }

    fn info(&self, name: &str, kind: NamespaceKind) -> NamespaceInfo {
        if name == self.settings.default_namespace {
            return NamespaceInfo {
                name: name.to_string(),
                kind: NamespaceKind::System,
                directory: String::new(),
            };
        }
        NamespaceInfo {
            name: name.to_string(),
            kind,
            directory: name.to_string(),
        }
    }

    /// Like [`is_accessible`](Self::is_accessible), as an error.
    pub fn ensure_accessible(&self, namespace: &str, ctx: &NamespaceContext) -> Result<(), AppError> {
        if self.is_accessible(namespace, ctx) {
            Ok(())
        } else {
            tracing::debug!(%namespace, user_id = %ctx.user_id, "namespace denied");
            Err(AppError::Namespace {
                namespace: namespace.to_string(),
                message: format!("not accessible to user '{}'", ctx.user_id),
            })
        }
    }

    /// Prefix `relative` with `namespace/`, unless separation is disabled
    /// or the prefix is already there.
    pub fn to_path(&self, relative: &str, namespace: &str) -> String {
        if !self.settings.enabled {
            return relative.to_string();
        }
        prefixed(relative, namespace)
    }

    /// Split a path on its first `/`. Paths without a separator, and all
    /// paths when separation is disabled, belong to the default namespace.
    pub fn from_path(&self, path: &str) -> NamespacedPath {
        match path.split_once('/') {
            Some((namespace, rest)) if self.settings.enabled => NamespacedPath {
                namespace: namespace.to_string(),
                relative_path: rest.to_string(),
            },
            _ => NamespacedPath {
                namespace: self.settings.default_namespace.clone(),
                relative_path: path.to_string(),
            },
        }
    }

    /// Keep the items whose path lies in an accessible namespace.
    pub fn filter_by_namespace<T, F>(&self, items: Vec<T>, ctx: &NamespaceContext, path_of: F) -> Vec<T>
    where
        F: Fn(&T) -> &str,
    {
        if !self.settings.enabled {
            return items;
        }
        items
            .into_iter()
            .filter(|item| {
                let namespace = self.from_path(path_of(item)).namespace;
                self.is_accessible(&namespace, ctx)
            })
            .collect()
    }

    /// Repository path of `filename` stored in `namespace`.
    ///
    /// The default namespace, or no namespace, is the repository root.
    ///
    /// # Errors
    ///
    /// `AppError::Validation` when the filename is unsafe or the namespace
    /// is not a single safe path segment.
    pub fn storage_path(&self, filename: &str, namespace: Option<&str>) -> Result<String, AppError> {
        validate_path(filename)?;
        match namespace {
            None => Ok(filename.to_string()),
            Some(ns) if ns.is_empty() || ns == self.settings.default_namespace => {
                Ok(filename.to_string())
            }
            Some(ns) => {
                validate_namespace(ns)?;
                Ok(prefixed(filename, ns))
            }
        }
    }
}

fn prefixed(relative: &str, namespace: &str) -> String {
    if relative
        .strip_prefix(namespace)
        .is_some_and(|rest| rest.starts_with('/'))
    {
        relative.to_string()
    } else {
        format!("{namespace}/{relative}")
    }
}

fn validate_namespace(namespace: &str) -> Result<(), AppError> {
    validate_path(namespace)?;
    if namespace.contains('/') || namespace == "." {
        return Err(AppError::Validation(format!(
            "namespace must be a single path segment: '{namespace}'"
        )));
    }
    Ok(())
}

/// Lowercase a claim and replace everything outside `[a-z0-9_-]` with `-`.
///
/// # Example
///
/// ```
/// use gitmark::namespace::sanitize;
///
/// assert_eq!(sanitize("A.B@x"), "a-b-x");
/// assert_eq!(sanitize(".."), "--");
/// ```
pub fn sanitize(claim: &str) -> String {
    claim
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' | '-' => c,
            _ => '-',
        })
        .collect()
}
