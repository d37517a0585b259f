//! auth::identity
//!
//! The claims describing an authenticated caller.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::AuthError;

/// Authenticated caller, as a bag of token claims.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity {
    claims: Map<String, Value>,
}

impl Identity {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    /// Parse claims from a JSON object.
    ///
    /// # Errors
    ///
    /// `AuthError::InvalidClaims` when the text is not a JSON object.
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(claims)) => Ok(Self { claims }),
            Ok(_) => Err(AuthError::InvalidClaims("expected a JSON object".into())),
            Err(e) => Err(AuthError::InvalidClaims(e.to_string())),
        }
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// A claim as a non-empty string. Numbers are rendered as text.
    pub fn claim_str(&self, name: &str) -> Option<String> {
        match self.claims.get(name)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// A claim as a list of strings. A single string counts as a
    /// one-element list; non-string elements are skipped.
    pub fn claim_strings(&self, name: &str) -> Vec<String> {
        match self.claims.get(name) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_requires_object() {
        assert!(Identity::from_json(r#"{"sub":"alice"}"#).is_ok());
        assert!(matches!(
            Identity::from_json("[1,2]"),
            Err(AuthError::InvalidClaims(_))
        ));
        assert!(Identity::from_json("{").is_err());
    }

    #[test]
    fn claim_accessors() {
        let identity =
            Identity::from_json(r#"{"sub":"alice","id":42,"empty":"","groups":["a",1,"b"]}"#)
                .unwrap();
        assert_eq!(identity.claim_str("sub").as_deref(), Some("alice"));
        assert_eq!(identity.claim_str("id").as_deref(), Some("42"));
        assert_eq!(identity.claim_str("empty"), None);
        assert_eq!(identity.claim_str("missing"), None);
        assert_eq!(identity.claim_strings("groups"), vec!["a", "b"]);
        assert_eq!(identity.claim_strings("sub"), vec!["alice"]);
        assert!(identity.claim_strings("missing").is_empty());
    }
}
