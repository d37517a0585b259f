//! schemas::types
//!
//! Schema, template and repository status types.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::core::config::SchemaSourceMode;
use crate::core::types::Frontmatter;

/// Summary of a schema, as listed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaInfo {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub fields: Vec<SchemaField>,
}

/// One field a template value set is checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaField {
    pub name: String,
    /// `string`, `string[]`, or any other type name (not checked).
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
}

/// A schema document together with its summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    #[serde(flatten)]
    pub info: SchemaInfo,
    /// The document as stored in `schemas/<id>.json`.
    pub document: Value,
}

impl Schema {
    /// Build a schema from its JSON document.
    ///
    /// Title defaults to the id and description to empty. Fields come from
    /// a `fields` array of `{name, type, required}` objects, or else from
    /// JSON-Schema `properties` and `required`.
    pub fn from_document(id: &str, document: Value) -> Self {
        let title = document
            .get("title")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .unwrap_or(id)
            .to_string();
        let description = document
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let version = match document.get("version") {
            Some(Value::String(v)) => Some(v.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        let fields = match document.get("fields").and_then(Value::as_array) {
            Some(fields) => fields.iter().filter_map(field_from_entry).collect(),
            None => fields_from_properties(&document),
        };

        Schema {
            info: SchemaInfo {
                id: id.to_string(),
                title,
                description,
                version,
                fields,
            },
            document,
        }
    }
}

fn field_from_entry(entry: &Value) -> Option<SchemaField> {
    let name = entry.get("name")?.as_str()?;
    Some(SchemaField {
        name: name.to_string(),
        field_type: entry
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("string")
            .to_string(),
        required: entry
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

fn fields_from_properties(document: &Value) -> Vec<SchemaField> {
    let Some(properties) = document.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };
    let required: Vec<&str> = document
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    properties
        .iter()
        .map(|(name, property)| SchemaField {
            name: name.clone(),
            field_type: json_schema_type(property),
            required: required.contains(&name.as_str()),
        })
        .collect()
}

fn json_schema_type(property: &Value) -> String {
    let ty = property.get("type").and_then(Value::as_str).unwrap_or("string");
    if ty == "array" {
        let item = property
            .get("items")
            .and_then(|i| i.get("type"))
            .and_then(Value::as_str);
        if item == Some("string") {
            return "string[]".to_string();
        }
    }
    ty.to_string()
}

/// A template from `templates/<schema_type>/<name>.md`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInfo {
    /// `{schema_type}/{name}`.
    pub id: String,
    pub name: String,
    pub description: String,
    pub schema_type: String,
    /// Body with `{{placeholders}}`.
    pub content: String,
    pub frontmatter: Frontmatter,
}

impl TemplateInfo {
    /// Build a template from its decoded file. Description falls back to
    /// the `title` key, then to a fixed text.
    pub fn new(schema_type: &str, name: &str, frontmatter: Frontmatter, content: String) -> Self {
        let description = ["description", "title"]
            .iter()
            .find_map(|key| frontmatter.get(*key).and_then(Value::as_str))
            .filter(|d| !d.is_empty())
            .unwrap_or("No description available")
            .to_string();
        TemplateInfo {
            id: format!("{schema_type}/{name}"),
            name: name.to_string(),
            description,
            schema_type: schema_type.to_string(),
            content,
            frontmatter,
        }
    }
}

/// Lifecycle of the local working copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoState {
    /// No clone attempted (git mode off, or not initialized yet).
    Uninitialized,
    Cloning,
    /// The working copy serves reads.
    Ready,
    /// The clone failed; reads use the remote API and defaults.
    Degraded,
}

impl std::fmt::Display for RepoState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoState::Uninitialized => write!(f, "uninitialized"),
            RepoState::Cloning => write!(f, "cloning"),
            RepoState::Ready => write!(f, "ready"),
            RepoState::Degraded => write!(f, "degraded"),
        }
    }
}

/// Working copy details reported by [`CacheStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitInfo {
    pub repo_path: PathBuf,
    pub is_git_repo: bool,
    pub mode: SchemaSourceMode,
    pub pull_interval_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_commit: Option<String>,
}

/// Cache contents and working copy status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Cached schema documents.
    pub schemas: usize,
    /// Cached templates across all template lists.
    pub templates: usize,
    pub last_update: Option<DateTime<Utc>>,
    pub state: RepoState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git: Option<GitInfo>,
}

/// Outcome of checking template values against a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn from_errors(errors: Vec<String>) -> Self {
        ValidationReport {
            valid: errors.is_empty(),
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod schema {
        use super::*;

        #[test]
        fn fields_array() {
            let schema = Schema::from_document(
                "bug",
                json!({
                    "title": "Bug",
                    "version": "2.0.0",
                    "fields": [
                        {"name": "title", "type": "string", "required": true},
                        {"name": "steps", "type": "string[]"},
                        {"type": "string"}
                    ]
                }),
            );
            assert_eq!(schema.info.title, "Bug");
            assert_eq!(schema.info.version.as_deref(), Some("2.0.0"));
            assert_eq!(schema.info.fields.len(), 2);
            assert!(schema.info.fields[0].required);
            assert_eq!(schema.info.fields[1].field_type, "string[]");
            assert!(!schema.info.fields[1].required);
        }

        #[test]
        fn json_schema_properties() {
            let schema = Schema::from_document(
                "agent",
                json!({
                    "properties": {
                        "name": {"type": "string"},
                        "tags": {"type": "array", "items": {"type": "string"}},
                        "count": {"type": "integer"}
                    },
                    "required": ["name"]
                }),
            );
            assert_eq!(schema.info.title, "agent");
            assert_eq!(schema.info.description, "");
            let tags = schema.info.fields.iter().find(|f| f.name == "tags").unwrap();
            assert_eq!(tags.field_type, "string[]");
            let name = schema.info.fields.iter().find(|f| f.name == "name").unwrap();
            assert!(name.required);
            let count = schema.info.fields.iter().find(|f| f.name == "count").unwrap();
            assert_eq!(count.field_type, "integer");
            assert!(!count.required);
        }

        #[test]
        fn numeric_version() {
            let schema = Schema::from_document("x", json!({"version": 3}));
            assert_eq!(schema.info.version.as_deref(), Some("3"));
        }

        #[test]
        fn serializes_flat() {
            let schema = Schema::from_document("x", json!({"title": "X"}));
            let value = serde_json::to_value(&schema).unwrap();
            assert_eq!(value["id"], "x");
            assert_eq!(value["document"]["title"], "X");
        }
    }

    mod template {
        use super::*;

        #[test]
        fn description_fallbacks() {
            let mut fm = Frontmatter::new();
            fm.insert("title".into(), json!("Basic"));
            let t = TemplateInfo::new("user-story", "basic", fm, "body".into());
            assert_eq!(t.id, "user-story/basic");
            assert_eq!(t.description, "Basic");

            let t = TemplateInfo::new("user-story", "bare", Frontmatter::new(), String::new());
            assert_eq!(t.description, "No description available");
        }
    }

    #[test]
    fn validation_report_validity() {
        assert!(ValidationReport::from_errors(vec![]).valid);
        assert!(!ValidationReport::from_errors(vec!["x".into()]).valid);
    }
}
