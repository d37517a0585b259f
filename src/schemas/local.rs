//! schemas::local
//!
//! Reads schemas and templates from a working copy on disk.
//!
//! Callers hold the repository's swap guard for the whole call so a
//! multi-file read sees one copy.

use std::fs;
use std::io;
use std::path::Path;

use super::types::{Schema, TemplateInfo};
use crate::core::errors::AppError;
use crate::core::frontmatter;
use crate::core::paths::SchemaRepoPaths;

fn read_error(what: &str, path: &Path, err: io::Error) -> AppError {
    AppError::SchemaRepository {
        message: format!("failed to read {what} at {}", path.display()),
        source: Some(Box::new(err)),
    }
}

fn parse_schema(path: &Path, id: &str) -> Result<Schema, AppError> {
    let text = fs::read_to_string(path).map_err(|e| read_error("schema", path, e))?;
    let document = serde_json::from_str(&text).map_err(|e| AppError::SchemaRepository {
        message: format!("schema {id} is not valid JSON"),
        source: Some(Box::new(e)),
    })?;
    Ok(Schema::from_document(id, document))
}

/// Every `schemas/*.json` in the copy. Unparseable files are skipped.
///
/// # Errors
///
/// `SchemaRepository` when the copy has no `schemas/` directory.
pub fn read_schemas(copy: &Path) -> Result<Vec<Schema>, AppError> {
    let dir = SchemaRepoPaths::schemas_dir(copy);
    let entries = fs::read_dir(&dir).map_err(|e| read_error("schemas directory", &dir, e))?;

    let mut schemas = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match parse_schema(&path, id) {
            Ok(schema) => schemas.push(schema),
            Err(err) => tracing::warn!(file = %path.display(), error = %err, "skipping schema"),
        }
    }
    schemas.sort_by(|a, b| a.info.id.cmp(&b.info.id));
    Ok(schemas)
}

/// `schemas/<id>.json` from the copy.
pub fn read_schema(copy: &Path, id: &str) -> Result<Schema, AppError> {
    let path = SchemaRepoPaths::schema_file(copy, id);
    if !path.is_file() {
        return Err(AppError::not_found("schema", id));
    }
    parse_schema(&path, id)
}

/// Templates of one schema type, or of every type. A copy without a
/// `templates/` directory has none.
pub fn read_templates(copy: &Path, schema_type: Option<&str>) -> Result<Vec<TemplateInfo>, AppError> {
    let dir = SchemaRepoPaths::templates_dir(copy);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let types = match schema_type {
        Some(ty) => vec![ty.to_string()],
        None => {
            let entries = fs::read_dir(&dir).map_err(|e| read_error("templates directory", &dir, e))?;
            let mut types: Vec<String> = entries
                .flatten()
                .filter(|e| e.path().is_dir())
                .filter_map(|e| e.file_name().to_str().map(str::to_string))
                .collect();
            types.sort();
            types
        }
    };

    let mut templates = Vec::new();
    for ty in types {
        let type_dir = dir.join(&ty);
        let Ok(entries) = fs::read_dir(&type_dir) else {
            continue;
        };
        let mut names: Vec<String> = entries
            .flatten()
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter_map(|f| f.strip_suffix(".md").map(str::to_string))
            .collect();
        names.sort();
        templates.extend(names.iter().filter_map(|name| parse_template(copy, &ty, name)));
    }
    Ok(templates)
}

/// `templates/<schema_type>/<name>.md` from the copy, if present.
pub fn read_template(copy: &Path, schema_type: &str, name: &str) -> Option<TemplateInfo> {
    parse_template(copy, schema_type, name)
}

fn parse_template(copy: &Path, schema_type: &str, name: &str) -> Option<TemplateInfo> {
    let path = SchemaRepoPaths::templates_dir(copy)
        .join(schema_type)
        .join(format!("{name}.md"));
    let raw = fs::read_to_string(&path).ok()?;
    let doc = frontmatter::decode(&raw);
    if doc.frontmatter.is_empty() {
        tracing::warn!(file = %path.display(), "template has no frontmatter, skipping");
        return None;
    }
    Some(TemplateInfo::new(schema_type, name, doc.frontmatter, doc.content))
}
