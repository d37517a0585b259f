//! schemas::render
//!
//! Minimal placeholder substitution for templates and value checks against
//! schema fields.
//!
//! # Syntax
//!
//! - `{{name}}` is replaced by the value of `name`: strings verbatim,
//!   numbers and booleans as displayed, `null` as nothing, arrays as their
//!   elements joined with `,`.
//! - `{{#each name}}...{{/each}}` repeats its body once per element of the
//!   array `name`, with `{{this}}` as the element and `{{@index}}` as its
//!   1-based position. Repetitions are joined with a newline.
//!
//! Placeholders without a value are left as written. Blocks do not nest.

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use super::types::{SchemaField, ValidationReport};

/// Render `content` with `values`.
///
/// # Example
///
/// ```
/// use gitmark::schemas::render_template;
/// use serde_json::json;
///
/// let values = json!({"title": "Login", "steps": ["open", "click"]});
/// let out = render_template(
///     "# {{title}}\n{{#each steps}}{{@index}}. {{this}}{{/each}}",
///     values.as_object().unwrap(),
/// );
/// assert_eq!(out, "# Login\n1. open\n2. click");
/// ```
pub fn render_template(content: &str, values: &Map<String, Value>) -> String {
    let mut out = content.to_string();

    for (key, value) in values {
        out = out.replace(&format!("{{{{{key}}}}}"), &stringify(value));
    }

    for (key, value) in values {
        let Value::Array(items) = value else {
            continue;
        };
        out = each_block(key)
            .replace_all(&out, |caps: &Captures| repeat(&caps[1], items))
            .into_owned();
    }

    out
}

fn each_block(key: &str) -> Regex {
    let pattern = format!(r"(?s)\{{\{{#each {}\}}\}}(.*?)\{{\{{/each\}}\}}", regex::escape(key));
    Regex::new(&pattern).expect("escaped each-block pattern is valid")
}

fn repeat(body: &str, items: &[Value]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            body.replace("{{this}}", &stringify(item))
                .replace("{{@index}}", &(i + 1).to_string())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Check `values` against `fields`.
///
/// A required field must be present and populated: not `null`, not `""`,
/// not `[]`. Present values of `string` fields must be strings and of
/// `string[]` fields arrays of strings; other types are not checked.
pub fn validate_values(fields: &[SchemaField], values: &Map<String, Value>) -> ValidationReport {
    let mut errors = Vec::new();

    for field in fields {
        let value = values.get(&field.name);
        if field.required && !is_populated(value) {
            errors.push(format!("Field '{}' is required", field.name));
        }

        let Some(value) = value.filter(|v| !v.is_null()) else {
            continue;
        };
        match field.field_type.as_str() {
            "string" if !value.is_string() => {
                errors.push(format!("Field '{}' must be a string", field.name));
            }
            "string[]" if !is_string_array(value) => {
                errors.push(format!("Field '{}' must be an array of strings", field.name));
            }
            _ => {}
        }
    }

    ValidationReport::from_errors(errors)
}

fn is_populated(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

fn is_string_array(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().all(Value::is_string))
}
