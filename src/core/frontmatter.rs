//! core::frontmatter
//!
//! Split a markdown document into its frontmatter header and body, and
//! serialize them back.
//!
//! # Format
//!
//! ```text
//! ---
//! title: Customer service agent
//! tags: ["support", "tier-1"]
//! owner:
//!   team: platform
//!   oncall: true
//! ---
//! # Body starts here
//! ```
//!
//! The header is a small YAML subset: plain, single-quoted and double-quoted
//! (JSON-escaped) strings, booleans, `null`, integers and floats, bracketed
//! arrays, block lists (`key:` followed by `- item` lines) and one level of
//! nested objects (`key:` followed by indented `sub: value` lines). Inline
//! JSON objects and arrays are accepted anywhere a value is.
//!
//! # Invariants
//!
//! - [`decode`] never fails. Text that does not start with a well-formed
//!   header decodes to an empty mapping with the whole text as content, and
//!   header lines that cannot be read are skipped.
//! - `decode(&encode(fm, c))` yields `fm` and `c` back for mappings whose
//!   values are strings, numbers, booleans, null, arrays of those, or
//!   one-level objects of those.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Number, Value};

use super::types::{FileContent, Frontmatter};

fn document_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)\A---\n(.*?)\n---\n(.*)\z").expect("frontmatter pattern is valid")
    })
}

/// Decode a raw document into frontmatter and content.
///
/// `revision_id` and `path` of the result are left empty for the caller to
/// fill in.
///
/// # Example
///
/// ```
/// use gitmark::core::frontmatter::decode;
///
/// let doc = decode("---\ntitle: Hello\n---\n# Hi");
/// assert_eq!(doc.frontmatter["title"], "Hello");
/// assert_eq!(doc.content, "# Hi");
///
/// let plain = decode("no header here");
/// assert!(plain.frontmatter.is_empty());
/// assert_eq!(plain.content, "no header here");
/// ```
pub fn decode(raw: &str) -> FileContent {
    match document_pattern().captures(raw) {
        Some(caps) => FileContent {
            frontmatter: parse_header(&caps[1]),
            content: caps[2].to_string(),
            revision_id: None,
            path: None,
        },
        None => FileContent {
            content: raw.to_string(),
            ..FileContent::default()
        },
    }
}

/// Encode frontmatter and content into a document.
///
/// An empty mapping produces the content alone, unless the content itself
/// opens with a header delimiter; then an explicit empty header (`{}`) is
/// written so the content survives a decode.
pub fn encode(frontmatter: &Frontmatter, content: &str) -> String {
    if frontmatter.is_empty() {
        if content.starts_with("---\n") {
            return format!("---\n{{}}\n---\n{content}");
        }
        return content.to_string();
    }

    let mut out = String::from("---\n");
    for (key, value) in frontmatter {
        write_entry(&mut out, key, value);
    }
    out.push_str("---\n");
    out.push_str(content);
    out
}

// --------------------------------------------------------------------------
// Header parsing
// --------------------------------------------------------------------------

fn parse_header(header: &str) -> Frontmatter {
    let mut root = Frontmatter::new();
    // Top-level key whose indented block is open.
    let mut open_block: Option<String> = None;
    // Key that `- item` lines append to: (parent, key).
    let mut list_target: Option<(Option<String>, String)> = None;

    for line in header.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let indented = line.starts_with(' ') || line.starts_with('\t');

        let list_item = trimmed
            .strip_prefix("- ")
            .or_else(|| (trimmed == "-").then_some(""));
        if let Some(item) = list_item {
            if let Some((parent, key)) = &list_target {
                push_list_item(&mut root, parent.as_deref(), key, parse_scalar(item.trim()));
            }
            continue;
        }

        let Some((key, value)) = split_entry(trimmed) else {
            continue;
        };

        if indented {
            if let Some(parent) = &open_block {
                let slot = root.entry(parent.clone()).or_insert(Value::Null);
                if slot.is_null() {
                    *slot = Value::Object(Map::new());
                }
                if let Value::Object(nested) = slot {
                    if value.is_empty() {
                        nested.insert(key.clone(), Value::Null);
                        list_target = Some((Some(parent.clone()), key));
                    } else {
                        nested.insert(key, parse_value(value));
                        list_target = None;
                    }
                }
                continue;
            }
        }

        if value.is_empty() {
            root.insert(key.clone(), Value::Null);
            open_block = Some(key.clone());
            list_target = Some((None, key));
        } else {
            root.insert(key, parse_value(value));
            open_block = None;
            list_target = None;
        }
    }

    root
}

fn push_list_item(root: &mut Frontmatter, parent: Option<&str>, key: &str, item: Value) {
    let slot = match parent {
        None => root.get_mut(key),
        Some(parent) => match root.get_mut(parent) {
            Some(Value::Object(nested)) => nested.get_mut(key),
            _ => None,
        },
    };
    match slot {
        Some(Value::Array(items)) => items.push(item),
        Some(slot) if slot.is_null() => *slot = Value::Array(vec![item]),
        _ => {}
    }
}

/// Split `key: value` (or a bare `key:`) into its parts.
fn split_entry(line: &str) -> Option<(String, &str)> {
    if line.starts_with('"') {
        let end = closing_quote(line)?;
        let key: String = serde_json::from_str(&line[..=end]).ok()?;
        let rest = line[end + 1..].trim_start().strip_prefix(':')?;
        return Some((key, rest.trim()));
    }

    let idx = match line.find(": ") {
        Some(idx) => idx,
        None if line.ends_with(':') => line.len() - 1,
        None => return None,
    };
    let key = line[..idx].trim();
    if key.is_empty() {
        return None;
    }
    let key = key
        .strip_prefix('\'')
        .and_then(|k| k.strip_suffix('\''))
        .unwrap_or(key);
    Some((key.to_string(), line[idx + 1..].trim()))
}

/// Byte index of the quote closing a double-quoted string at the start of `s`.
fn closing_quote(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_value(raw: &str) -> Value {
    if raw.starts_with('[') && raw.ends_with(']') {
        return parse_inline_array(raw);
    }
    if raw.starts_with('{') && raw.ends_with('}') {
        if raw[1..raw.len() - 1].trim().is_empty() {
            return Value::Object(Map::new());
        }
        if let Ok(value @ Value::Object(_)) = serde_json::from_str(raw) {
            return value;
        }
        return Value::String(raw.to_string());
    }
    parse_scalar(raw)
}

fn parse_inline_array(raw: &str) -> Value {
    if let Ok(value @ Value::Array(_)) = serde_json::from_str(raw) {
        return value;
    }

    let inner = raw[1..raw.len() - 1].trim();
    if inner.is_empty() {
        return Value::Array(Vec::new());
    }

    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_double = false;
    let mut in_single = false;
    let mut escaped = false;
    for c in inner.chars() {
        if escaped {
            escaped = false;
            current.push(c);
            continue;
        }
        match c {
            '\\' if in_double => {
                escaped = true;
                current.push(c);
            }
            '"' if !in_single => {
                in_double = !in_double;
                current.push(c);
            }
            '\'' if !in_double => {
                in_single = !in_single;
                current.push(c);
            }
            ',' if !in_double && !in_single => {
                items.push(parse_scalar(current.trim()));
                current.clear();
            }
            _ => current.push(c),
        }
    }
    items.push(parse_scalar(current.trim()));
    Value::Array(items)
}

fn parse_scalar(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if raw.starts_with('"') {
        if let Ok(s) = serde_json::from_str::<String>(raw) {
            return Value::String(s);
        }
        let inner = raw.trim_start_matches('"').trim_end_matches('"');
        return Value::String(inner.to_string());
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return Value::String(raw[1..raw.len() - 1].replace("''", "'"));
    }

    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" | "~" => return Value::Null,
        _ => {}
    }

    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(n) = raw.parse::<u64>() {
        return Value::Number(n.into());
    }
    if let Some(n) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }

    Value::String(raw.to_string())
}

// --------------------------------------------------------------------------
// Header writing
// --------------------------------------------------------------------------

fn write_entry(out: &mut String, key: &str, value: &Value) {
    let key = encode_key(key);
    match value {
        Value::Object(nested) if !nested.is_empty() => {
            out.push_str(&key);
            out.push_str(":\n");
            for (sub_key, sub_value) in nested {
                out.push_str("  ");
                out.push_str(&encode_key(sub_key));
                out.push_str(": ");
                out.push_str(&encode_inline(sub_value));
                out.push('\n');
            }
        }
        _ => {
            out.push_str(&key);
            out.push_str(": ");
            out.push_str(&encode_inline(value));
            out.push('\n');
        }
    }
}

fn encode_key(key: &str) -> String {
    let plain = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if plain {
        key.to_string()
    } else {
        json_string(key)
    }
}

fn encode_inline(value: &Value) -> String {
    match value {
        Value::String(s) if is_plain_string(s) => s.clone(),
        Value::String(s) => json_string(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(Value::to_string).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(nested) if nested.is_empty() => "{}".to_string(),
        other => other.to_string(),
    }
}

/// A string that reads back as itself without quoting.
fn is_plain_string(s: &str) -> bool {
    let starts_ok = s
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_ok
        && !s.ends_with(' ')
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '.' | '/' | '@' | '(' | ')' | '-')
        })
        && matches!(parse_scalar(s), Value::String(ref t) if t == s)
}

fn json_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}
