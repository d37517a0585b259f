//! Property-based tests for core domain types.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use proptest::prelude::*;
use serde_json::Value;

use gitmark::core::config::NamespaceSettings;
use gitmark::core::frontmatter::{decode, encode};
use gitmark::core::naming::{build_filename, parse_filename};
use gitmark::core::paths::validate_path;
use gitmark::core::types::Frontmatter;
use gitmark::namespace::{sanitize, NamespaceResolver};

/// Strategy for frontmatter keys the encoder writes unquoted.
fn key() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}"
}

/// Strategy for scalar frontmatter values.
fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[ -~]{0,24}".prop_map(Value::String),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
    ]
}

/// Strategy for frontmatter values, including flat arrays of scalars.
fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        4 => scalar(),
        1 => prop::collection::vec(scalar(), 0..4).prop_map(Value::Array),
    ]
}

fn frontmatter() -> impl Strategy<Value = Frontmatter> {
    prop::collection::btree_map(key(), value(), 0..6)
        .prop_map(|entries| entries.into_iter().collect())
}

/// Strategy for a document body. Never opens with a header delimiter.
fn body() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 #.*\n]{0,80}"
}

/// Strategy for safe path segments.
fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9_-][a-z0-9_.-]{0,12}".prop_filter("no dot runs", |s| !s.contains(".."))
}

proptest! {
    /// Decoding an encoded document yields the same header and body.
    #[test]
    fn frontmatter_roundtrip(fm in frontmatter(), content in body()) {
        let doc = decode(&encode(&fm, &content));
        prop_assert_eq!(doc.frontmatter, fm);
        prop_assert_eq!(doc.content, content);
    }

    /// Decoding never fails, whatever the input.
    #[test]
    fn decode_is_total(raw in "(---\n)?[ -~\n]{0,120}") {
        let doc = decode(&raw);
        prop_assert!(doc.revision_id.is_none());
    }

    /// Text without a header decodes to itself.
    #[test]
    fn headerless_text_is_content(content in body()) {
        let doc = decode(&content);
        prop_assert!(doc.frontmatter.is_empty());
        prop_assert_eq!(doc.content, content);
    }

    /// Any path built from safe segments is accepted.
    #[test]
    fn safe_paths_accepted(parts in prop::collection::vec(segment(), 1..4)) {
        let path = parts.join("/");
        prop_assume!(!parts.iter().any(|p| p == "."));
        prop_assert!(validate_path(&path).is_ok(), "rejected {}", path);
    }

    /// An accepted path never climbs out of the root.
    #[test]
    fn accepted_paths_stay_inside(path in "[a-z./\\\\]{1,16}") {
        if validate_path(&path).is_ok() {
            prop_assert!(!path.starts_with('/'));
            prop_assert!(!path.split('/').any(|part| part == ".."));
            prop_assert!(!path.contains('\\'));
        }
    }

    /// A namespaced storage path always lives under its namespace directory.
    #[test]
    fn storage_path_under_namespace(ns in "[a-z][a-z0-9-]{0,10}", file in segment()) {
        prop_assume!(ns != "shared");
        let resolver = NamespaceResolver::new(NamespaceSettings {
            enabled: true,
            ..NamespaceSettings::default()
        });
        let path = resolver.storage_path(&file, Some(&ns)).unwrap();
        let prefix = format!("{}/", ns);
        prop_assert!(path.starts_with(&prefix));
    }

    /// Sanitized claims only contain namespace-safe characters.
    #[test]
    fn sanitize_output_is_safe(claim in "\\PC{0,24}") {
        let ns = sanitize(&claim);
        prop_assert!(ns.chars().all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-')));
        prop_assert_eq!(sanitize(&ns), ns.clone());
    }

    /// Conventional filenames split back into their parts.
    #[test]
    fn filename_convention_roundtrip(
        name in "[a-z][a-z0-9.-]{0,12}",
        schema_type in "[a-z][a-z0-9-]{0,12}",
    ) {
        let parsed = parse_filename(&build_filename(&name, &schema_type)).unwrap();
        prop_assert_eq!(parsed.name, name);
        prop_assert_eq!(parsed.schema_type, schema_type);
    }
}
