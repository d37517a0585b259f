//! schemas::cache
//!
//! In-memory cache of schema documents and template lists.
//!
//! One timestamp covers the whole cache: it is valid while
//! `now - last_update < timeout`, and a successful pull or a manual clear
//! empties it wholesale. Instants come from `tokio::time` so tests can move
//! the clock with `tokio::time::advance`.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use super::types::{Schema, SchemaInfo, TemplateInfo};

/// Template list key for "every schema type".
pub const ALL_TEMPLATES: &str = "all";

#[derive(Debug, Default)]
pub struct SchemaCache {
    schemas: BTreeMap<String, Schema>,
    /// Whether `schemas` holds a complete listing rather than single lookups.
    listed: bool,
    templates: HashMap<String, Vec<TemplateInfo>>,
    last_update: Option<Instant>,
    last_update_at: Option<DateTime<Utc>>,
}

impl SchemaCache {
    pub fn is_valid_at(&self, now: Instant, timeout: Duration) -> bool {
        match self.last_update {
            Some(at) => now.saturating_duration_since(at) < timeout,
            None => false,
        }
    }

    fn touch(&mut self) {
        self.last_update = Some(Instant::now());
        self.last_update_at = Some(Utc::now());
    }

    /// The complete schema listing, if one was cached.
    pub fn schema_list(&self) -> Option<Vec<SchemaInfo>> {
        self.listed
            .then(|| self.schemas.values().map(|s| s.info.clone()).collect())
    }

    pub fn schema(&self, id: &str) -> Option<Schema> {
        self.schemas.get(id).cloned()
    }

    pub fn templates(&self, key: &str) -> Option<Vec<TemplateInfo>> {
        self.templates.get(key).cloned()
    }

    /// A template found in any cached list.
    pub fn template(&self, id: &str) -> Option<TemplateInfo> {
        self.templates
            .values()
            .flatten()
            .find(|t| t.id == id)
            .cloned()
    }

    pub fn store_schema_list(&mut self, schemas: Vec<Schema>) {
        self.schemas = schemas
            .into_iter()
            .map(|s| (s.info.id.clone(), s))
            .collect();
        self.listed = true;
        self.touch();
    }

    pub fn store_schema(&mut self, schema: Schema) {
        self.schemas.insert(schema.info.id.clone(), schema);
        self.touch();
    }

    pub fn store_templates(&mut self, key: &str, templates: Vec<TemplateInfo>) {
        self.templates.insert(key.to_string(), templates);
        self.touch();
    }

    pub fn clear(&mut self) {
        *self = SchemaCache::default();
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    pub fn template_count(&self) -> usize {
        self.templates.values().map(Vec::len).sum()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Frontmatter;
    use serde_json::json;

    fn schema(id: &str) -> Schema {
        Schema::from_document(id, json!({"title": id}))
    }

    #[test]
    fn empty_cache_is_invalid() {
        let cache = SchemaCache::default();
        assert!(!cache.is_valid_at(Instant::now(), Duration::from_secs(300)));
        assert!(cache.schema_list().is_none());
    }

    #[test]
    fn validity_window() {
        let mut cache = SchemaCache::default();
        cache.store_schema(schema("a"));
        let now = Instant::now();
        let timeout = Duration::from_secs(300);
        assert!(cache.is_valid_at(now, timeout));
        assert!(cache.is_valid_at(now + Duration::from_secs(299), timeout));
        assert!(!cache.is_valid_at(now + Duration::from_secs(301), timeout));
    }

    #[test]
    fn single_lookups_do_not_make_a_listing() {
        let mut cache = SchemaCache::default();
        cache.store_schema(schema("a"));
        assert!(cache.schema_list().is_none());
        assert!(cache.schema("a").is_some());

        cache.store_schema_list(vec![schema("a"), schema("b")]);
        let ids: Vec<_> = cache.schema_list().unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn template_lookup_across_lists() {
        let mut cache = SchemaCache::default();
        let t = TemplateInfo::new("bug", "short", Frontmatter::new(), String::new());
        cache.store_templates("bug", vec![t]);
        assert!(cache.template("bug/short").is_some());
        assert!(cache.template("bug/long").is_none());
        assert_eq!(cache.template_count(), 1);
    }

    #[test]
    fn clear_resets_everything() {
        let mut cache = SchemaCache::default();
        cache.store_schema_list(vec![schema("a")]);
        cache.store_templates(ALL_TEMPLATES, vec![]);
        cache.clear();
        assert_eq!(cache.schema_count(), 0);
        assert!(cache.last_update().is_none());
        assert!(!cache.is_valid_at(Instant::now(), Duration::from_secs(300)));
    }
}
