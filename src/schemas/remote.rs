//! schemas::remote
//!
//! Reads schemas and templates through a provider driver, using the same
//! `schemas/` and `templates/` layout as a working copy.
//!
//! Drivers list files only, so listing every template walks
//! `templates/<id>/` for each known schema id.

use std::sync::Arc;

use super::types::{Schema, TemplateInfo};
use crate::core::naming;
use crate::forge::{ProviderDriver, ProviderError};

pub struct RemoteSource {
    driver: Arc<dyn ProviderDriver>,
}

impl std::fmt::Debug for RemoteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSource")
            .field("driver", &self.driver.name())
            .finish()
    }
}

impl RemoteSource {
    pub fn new(driver: Arc<dyn ProviderDriver>) -> Self {
        Self { driver }
    }

    pub fn name(&self) -> &'static str {
        self.driver.name()
    }

    /// Every `schemas/*.json`. Unparseable files are skipped.
    pub async fn schemas(&self) -> Result<Vec<Schema>, ProviderError> {
        let entries = self.driver.list_entries("schemas").await?;
        let mut schemas = Vec::new();
        for entry in entries {
            let Some(id) = entry.name.strip_suffix(".json") else {
                continue;
            };
            match self.fetch_schema(&entry.path, id).await {
                Ok(schema) => schemas.push(schema),
                Err(err) => {
                    tracing::warn!(provider = self.name(), file = %entry.path, error = %err, "skipping schema")
                }
            }
        }
        schemas.sort_by(|a, b| a.info.id.cmp(&b.info.id));
        Ok(schemas)
    }

    pub async fn schema(&self, id: &str) -> Result<Schema, ProviderError> {
        self.fetch_schema(&format!("schemas/{id}.json"), id).await
    }

    async fn fetch_schema(&self, path: &str, id: &str) -> Result<Schema, ProviderError> {
        let file = self.driver.get_file(path).await?;
        let document = serde_json::from_str(&file.content)
            .map_err(|e| ProviderError::MalformedPayload(format!("{path}: {e}")))?;
        Ok(Schema::from_document(id, document))
    }

    /// Templates of one schema type, or of every known schema type.
    pub async fn templates(&self, schema_type: Option<&str>) -> Result<Vec<TemplateInfo>, ProviderError> {
        let types = match schema_type {
            Some(ty) => vec![ty.to_string()],
            None => self
                .schemas()
                .await?
                .into_iter()
                .map(|s| s.info.id)
                .collect(),
        };

        let mut templates = Vec::new();
        for ty in types {
            let entries = match self.driver.list_entries(&format!("templates/{ty}")).await {
                Ok(entries) => entries,
                Err(ProviderError::NotFound(_)) => continue,
                Err(err) => return Err(err),
            };
            for entry in entries.iter().filter(|e| naming::is_markdown(&e.name)) {
                let name = entry.name.trim_end_matches(".md");
                if let Some(template) = self.fetch_template(&ty, name).await? {
                    templates.push(template);
                }
            }
        }
        Ok(templates)
    }

    /// `templates/<schema_type>/<name>.md`, if present.
    pub async fn template(&self, schema_type: &str, name: &str) -> Result<Option<TemplateInfo>, ProviderError> {
        self.fetch_template(schema_type, name).await
    }

    async fn fetch_template(&self, schema_type: &str, name: &str) -> Result<Option<TemplateInfo>, ProviderError> {
        let path = format!("templates/{schema_type}/{name}.md");
        let file = match self.driver.get_file(&path).await {
            Ok(file) => file,
            Err(ProviderError::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err),
        };
        if file.frontmatter.is_empty() {
            tracing::warn!(provider = self.name(), file = %path, "template has no frontmatter, skipping");
            return Ok(None);
        }
        Ok(Some(TemplateInfo::new(schema_type, name, file.frontmatter, file.content)))
    }
}
