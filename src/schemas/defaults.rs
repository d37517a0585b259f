//! schemas::defaults
//!
//! Built-in schemas and templates served when neither the working copy nor
//! the remote API can answer.

use serde_json::json;

use super::types::{Schema, TemplateInfo};
use crate::core::types::Frontmatter;

const USER_STORY_BASIC: &str = "# {{title}}\n\n**As a** user\n**I want** {{description}}\n**So that** I can achieve my goal\n\n## Acceptance Criteria\n{{#each acceptanceCriteria}}\n- {{this}}\n{{/each}}";

const BUG_REPORT_DETAILED: &str = "# Bug: {{title}}\n\n## Description\n{{description}}\n\n## Steps to Reproduce\n{{#each steps}}\n{{@index}}. {{this}}\n{{/each}}\n\n## Expected Result\n{{expected}}\n\n## Actual Result\n{{actual}}";

pub fn schemas() -> Vec<Schema> {
    vec![
        Schema::from_document(
            "user-story",
            json!({
                "title": "User Story",
                "description": "Template for writing user stories",
                "version": "1.0.0",
                "fields": [
                    {"name": "title", "type": "string", "required": true},
                    {"name": "description", "type": "string", "required": true},
                    {"name": "acceptanceCriteria", "type": "string[]", "required": false}
                ]
            }),
        ),
        Schema::from_document(
            "bug-report",
            json!({
                "title": "Bug Report",
                "description": "Template for reporting bugs",
                "version": "1.0.0",
                "fields": [
                    {"name": "title", "type": "string", "required": true},
                    {"name": "description", "type": "string", "required": true},
                    {"name": "steps", "type": "string[]", "required": true},
                    {"name": "expected", "type": "string", "required": true},
                    {"name": "actual", "type": "string", "required": true}
                ]
            }),
        ),
    ]
}

pub fn schema(id: &str) -> Option<Schema> {
    schemas().into_iter().find(|s| s.info.id == id)
}

/// Built-in templates, optionally only those of one schema type.
pub fn templates(schema_type: Option<&str>) -> Vec<TemplateInfo> {
    let all = [
        template("user-story", "basic", "Basic User Story", "Simple user story template", USER_STORY_BASIC),
        template(
            "bug-report",
            "detailed",
            "Detailed Bug Report",
            "Comprehensive bug report template",
            BUG_REPORT_DETAILED,
        ),
    ];
    all.into_iter()
        .filter(|t| schema_type.map_or(true, |ty| t.schema_type == ty))
        .collect()
}

pub fn template_by_id(id: &str) -> Option<TemplateInfo> {
    templates(None).into_iter().find(|t| t.id == id)
}

fn template(schema_type: &str, name: &str, title: &str, description: &str, body: &str) -> TemplateInfo {
    let mut frontmatter = Frontmatter::new();
    frontmatter.insert("title".into(), json!(title));
    frontmatter.insert("description".into(), json!(description));
    TemplateInfo::new(schema_type, name, frontmatter, body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_has_a_schema() {
        for t in templates(None) {
            assert!(schema(&t.schema_type).is_some(), "{}", t.id);
        }
    }

    #[test]
    fn filter_by_type() {
        let ids: Vec<_> = templates(Some("bug-report")).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["bug-report/detailed"]);
        assert!(templates(Some("epic")).is_empty());
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(
            template_by_id("user-story/basic").unwrap().description,
            "Simple user story template"
        );
        assert!(template_by_id("user-story-basic").is_none());
        assert_eq!(schema("bug-report").unwrap().info.fields.len(), 5);
    }
}
