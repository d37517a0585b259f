//! cli::commands::files
//!
//! Document commands.
//!
//! # Example
//!
//! ```bash
//! # Page through your team's documents
//! gitmark --claims '{"sub":"alice","groups":["team-x"]}' -n team-x files list --page 2
//!
//! # Edit only the body; frontmatter and revision are taken from the current file
//! gitmark files update notes.md --content-file notes.md
//!
//! # Read an old version
//! gitmark files show notes.md --revision 4f2a9c1
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::{parse_object, print_json};
use crate::cli::args::FilesAction;
use crate::cli::Context;
use crate::core::frontmatter;
use crate::core::types::Frontmatter;
use crate::files::{CreateFile, Document, FileService, ListQuery, UpdateFile};

pub async fn files(action: FilesAction, ctx: &Context) -> Result<()> {
    let service = ctx.file_service()?;
    let namespace = ctx.target_namespace();

    match action {
        FilesAction::List {
            search,
            schema_type,
            page,
            limit,
        } => {
            let query = ListQuery {
                search,
                schema_type,
                page,
                limit,
            };
            let items = match ctx.explicit_namespace.as_deref() {
                Some(ns) if ns == ctx.namespaces.default_namespace() => {
                    service.list(&query, None).await?
                }
                Some(ns) => service.list(&query, Some(&[ns.to_string()])).await?,
                None => service.list_for(&query, &ctx.caller).await?,
            };
            print_json(&items)
        }

        FilesAction::Get { filename, revision } => {
            let doc = read(&service, &filename, revision.as_deref(), namespace).await?;
            print_json(&doc)
        }

        FilesAction::Show { filename, revision } => {
            let doc = read(&service, &filename, revision.as_deref(), namespace).await?;
            let text = frontmatter::encode(&doc.frontmatter, &doc.content);
            if text.ends_with('\n') {
                print!("{text}");
            } else {
                println!("{text}");
            }
            Ok(())
        }

        FilesAction::Create {
            filename,
            frontmatter,
            content,
            content_file,
            template,
            values,
        } => {
            let request = CreateFile {
                filename,
                namespace: namespace.map(str::to_string),
                frontmatter: parse_frontmatter(frontmatter.as_deref())?.unwrap_or_default(),
                content: read_content(content, content_file)?.unwrap_or_default(),
            };
            let outcome = match template {
                Some(template_id) => {
                    let values = match values.as_deref() {
                        Some(json) => parse_object("--values", json)?,
                        None => Frontmatter::new(),
                    };
                    let schemas = ctx.open_schemas().await?;
                    let result = service
                        .create_from_template(&schemas, &template_id, &values, request)
                        .await;
                    schemas.destroy();
                    result?
                }
                None => service.create(request).await?,
            };
            print_json(&outcome)
        }

        FilesAction::Update {
            filename,
            frontmatter,
            content,
            content_file,
            revision,
        } => {
            let frontmatter = parse_frontmatter(frontmatter.as_deref())?;
            let content = read_content(content, content_file)?;
            let request = match (frontmatter, content) {
                (Some(frontmatter), Some(content)) => UpdateFile {
                    frontmatter,
                    content,
                    revision_id: revision,
                },
                (frontmatter, content) => {
                    let current = service.get(&filename, namespace).await?;
                    UpdateFile {
                        frontmatter: frontmatter.unwrap_or(current.frontmatter),
                        content: content.unwrap_or(current.content),
                        revision_id: revision.or(current.revision_id),
                    }
                }
            };
            let outcome = service.update(&filename, request, namespace).await?;
            print_json(&outcome)
        }

        FilesAction::Delete { filename, revision } => {
            let outcome = service
                .delete(&filename, revision.as_deref(), namespace)
                .await?;
            print_json(&outcome)
        }

        FilesAction::Move {
            filename,
            new_filename,
            to_namespace,
        } => {
            if let Some(target) = to_namespace.as_deref() {
                ctx.namespaces.ensure_accessible(target, &ctx.caller)?;
            }
            let outcome = service
                .move_file(&filename, &new_filename, namespace, to_namespace.as_deref())
                .await?;
            print_json(&outcome)
        }

        FilesAction::History { filename, limit } => {
            let entries = service.history(&filename, limit, namespace).await?;
            print_json(&entries)
        }
    }
}

async fn read(
    service: &FileService,
    filename: &str,
    revision: Option<&str>,
    namespace: Option<&str>,
) -> Result<Document> {
    let doc = match revision {
        Some(revision) => service.get_at_revision(filename, revision, namespace).await?,
        None => service.get(filename, namespace).await?,
    };
    Ok(doc)
}

fn parse_frontmatter(json: Option<&str>) -> Result<Option<Frontmatter>> {
    json.map(|json| parse_object("--frontmatter", json)).transpose()
}

fn read_content(content: Option<String>, file: Option<PathBuf>) -> Result<Option<String>> {
    match (content, file) {
        (Some(content), _) => Ok(Some(content)),
        (None, Some(path)) => fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))
            .map(Some),
        (None, None) => Ok(None),
    }
}
