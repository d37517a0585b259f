//! cli::commands::schemas
//!
//! Schema and template commands.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;

use super::{parse_object, print_json};
use crate::cli::args::{SchemasAction, TemplatesAction};
use crate::cli::Context;
use crate::schemas::SchemaRepository;

/// Run `body` against a freshly opened repository and destroy it after.
pub(super) async fn with_repository<F, Fut>(ctx: &Context, body: F) -> Result<()>
where
    F: FnOnce(Arc<SchemaRepository>) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let repo = ctx.open_schemas().await?;
    let result = body(Arc::clone(&repo)).await;
    repo.destroy();
    result
}

pub async fn schemas(action: SchemasAction, ctx: &Context) -> Result<()> {
    with_repository(ctx, |repo| async move {
        match action {
            SchemasAction::List => print_json(&repo.get_schemas().await),
            SchemasAction::Get { id } => print_json(&repo.get_schema(&id).await?),
        }
    })
    .await
}

pub async fn templates(action: TemplatesAction, ctx: &Context) -> Result<()> {
    with_repository(ctx, |repo| async move {
        match action {
            TemplatesAction::List { schema_type } => {
                print_json(&repo.get_templates(schema_type.as_deref()).await?)
            }
            TemplatesAction::Get { id } => print_json(&repo.get_template(&id).await?),
            TemplatesAction::Render { id, values } => {
                let values = parse_object("--values", &values)?;
                let rendered = repo.render_template(&id, &values).await?;
                println!("{rendered}");
                Ok(())
            }
            TemplatesAction::Validate { id, values } => {
                let values = parse_object("--values", &values)?;
                print_json(&repo.validate_template_values(&id, &values).await?)
            }
        }
    })
    .await
}
