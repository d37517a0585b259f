//! cli::commands::cache
//!
//! Schema cache commands. `stats` reports the working copy state too, which
//! makes it the quickest check that a schema repository clones.

use anyhow::Result;
use serde_json::json;

use super::print_json;
use super::schemas::with_repository;
use crate::cli::args::CacheAction;
use crate::cli::Context;

pub async fn cache(action: CacheAction, ctx: &Context) -> Result<()> {
    with_repository(ctx, |repo| async move {
        match action {
            CacheAction::Stats => {
                // Warm the cache so the counts reflect what the repository serves.
                repo.get_schemas().await;
                repo.get_templates(None).await?;
                print_json(&repo.cache_stats())
            }
            CacheAction::Clear => {
                repo.clear_cache();
                print_json(&json!({ "cleared": true, "valid": repo.is_cache_valid() }))
            }
        }
    })
    .await
}
