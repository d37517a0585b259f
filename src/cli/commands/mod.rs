//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Turns flags into a service request
//! 2. Calls the file service or the schema repository
//! 3. Prints the result as pretty JSON
//!
//! Handlers that open the schema repository destroy it before returning,
//! whatever the outcome, so a temporary working copy never outlives the
//! process.

mod cache;
mod files;
mod schemas;
mod status;

use anyhow::{bail, Context as _, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::cli::args::Command;
use crate::cli::Context;

/// Dispatch a command to its handler.
pub async fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Files { action } => files::files(action, ctx).await,
        Command::Schemas { action } => schemas::schemas(action, ctx).await,
        Command::Templates { action } => schemas::templates(action, ctx).await,
        Command::Cache { action } => cache::cache(action, ctx).await,
        Command::Namespaces => status::namespaces(ctx),
        Command::Status => status::status(ctx),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse a flag value that must be a JSON object.
fn parse_object(flag: &str, json: &str) -> Result<Map<String, Value>> {
    let value: Value =
        serde_json::from_str(json).with_context(|| format!("{flag} is not valid JSON"))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("{flag} must be a JSON object"),
    }
}
