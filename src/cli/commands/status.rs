//! cli::commands::status
//!
//! Read-only reports on the running configuration. Neither command talks to
//! a provider or clones anything, so both work without a token.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use super::print_json;
use crate::cli::Context;
use crate::core::config::{NamespaceSettings, SchemaSourceMode, Settings};
use crate::namespace::{NamespaceContext, NamespaceInfo};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NamespacesReport<'a> {
    settings: &'a NamespaceSettings,
    caller: &'a NamespaceContext,
    namespaces: Vec<NamespaceInfo>,
}

pub fn namespaces(ctx: &Context) -> Result<()> {
    print_json(&NamespacesReport {
        settings: &ctx.config.settings.namespaces,
        caller: &ctx.caller,
        namespaces: ctx.namespaces.list_namespaces(&ctx.caller),
    })
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct Features {
    git_platform: String,
    namespaces: bool,
    schemas: bool,
    templates: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SchemaSource {
    enabled: bool,
    mode: SchemaSourceMode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport<'a> {
    version: &'static str,
    config_file: Option<&'a Path>,
    features: Features,
    schema_repo: SchemaSource,
}

fn features(settings: &Settings) -> Features {
    Features {
        git_platform: settings.provider.platform.clone(),
        namespaces: settings.namespaces.enabled,
        schemas: settings.schema_repo.enabled,
        // Templates come from the schema repository.
        templates: settings.schema_repo.enabled,
    }
}

pub fn status(ctx: &Context) -> Result<()> {
    let settings = &ctx.config.settings;
    print_json(&StatusReport {
        version: env!("CARGO_PKG_VERSION"),
        config_file: ctx.config.loaded_from(),
        features: features(settings),
        schema_repo: SchemaSource {
            enabled: settings.schema_repo.enabled,
            mode: settings.schema_repo.mode,
        },
    })
}
