//! cli
//!
//! Command-line interface layer for gitmark.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and install logging
//! - Build the services once and hand them to command handlers
//! - Print results as JSON on stdout
//!
//! # Architecture
//!
//! The CLI layer is thin. It resolves the caller's namespaces from the
//! `--claims` identity, builds a [`Context`], and dispatches to handlers in
//! [`commands`], which call the [`crate::files`] and [`crate::schemas`]
//! services. Logs go to stderr so stdout stays machine-readable.

pub mod args;
pub mod commands;

pub use args::Cli;

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::auth::{AnonymousIdentityProvider, IdentityProvider, StaticIdentityProvider};
use crate::core::config::Config;
use crate::files::FileService;
use crate::forge::create_driver;
use crate::git::Git2Cloner;
use crate::namespace::{NamespaceContext, NamespaceResolver};
use crate::schemas::SchemaRepository;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let config = Config::load(cli.config.as_deref())?;
    init_logging(cli.debug, &config.settings.logging.level);
    tracing::debug!(file = ?config.loaded_from(), "configuration loaded");

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let ctx = Context::new(config, cli.claims.as_deref(), cli.namespace.as_deref()).await?;
        commands::dispatch(cli.command, &ctx).await
    })
}

/// Install the stderr log subscriber: `--debug`, else `RUST_LOG`, else the
/// configured level.
fn init_logging(debug: bool, level: &str) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Everything a command handler needs.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub namespaces: Arc<NamespaceResolver>,
    /// The caller's resolved namespaces.
    pub caller: NamespaceContext,
    /// Namespace given with `--namespace`.
    pub explicit_namespace: Option<String>,
}

impl Context {
    /// Resolve the caller and check that an explicit namespace is open to it.
    pub async fn new(config: Config, claims: Option<&str>, namespace: Option<&str>) -> Result<Self> {
        let identities: Box<dyn IdentityProvider> = match claims {
            Some(json) => Box::new(StaticIdentityProvider::from_json(json)?),
            None => Box::new(AnonymousIdentityProvider),
        };
        let identity = identities.identity().await;

        let namespaces = Arc::new(NamespaceResolver::new(config.settings.namespaces.clone()));
        let caller = namespaces.resolve(identity.as_ref());
        if let Some(namespace) = namespace {
            namespaces.ensure_accessible(namespace, &caller)?;
        }
        tracing::debug!(user_id = %caller.user_id, namespaces = ?caller.available_namespaces, "caller resolved");

        Ok(Context {
            config,
            namespaces,
            caller,
            explicit_namespace: namespace.map(str::to_string),
        })
    }

    /// Namespace documents are read from and written to: the explicit one,
    /// else the caller's own when separation is on, else the shared root.
    pub fn target_namespace(&self) -> Option<&str> {
        if let Some(namespace) = &self.explicit_namespace {
            return Some(namespace);
        }
        (self.namespaces.is_enabled() && !self.caller.is_anonymous())
            .then_some(self.caller.default_namespace.as_str())
    }

    /// Document service over the configured provider.
    pub fn file_service(&self) -> Result<FileService> {
        let driver = create_driver(&self.config.settings.provider)?;
        Ok(FileService::new(driver, Arc::clone(&self.namespaces)))
    }

    /// Open the schema repository. Callers `destroy()` it when done.
    pub async fn open_schemas(&self) -> Result<Arc<SchemaRepository>> {
        let settings = self.config.settings.schema_repo.clone();
        let remote = match (&settings.api, settings.enabled) {
            (Some(api), true) => Some(create_driver(api)?),
            _ => None,
        };
        Ok(SchemaRepository::open(settings, remote, Arc::new(Git2Cloner)).await)
    }
}
