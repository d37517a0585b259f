//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Config file to load
//! - `--claims <json>`: Act as the identity with these claims
//! - `--namespace <ns>` / `-n`: Namespace to operate in
//! - `--debug`: Enable debug logging

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gitmark - Markdown documents in GitHub, GitLab and Gitea repositories
#[derive(Parser, Debug)]
#[command(name = "gitmark")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: $GITMARK_CONFIG, then the standard locations)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Caller identity as a JSON object of claims, e.g. '{"sub":"alice"}'
    #[arg(long, global = true, value_name = "JSON")]
    pub claims: Option<String>,

    /// Namespace to operate in
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read and write documents
    #[command(
        after_help = "\
EXAMPLES:
    # List shared documents whose name mentions 'agent'
    gitmark files list --search agent

    # Create a document in your team's namespace
    gitmark --claims '{\"sub\":\"alice\",\"groups\":[\"team-x\"]}' -n team-x \\
        files create onboarding.guide.md --content '# Welcome'

    # Create a document from a template
    gitmark files create login.user-story.md --template user-story/basic \\
        --values '{\"title\":\"Login\",\"description\":\"to sign in\"}'"
    )]
    Files {
        #[command(subcommand)]
        action: FilesAction,
    },

    /// Inspect schemas
    Schemas {
        #[command(subcommand)]
        action: SchemasAction,
    },

    /// Inspect, render and check templates
    Templates {
        #[command(subcommand)]
        action: TemplatesAction,
    },

    /// Schema cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Show the namespaces open to the caller
    #[command(
        after_help = "\
EXAMPLES:
    # Namespaces of a user in two groups
    gitmark --claims '{\"sub\":\"alice\",\"groups\":[\"team-x\",\"ops\"]}' namespaces"
    )]
    Namespaces,

    /// Show enabled features and where configuration came from
    Status,
}

/// Document subcommands.
#[derive(Subcommand, Debug)]
pub enum FilesAction {
    /// List documents visible to the caller
    List {
        /// Case-insensitive text to look for in names and schema types
        #[arg(long)]
        search: Option<String>,

        /// Only documents of this schema type
        #[arg(long)]
        schema_type: Option<String>,

        /// Page number, starting at 1
        #[arg(long)]
        page: Option<usize>,

        /// Rows per page
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print a document as JSON
    Get {
        filename: String,

        /// Read the document as of this commit
        #[arg(long)]
        revision: Option<String>,
    },

    /// Print a document as markdown
    Show {
        filename: String,

        /// Read the document as of this commit
        #[arg(long)]
        revision: Option<String>,
    },

    /// Create a document
    Create {
        filename: String,

        /// Frontmatter as a JSON object
        #[arg(long, value_name = "JSON")]
        frontmatter: Option<String>,

        /// Body text
        #[arg(long, conflicts_with_all = ["content_file", "template"])]
        content: Option<String>,

        /// Read the body from a file
        #[arg(long, value_name = "PATH", conflicts_with = "template")]
        content_file: Option<PathBuf>,

        /// Render the body from this template (`schemaType/name`)
        #[arg(long, value_name = "ID")]
        template: Option<String>,

        /// Template values as a JSON object
        #[arg(long, value_name = "JSON", requires = "template")]
        values: Option<String>,
    },

    /// Replace a document's frontmatter and/or body
    Update {
        filename: String,

        /// New frontmatter as a JSON object (default: keep)
        #[arg(long, value_name = "JSON")]
        frontmatter: Option<String>,

        /// New body text (default: keep)
        #[arg(long, conflicts_with = "content_file")]
        content: Option<String>,

        /// Read the new body from a file
        #[arg(long, value_name = "PATH")]
        content_file: Option<PathBuf>,

        /// Revision the update is based on (default: current)
        #[arg(long)]
        revision: Option<String>,
    },

    /// Delete a document
    Delete {
        filename: String,

        /// Revision the delete is based on (default: current)
        #[arg(long)]
        revision: Option<String>,
    },

    /// Rename a document, optionally into another namespace
    Move {
        filename: String,
        new_filename: String,

        /// Target namespace (default: the source namespace)
        #[arg(long, value_name = "NS")]
        to_namespace: Option<String>,
    },

    /// Show the commits that touched a document
    History {
        filename: String,

        /// Maximum number of entries
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

/// Schema subcommands.
#[derive(Subcommand, Debug)]
pub enum SchemasAction {
    /// List schemas
    List,
    /// Print one schema with its document
    Get { id: String },
}

/// Template subcommands.
#[derive(Subcommand, Debug)]
pub enum TemplatesAction {
    /// List templates
    List {
        /// Only templates of this schema type
        #[arg(long)]
        schema_type: Option<String>,
    },
    /// Print one template
    Get { id: String },
    /// Render a template with values
    Render {
        id: String,
        /// Values as a JSON object
        #[arg(long, value_name = "JSON")]
        values: String,
    },
    /// Check values against a template's schema
    Validate {
        id: String,
        /// Values as a JSON object
        #[arg(long, value_name = "JSON")]
        values: String,
    },
}

/// Cache subcommands.
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Print cache and working copy status
    Stats,
    /// Drop all cached lookups
    #[command(
        after_help = "\
The cache lives in memory for a single command, so clearing it here only
confirms the schema repository opens. It has no effect on later runs."
    )]
    Clear,
}
