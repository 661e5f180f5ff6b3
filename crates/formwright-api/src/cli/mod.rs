//! CLI command definitions for the `fwr` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod activity;
pub mod form;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Design, store, and publish form definitions.
#[derive(Parser)]
#[command(name = "fwr", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Keep forms in memory for this run instead of the database.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "FORMWRIGHT_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new form through the editor.
    New {
        /// Form title.
        #[arg(short, long)]
        title: String,

        /// Optional description.
        #[arg(short, long)]
        description: Option<String>,

        /// Start as a multi-page wizard.
        #[arg(long)]
        wizard: bool,

        /// Add a field as `type:key` (repeatable). A bare key is a text field.
        #[arg(short, long = "field")]
        fields: Vec<String>,
    },

    /// List stored forms.
    #[command(alias = "ls")]
    List,

    /// Show a form and its fields.
    Show {
        /// Form ID.
        id: String,
    },

    /// Write a form's payload as JSON.
    Export {
        /// Form ID.
        id: String,

        /// Output file (stdout if omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create a form from a JSON payload file.
    Import {
        /// Path to a payload exported with `fwr export`.
        file: PathBuf,
    },

    /// Make a form publicly reachable.
    Publish {
        /// Form ID.
        id: String,
    },

    /// Withdraw a published form.
    Unpublish {
        /// Form ID.
        id: String,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
