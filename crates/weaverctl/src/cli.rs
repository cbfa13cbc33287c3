//! CLI - command-line argument parsing.
//!
//! Defines the CLI structure using clap. Keeps argument parsing separate
//! from execution logic.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Weaver CLI
#[derive(Parser)]
#[command(name = "weaverctl")]
#[command(about = "Weaver - agentic evolution of architecture patterns", long_about = None)]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Path to config file (overrides $WEAVER_CONFIG and defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Evolve a pattern toward an intent
    Evolve {
        /// Path to pattern JSON file
        pattern: PathBuf,

        /// User intent (e.g. "secure ecommerce backend")
        #[arg(long)]
        intent: String,

        /// Number of evolution steps per variant
        #[arg(long, short = 'i', default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=10))]
        iterations: u32,

        /// Number of independent variants to explore
        #[arg(long, short = 'n', default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=8))]
        variants: u32,

        /// Sampling temperature for the reflection call
        #[arg(long, default_value_t = 0.7)]
        temperature: f32,

        /// Skip the end-of-run reflection call
        #[arg(long)]
        no_reflect: bool,

        /// Write the winning pattern to this path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the raw result bundle as JSON and nothing else
        #[arg(long)]
        json: bool,
    },

    /// Browse persisted run history
    History {
        #[command(subcommand)]
        action: Option<HistoryCommands>,
    },

    /// Print a greeting from the weaver
    Hello {
        /// Greet a specific person or entity
        #[arg(long)]
        name: Option<String>,
    },

    /// Show version (hidden - use --version flag instead)
    #[command(hide = true)]
    Version,
}

/// History subcommands
#[derive(Subcommand)]
pub enum HistoryCommands {
    /// List recent runs (default)
    List {
        /// Maximum number of runs to show
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// Show one run record in full
    Show {
        /// Record id as printed by `history list`
        id: i64,
    },
}
