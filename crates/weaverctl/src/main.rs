//! Weaver Control - CLI for the pattern evolution engine.
//!
//! Thin wrapper: argument parsing, config resolution, report rendering.
//! All engine work lives in weaver_core.

mod cli;
mod commands;
mod report;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, HistoryCommands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Engine logs go to stderr; reports own stdout. RUST_LOG overrides.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Evolve {
            pattern,
            intent,
            iterations,
            variants,
            temperature,
            no_reflect,
            output,
            json,
        } => commands::evolve(
            &config,
            commands::EvolveArgs {
                pattern,
                intent,
                iterations,
                variants,
                temperature,
                no_reflect,
                output,
                json,
            },
        ),
        Commands::History { action } => match action {
            Some(HistoryCommands::Show { id }) => commands::history_show(&config, id),
            Some(HistoryCommands::List { limit }) => commands::history_list(&config, limit),
            None => commands::history_list(&config, 10),
        },
        Commands::Hello { name } => {
            commands::hello(name);
            Ok(())
        }
        Commands::Version => {
            commands::version();
            Ok(())
        }
    }
}
