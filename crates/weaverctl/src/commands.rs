//! Command execution for weaverctl.

use crate::report;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use weaver_core::{
    EvolutionEngine, EvolveOptions, HttpLlmClient, RunHistory, RunRecord, WeaverConfig,
};

pub struct EvolveArgs {
    pub pattern: PathBuf,
    pub intent: String,
    pub iterations: u32,
    pub variants: u32,
    pub temperature: f32,
    pub no_reflect: bool,
    pub output: Option<PathBuf>,
    pub json: bool,
}

/// Run one evolution, render it, persist it.
pub fn evolve(config: &WeaverConfig, args: EvolveArgs) -> Result<()> {
    let client = HttpLlmClient::new(config.llm.clone())?;
    let engine = EvolutionEngine::new(&client);
    let opts = EvolveOptions {
        iterations: args.iterations,
        variants: args.variants,
        temperature: args.temperature,
        reflect: !args.no_reflect,
    };

    // The one fatal boundary: a missing or malformed pattern aborts here.
    let result = engine
        .evolve_file(&args.pattern, &args.intent, &opts)
        .with_context(|| format!("cannot evolve {}", args.pattern.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        report::render(&result);
    }

    // History failures are warnings, never fatal to a finished run.
    let persisted = RunHistory::open_configured(config.history.db_path.as_ref())
        .and_then(|history| history.persist(&result));
    match persisted {
        Ok(id) => {
            if !args.json {
                println!();
                println!("run saved to history as #{}", id);
            }
        }
        Err(e) => {
            eprintln!("{} failed to save run history: {}", "[WARNING]".yellow(), e);
        }
    }

    if let Some(output) = &args.output {
        result.top_variant.final_pattern.save(output)?;
        if !args.json {
            println!("winning pattern written to {}", output.display());
        }
    }

    Ok(())
}

/// List recent runs, newest first.
pub fn history_list(config: &WeaverConfig, limit: u32) -> Result<()> {
    let history = RunHistory::open_configured(config.history.db_path.as_ref())?;
    let records = history.list_recent(limit)?;

    if records.is_empty() {
        println!("no runs recorded yet");
        return Ok(());
    }

    println!("{}", "  id  when                  top    intent".bold());
    for record in &records {
        println!(
            "{:>4}  {}  {:>5.2}  {}",
            record.id,
            record.timestamp.format("%Y-%m-%d %H:%M UTC"),
            record.top_score,
            record.intent
        );
    }
    Ok(())
}

/// Show one run record in full.
pub fn history_show(config: &WeaverConfig, id: i64) -> Result<()> {
    let history = RunHistory::open_configured(config.history.db_path.as_ref())?;
    match history.fetch(id)? {
        Some(record) => print_record(&record),
        None => println!("no run with id {}", id),
    }
    Ok(())
}

fn print_record(record: &RunRecord) {
    println!("run #{}", record.id);
    println!("  when:       {}", record.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  intent:     {}", record.intent);
    println!(
        "  shape:      {} variants x {} iterations",
        record.variants, record.iterations
    );
    println!("  top score:  {:.2}", record.top_score);
    println!("  reflection: {}", record.reflection_summary);
    println!("  components:");
    match serde_json::from_str::<serde_json::Value>(&record.top_variant_components) {
        Ok(serde_json::Value::Object(components)) => {
            if components.is_empty() {
                println!("    (none)");
            }
            for (name, value) in components {
                println!("    {} = {}", name, value);
            }
        }
        _ => println!("    {}", record.top_variant_components),
    }
}

/// Greeting, carried over from the first weaver prototype.
pub fn hello(name: Option<String>) {
    let mut greeting =
        "Hello from Weaver! The shuttle is ready. Evolution begins...".to_string();
    if let Some(name) = name {
        greeting.push_str(&format!(" (especially for {})", name));
    }
    println!("{}", greeting.bold().cyan());
    println!("{}", "Intent: weave novelty, score it, keep the best thread.".italic());
}

pub fn version() {
    println!("weaver {}", env!("CARGO_PKG_VERSION"));
}

/// Resolve configuration for all commands; explicit path errors surface.
pub fn load_config(explicit: Option<&Path>) -> Result<WeaverConfig> {
    WeaverConfig::load(explicit)
}
