//! Evolution report rendering - clean, ASCII-only terminal output.
//!
//! Consumes the result bundle the engine returns; never called from inside
//! the engine.

use owo_colors::OwoColorize;
use serde_json::{Map, Value};
use weaver_core::variant::flavor_for;
use weaver_core::RunResult;

/// Render the full report for one completed run.
pub fn render(result: &RunResult) {
    println!();
    println!("{}", "=== EVOLUTION REPORT ===".bold());
    println!("Intent: {}", result.intent);
    println!(
        "{} variants x {} iterations",
        result.variants, result.iterations
    );

    println!();
    println!("[VARIANTS]");
    for (id, score) in result.all_scores.iter().enumerate() {
        let label = flavor_for(id).label;
        let line = format!("  variant {} ({:<12}) ranking score {:>7.2}", id, label, score);
        if id == result.top_variant.variant_id {
            println!("{} {}", line.bright_green(), "<- winner".bright_green());
        } else {
            println!("{}", line);
        }
    }
    println!(
        "  winner: composite {:.2} + novelty bonus {}",
        result.top_variant.composite_score, result.top_variant.novelty_count
    );

    let original = result.original_pattern.components().cloned().unwrap_or_default();
    let winning = result
        .top_variant
        .final_pattern
        .components()
        .cloned()
        .unwrap_or_default();

    println!();
    println!("[COMPONENT CHANGES]");
    let changes = component_changes(&original, &winning);
    if changes.is_empty() {
        println!("  (none)");
    }
    for change in &changes {
        println!("  {}", change);
    }

    println!();
    println!("[SCORE CHANGES]");
    let changes = score_changes(
        &result.original_pattern.scores(),
        &result.top_variant.final_pattern.scores(),
    );
    if changes.is_empty() {
        println!("  (none)");
    }
    for change in &changes {
        println!("  {}", change);
    }

    println!();
    println!("[STEPS]");
    for step in &result.top_variant.steps {
        println!("  {} {}", format!("[{}]", step.step_index).cyan(), step.planned);
        println!("      acted: {}", step.acted);
        println!("      learned: {}", step.learned.dimmed());
    }

    println!();
    println!("[REFLECTION]");
    println!("  {}", result.reflection.summary);
    if !result.reflection.strengths.is_empty() {
        println!("  Strengths:");
        for s in &result.reflection.strengths {
            println!("    + {}", s.green());
        }
    }
    if !result.reflection.risks.is_empty() {
        println!("  Risks:");
        for r in &result.reflection.risks {
            println!("    - {}", r.yellow());
        }
    }
}

/// Human-readable component diff lines (added / removed / changed).
fn component_changes(original: &Map<String, Value>, winning: &Map<String, Value>) -> Vec<String> {
    let mut lines = Vec::new();
    for (name, value) in winning {
        match original.get(name) {
            None => lines.push(format!("+ {} = {}", name, render_value(value))),
            Some(old) if old != value => lines.push(format!(
                "~ {}: {} -> {}",
                name,
                render_value(old),
                render_value(value)
            )),
            Some(_) => {}
        }
    }
    for name in original.keys() {
        if !winning.contains_key(name) {
            lines.push(format!("- {}", name));
        }
    }
    lines
}

/// Human-readable score diff lines with signed deltas.
fn score_changes(
    original: &std::collections::BTreeMap<String, f64>,
    winning: &std::collections::BTreeMap<String, f64>,
) -> Vec<String> {
    let mut lines = Vec::new();
    for (name, value) in winning {
        let old = original.get(name).copied().unwrap_or(0.0);
        if (value - old).abs() > f64::EPSILON {
            lines.push(format!("{}: {:.1} -> {:.1} ({:+.1})", name, old, value, value - old));
        }
    }
    for (name, old) in original {
        if !winning.contains_key(name) {
            lines.push(format!("{}: {:.1} -> (gone)", name, old));
        }
    }
    lines
}

fn render_value(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}
