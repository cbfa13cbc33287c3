//! Evolution orchestrator: run N independent variants, rank them, reflect.
//!
//! Variants run sequentially over clones of the same original pattern -
//! never chained off each other. Ranking is a stable descending sort on
//! ranking score, so submission order wins ties. Loading the starting
//! pattern is the only operation allowed to fail outright; from there a run
//! always completes with a full result bundle.

use crate::llm::LlmClient;
use crate::pattern::{Pattern, PatternError};
use crate::proposer::Proposer;
use crate::reflection::{request_reflection, Reflection};
use crate::variant::{run_variant, VariantResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use tracing::info;

/// Run parameters. The run-level temperature drives the reflection request;
/// variant proposals use their flavor-tier temperature.
#[derive(Debug, Clone)]
pub struct EvolveOptions {
    pub iterations: u32,
    pub variants: u32,
    pub temperature: f32,
    pub reflect: bool,
}

impl Default for EvolveOptions {
    fn default() -> Self {
        Self {
            iterations: 3,
            variants: 3,
            temperature: 0.7,
            reflect: true,
        }
    }
}

/// The result bundle handed to rendering/persistence collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub intent: String,
    pub iterations: u32,
    pub variants: u32,
    pub original_pattern: Pattern,
    pub top_variant: VariantResult,
    /// Ranking scores in original submission order, not rank order.
    pub all_scores: Vec<f64>,
    pub reflection: Reflection,
    pub status: String,
}

/// Drives a whole evolution run against one text backend.
pub struct EvolutionEngine<'a> {
    client: &'a dyn LlmClient,
}

impl<'a> EvolutionEngine<'a> {
    pub fn new(client: &'a dyn LlmClient) -> Self {
        Self { client }
    }

    /// Load the starting pattern and evolve it. The load is the fail-fast
    /// boundary: no variant work happens on a missing or malformed file.
    pub fn evolve_file(
        &self,
        path: &Path,
        intent: &str,
        opts: &EvolveOptions,
    ) -> Result<RunResult, PatternError> {
        let pattern = Pattern::load(path)?;
        info!("pattern loaded from {}", path.display());
        Ok(self.evolve(pattern, intent, opts))
    }

    /// Evolve an already-loaded pattern. Infallible by construction: every
    /// failure below this point degrades to fallbacks.
    pub fn evolve(&self, original: Pattern, intent: &str, opts: &EvolveOptions) -> RunResult {
        let variant_count = opts.variants.max(1);
        let proposer = Proposer::new(self.client);

        let mut results: Vec<VariantResult> = Vec::with_capacity(variant_count as usize);
        for variant_id in 0..variant_count as usize {
            info!(
                "running variant {}/{} ({} iterations)",
                variant_id + 1,
                variant_count,
                opts.iterations
            );
            results.push(run_variant(
                &proposer,
                &original,
                intent,
                opts.iterations,
                variant_id,
            ));
        }

        let all_scores: Vec<f64> = results.iter().map(|v| v.ranking_score).collect();
        let winner_index = rank(&results)[0];
        let top_variant = results[winner_index].clone();
        info!(
            "variant {} wins with ranking score {:.2}",
            winner_index, top_variant.ranking_score
        );

        let reflection = if opts.reflect {
            request_reflection(self.client, &original, &top_variant, intent, opts.temperature)
        } else {
            Reflection::placeholder()
        };

        RunResult {
            intent: intent.to_string(),
            iterations: opts.iterations,
            variants: variant_count,
            original_pattern: original,
            top_variant,
            all_scores,
            reflection,
            status: "complete".to_string(),
        }
    }
}

/// Indices of `results` in rank order: descending ranking score, stable, so
/// the first-submitted variant wins ties.
fn rank(results: &[VariantResult]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..results.len()).collect();
    order.sort_by(|&a, &b| {
        results[b]
            .ranking_score
            .partial_cmp(&results[a].ranking_score)
            .unwrap_or(Ordering::Equal)
    });
    order
}
