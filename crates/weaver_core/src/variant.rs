//! Variant runner: one independent evolution sequence.
//!
//! Each variant gets a flavor (bias phrase + sampling temperature) from a
//! fixed three-tier ladder, its own copy of the original pattern, and runs
//! propose -> apply -> rescan for a fixed number of iterations. The summary
//! fed to the next proposal is rebuilt from the current pattern after every
//! step, never cached.

use crate::applier::apply;
use crate::pattern::Pattern;
use crate::proposer::Proposer;
use crate::scoring::{composite_score, step_is_novel, NOVELTY_BONUS};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Exploration style of one variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flavor {
    pub label: &'static str,
    pub bias: &'static str,
    pub temperature: f32,
}

const FLAVOR_TIERS: &[Flavor] = &[
    Flavor {
        label: "conservative",
        bias: "low risk, incremental hardening of what already exists",
        temperature: 0.2,
    },
    Flavor {
        label: "balanced",
        bias: "balanced modernization, weigh payoff against disruption",
        temperature: 0.6,
    },
    Flavor {
        label: "exploratory",
        bias: "maximum novelty, unconventional combinations welcome",
        temperature: 0.95,
    },
];

/// Deterministic flavor assignment. Ids past the last tier reuse the
/// exploratory tier.
pub fn flavor_for(variant_id: usize) -> Flavor {
    FLAVOR_TIERS[variant_id.min(FLAVOR_TIERS.len() - 1)]
}

/// One applied mutation, immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub step_index: u32,
    pub planned: String,
    pub acted: String,
    pub learned: String,
}

/// Outcome of one variant run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantResult {
    pub variant_id: usize,
    pub flavor_label: String,
    pub final_pattern: Pattern,
    pub steps: Vec<Step>,
    pub composite_score: f64,
    pub novelty_count: u32,
    /// Composite plus the novelty bonus; what the orchestrator ranks on.
    pub ranking_score: f64,
}

/// Run one variant to completion. Never fails: every proposal failure path
/// already degraded to a fallback inside the proposer.
pub fn run_variant(
    proposer: &Proposer,
    original: &Pattern,
    intent: &str,
    iterations: u32,
    variant_id: usize,
) -> VariantResult {
    let flavor = flavor_for(variant_id);
    let mut pattern = original.clone();
    let mut steps: Vec<Step> = Vec::with_capacity(iterations as usize);
    let mut novelty_count = 0u32;

    for step_index in 0..iterations {
        let summary = pattern.summary();
        let proposal = proposer.propose(&summary, intent, &steps, &flavor);
        pattern = apply(&pattern, &proposal);

        let learned = proposal.learned.flatten();
        if step_is_novel(&proposal.planned, &learned) {
            novelty_count += 1;
        }

        debug!(
            "variant {} step {}/{}: {}",
            variant_id,
            step_index + 1,
            iterations,
            proposal.planned
        );

        steps.push(Step {
            step_index,
            planned: proposal.planned,
            acted: proposal.acted,
            learned,
        });
    }

    let composite = composite_score(&pattern.scores());
    let ranking_score = composite + f64::from(novelty_count) * NOVELTY_BONUS;

    VariantResult {
        variant_id,
        flavor_label: flavor.label.to_string(),
        final_pattern: pattern,
        steps,
        composite_score: composite,
        novelty_count,
        ranking_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{FakeLlmClient, LlmError};
    use crate::proposer::{fallback_proposal, FALLBACK_LEARNED};
    use serde_json::json;

    #[test]
    fn test_flavor_tiers() {
        assert_eq!(flavor_for(0).label, "conservative");
        assert_eq!(flavor_for(1).label, "balanced");
        assert_eq!(flavor_for(2).label, "exploratory");
        // Ids past the ladder reuse the exploratory tier
        assert_eq!(flavor_for(7), flavor_for(2));
    }

    #[test]
    fn test_run_variant_with_dead_backend_applies_fallback_steps() {
        // End-to-end: backend always fails, 2 iterations, so both steps come
        // from the fallback rotation.
        let original = Pattern::from_value(json!({
            "components": {"auth": "basic"},
            "scores": {}
        }))
        .unwrap();
        let client = FakeLlmClient::always_error(LlmError::HttpError("down".to_string()));
        let proposer = Proposer::new(&client);

        let result = run_variant(&proposer, &original, "secure ecommerce backend", 2, 0);

        assert_eq!(result.steps.len(), 2);
        for step in &result.steps {
            assert_eq!(step.learned, FALLBACK_LEARNED);
        }
        assert_eq!(result.steps[0].planned, fallback_proposal(0).planned);
        assert_eq!(result.steps[1].planned, fallback_proposal(1).planned);

        // Fallback learned text mentions novelty, so every step counts.
        assert_eq!(result.novelty_count, 2);

        // Fallback plans route through the keyword path.
        let components = result.final_pattern.components().unwrap();
        assert!(components.contains_key("rate_limiter"));
        assert!(components.contains_key("transport_security"));
        assert_eq!(components.get("auth"), Some(&json!("basic")));

        // Annotation scan applied "resilience +0.5, novelty +0.5" twice.
        let scores = result.final_pattern.scores();
        assert_eq!(scores.get("novelty"), Some(&1.0));
        assert_eq!(scores.get("resilience"), Some(&1.0));
        // composite = novelty 1.0 * 1.0; ranking adds the two-step bonus.
        assert!((result.composite_score - 1.0).abs() < 1e-9);
        assert!((result.ranking_score - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_run_variant_rebuilds_summary_each_step() {
        // The second proposal must see the component added by the first.
        // Scripted replies add a component, then echo nothing.
        let client = FakeLlmClient::new(vec![
            Ok(r#"{"planned": "p1", "add_component": {"name": "cache", "value": "redis"}}"#
                .to_string()),
            Ok(r#"{"planned": "p2"}"#.to_string()),
        ]);
        let proposer = Proposer::new(&client);
        let original = Pattern::new();

        let result = run_variant(&proposer, &original, "intent", 2, 1);

        assert_eq!(result.steps.len(), 2);
        assert!(result.final_pattern.components().unwrap().contains_key("cache"));
        // Two steps, one call each (no retries needed)
        assert_eq!(client.call_count(), 2);
    }

    #[test]
    fn test_run_variant_does_not_touch_original() {
        let original = Pattern::from_value(json!({"components": {"a": 1}})).unwrap();
        let client = FakeLlmClient::always_error(LlmError::EmptyResponse);
        let proposer = Proposer::new(&client);

        let _ = run_variant(&proposer, &original, "intent", 1, 0);
        assert_eq!(original.components().unwrap().len(), 1);
        assert!(original.scores().is_empty());
    }
}
