//! Mutation applier: pure state transition from (pattern, proposal) to the
//! next pattern.
//!
//! Two layers run on every step, in this order:
//! 1. the structured directives (`add_component`, `remove_component`,
//!    `update_score`)
//! 2. the legacy free-text paths: keyword routing over `planned` and the
//!    score-annotation scan over `learned`
//!
//! The free-text layer runs in addition to the directives, never instead of
//! them, and both may touch the same score key on one step. Nothing in here
//! can fail; malformed inputs degrade to no-ops.

use crate::pattern::Pattern;
use crate::proposal::MutationProposal;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Ordered keyword categories over `planned`, first match wins. Each entry:
/// (keywords, component key, canonical value).
const KEYWORD_CATEGORIES: &[(&[&str], &str, &str)] = &[
    (
        &["rate limit", "rate-limit", "throttl"],
        "rate_limiter",
        "token_bucket",
    ),
    (
        &["policy engine", "policy-as-code", "authorization polic"],
        "policy_engine",
        "opa",
    ),
    (
        &["logging", "monitoring", "observab", "telemetry"],
        "monitoring",
        "structured_logging",
    ),
    (
        &["encrypt", "tls", "mtls"],
        "transport_security",
        "tls_everywhere",
    ),
    (
        &["service mesh", "sidecar"],
        "service_mesh",
        "sidecar_proxy",
    ),
];

/// Matches `word [:] signed-number`, e.g. "security +1.0" or
/// "complexity: -0.5". The sign is mandatory; bare numbers are not deltas.
fn annotation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([A-Za-z][A-Za-z0-9_]*)\s*:?\s*([+-]\d+(?:\.\d+)?)")
            .expect("annotation regex is valid")
    })
}

/// Apply one proposal to a pattern. Pure: the input pattern is untouched.
pub fn apply(pattern: &Pattern, proposal: &MutationProposal) -> Pattern {
    let mut next = pattern.clone();
    next.ensure_sections();

    if let Some(add) = &proposal.add_component {
        // Overwrite semantics: last write wins.
        next.components_mut()
            .insert(add.name.clone(), add.value.clone());
    }

    if let Some(remove) = &proposal.remove_component {
        // Absent name is a no-op, not an error.
        next.components_mut().remove(&remove.name);
    }

    if let Some(deltas) = &proposal.update_score {
        for (name, raw) in deltas {
            match raw.as_f64() {
                Some(delta) => add_score(&mut next, name, delta),
                None => {} // non-numeric delta, skipped silently
            }
        }
    }

    apply_planned_keywords(&mut next, &proposal.planned);
    apply_learned_annotations(&mut next, &proposal.learned.flatten());

    next
}

fn add_score(pattern: &mut Pattern, name: &str, delta: f64) {
    let current = pattern
        .scores_mut()
        .get(name)
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    pattern
        .scores_mut()
        .insert(name.to_string(), Value::from(current + delta));
}

/// Legacy free-text path: route `planned` through the ordered keyword
/// categories and set the first matching category's canonical component.
fn apply_planned_keywords(pattern: &mut Pattern, planned: &str) {
    let planned = planned.to_lowercase();
    for (keywords, component, value) in KEYWORD_CATEGORIES {
        if keywords.iter().any(|k| planned.contains(k)) {
            pattern
                .components_mut()
                .insert(component.to_string(), Value::from(*value));
            return;
        }
    }
}

/// Best-effort scan of `learned` for score annotations. Layered on top of
/// `update_score`; both may adjust the same key on one step.
fn apply_learned_annotations(pattern: &mut Pattern, learned: &str) {
    for capture in annotation_regex().captures_iter(learned) {
        let word = capture[1].to_lowercase();
        if let Ok(delta) = capture[2].parse::<f64>() {
            add_score(pattern, &word, delta);
        }
    }
}
