//! Composite scoring and novelty detection.
//!
//! Deterministic: a fixed linear weighting over the score map, plus a fixed
//! keyword list for novelty. No model calls in here.

use std::collections::BTreeMap;

/// (score name, weight) pairs of the composite. Missing keys read as 0.
pub const SCORE_WEIGHTS: &[(&str, f64)] = &[
    ("security", 1.5),
    ("scalability", 1.2),
    ("novelty", 1.0),
    ("complexity", -1.0),
    ("cost", -0.8),
];

/// Keywords that flag a step as novel (case-insensitive substring match
/// over planned + learned text).
pub const NOVELTY_KEYWORDS: &[&str] = &[
    "novel",
    "novelty",
    "emerging",
    "experimental",
    "unconventional",
    "cutting-edge",
    "innovative",
];

/// Bonus added to a variant's ranking score per novel step.
pub const NOVELTY_BONUS: f64 = 1.0;

/// Weighted composite of a pattern's score map.
pub fn composite_score(scores: &BTreeMap<String, f64>) -> f64 {
    SCORE_WEIGHTS
        .iter()
        .map(|(name, weight)| scores.get(*name).copied().unwrap_or(0.0) * weight)
        .sum()
}

/// Whether a step reads as novel. `learned` is the flattened text form
/// ("key value" pairs for the map shape).
pub fn step_is_novel(planned: &str, learned: &str) -> bool {
    let haystack = format!("{} {}", planned, learned).to_lowercase();
    NOVELTY_KEYWORDS.iter().any(|k| haystack.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn test_composite_weights() {
        let s = scores(&[
            ("security", 2.0),
            ("scalability", 1.0),
            ("novelty", 1.0),
            ("complexity", 1.0),
            ("cost", 1.0),
        ]);
        // 2*1.5 + 1*1.2 + 1*1.0 - 1*1.0 - 1*0.8
        assert!((composite_score(&s) - 3.4).abs() < 1e-9);
    }

    #[test]
    fn test_composite_missing_keys_default_zero() {
        assert_eq!(composite_score(&BTreeMap::new()), 0.0);
        let s = scores(&[("security", 1.0)]);
        assert!((composite_score(&s) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_composite_ignores_unknown_keys() {
        let s = scores(&[("charisma", 99.0)]);
        assert_eq!(composite_score(&s), 0.0);
    }

    #[test]
    fn test_composite_is_linear_over_disjoint_keys() {
        let a = scores(&[("security", 2.0), ("cost", 1.0)]);
        let b = scores(&[("scalability", 3.0), ("complexity", 0.5)]);
        let mut merged = a.clone();
        merged.extend(b.clone());
        let sum = composite_score(&a) + composite_score(&b);
        assert!((composite_score(&merged) - sum).abs() < 1e-9);
    }

    #[test]
    fn test_novelty_detection_case_insensitive() {
        assert!(step_is_novel("Try an Experimental queue", ""));
        assert!(step_is_novel("", "novelty +1.2"));
        assert!(!step_is_novel("Add an index", "latency -0.2"));
    }

    #[test]
    fn test_novelty_detection_over_flattened_map() {
        // Map-shaped learned flattens to "key value" pairs before matching.
        assert!(step_is_novel("swap broker", "novelty 1.2"));
    }
}
