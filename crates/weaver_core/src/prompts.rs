//! Prompt building for mutation proposals and run reflection.
//!
//! Prompts carry the bounded pattern summary, never the raw document. The
//! output rules block is shared so both calls decode with the same protocol.

use crate::variant::Step;

/// How many prior steps are replayed into a proposal prompt.
const HISTORY_WINDOW: usize = 5;

const OUTPUT_RULES: &str = r#"
=== OUTPUT RULES (MANDATORY) ===
1. Respond with ONE JSON object and nothing else.
2. No prose before or after the JSON. No markdown fences.
3. Use only the fields listed in the schema above.
4. Propose exactly one mutation per reply."#;

/// Build the mutation proposal prompt for one step.
pub fn build_mutation_prompt(summary: &str, intent: &str, history: &[Step], bias: &str) -> String {
    let mut prompt = format!(
        r#"You are an architecture evolution agent. You mutate an architecture
pattern one step at a time toward the user's intent.

Intent: {intent}
Exploration style: {bias}

Current pattern:
{summary}"#
    );

    if !history.is_empty() {
        prompt.push_str("\n\nSteps already applied:");
        let skipped = history.len().saturating_sub(HISTORY_WINDOW);
        if skipped > 0 {
            prompt.push_str(&format!("\n  ... ({} earlier steps omitted)", skipped));
        }
        for step in history.iter().skip(skipped) {
            prompt.push_str(&format!(
                "\n  [{}] planned: {} | learned: {}",
                step.step_index, step.planned, step.learned
            ));
        }
    }

    prompt.push_str(
        r#"

Propose the next single mutation as JSON with this schema:
{
  "planned": "what you intend to change and why it serves the intent",
  "acted": "what the mutation does to the pattern",
  "learned": "impact estimate, e.g. 'security +1.0, complexity +0.5'",
  "add_component": {"name": "...", "value": "..."},      (optional)
  "remove_component": {"name": "..."},                    (optional)
  "update_score": {"score_name": delta, ...}              (optional)
}"#,
    );
    prompt.push_str(OUTPUT_RULES);
    prompt
}

/// Build the end-of-run reflection prompt over the winning variant.
pub fn build_reflection_prompt(
    original_summary: &str,
    final_summary: &str,
    steps: &[Step],
    intent: &str,
) -> String {
    let mut prompt = format!(
        r#"You are reviewing one completed evolution of an architecture pattern.

Intent: {intent}

Pattern before:
{original_summary}

Pattern after:
{final_summary}

Steps taken:"#
    );

    for step in steps {
        prompt.push_str(&format!(
            "\n  [{}] planned: {} | acted: {} | learned: {}",
            step.step_index, step.planned, step.acted, step.learned
        ));
    }

    prompt.push_str(
        r#"

Summarize the journey as JSON with this schema:
{
  "summary": "2-3 sentence narrative of how the pattern changed",
  "strengths": ["what the final pattern does well", ...],
  "risks": ["what could go wrong with it", ...]
}"#,
    );
    prompt.push_str(OUTPUT_RULES);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(index: u32, planned: &str) -> Step {
        Step {
            step_index: index,
            planned: planned.to_string(),
            acted: "done".to_string(),
            learned: "security +0.5".to_string(),
        }
    }

    #[test]
    fn test_mutation_prompt_carries_summary_and_intent() {
        let prompt = build_mutation_prompt("components: auth", "secure backend", &[], "low risk");
        assert!(prompt.contains("components: auth"));
        assert!(prompt.contains("secure backend"));
        assert!(prompt.contains("low risk"));
        assert!(prompt.contains("OUTPUT RULES"));
    }

    #[test]
    fn test_mutation_prompt_windows_history() {
        let history: Vec<Step> = (0..8).map(|i| step(i, &format!("plan-{}", i))).collect();
        let prompt = build_mutation_prompt("s", "i", &history, "b");
        assert!(prompt.contains("(3 earlier steps omitted)"));
        assert!(!prompt.contains("plan-0"));
        assert!(prompt.contains("plan-3"));
        assert!(prompt.contains("plan-7"));
    }

    #[test]
    fn test_reflection_prompt_lists_all_steps() {
        let history = vec![step(0, "first"), step(1, "second")];
        let prompt = build_reflection_prompt("before", "after", &history, "intent");
        assert!(prompt.contains("first"));
        assert!(prompt.contains("second"));
        assert!(prompt.contains("\"risks\""));
    }
}
