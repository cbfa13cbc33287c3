//! End-of-run reflection: one backend call summarizing the winner's journey.
//!
//! Same decode protocol as proposals, single attempt, and a fixed
//! placeholder record on any failure. A missing narrative never fails a run.

use crate::llm::LlmClient;
use crate::pattern::Pattern;
use crate::proposal::extract_json_object;
use crate::prompts;
use crate::variant::VariantResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

pub const PLACEHOLDER_SUMMARY: &str = "Reflection unavailable; the run completed without a narrative.";

/// Decoded reflection payload plus the raw JSON for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reflection {
    pub summary: String,
    pub strengths: Vec<String>,
    pub risks: Vec<String>,
    /// Full decoded payload, persisted verbatim in the history store.
    pub raw: Value,
}

#[derive(Debug, Deserialize)]
struct ReflectionPayload {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    risks: Vec<String>,
}

impl Reflection {
    /// Fixed record used when the backend fails or answers garbage.
    pub fn placeholder() -> Self {
        let raw = serde_json::json!({
            "summary": PLACEHOLDER_SUMMARY,
            "strengths": [],
            "risks": [],
        });
        Self {
            summary: PLACEHOLDER_SUMMARY.to_string(),
            strengths: Vec::new(),
            risks: Vec::new(),
            raw,
        }
    }
}

/// Request a reflection over the winning variant. Never fails.
pub fn request_reflection(
    client: &dyn LlmClient,
    original: &Pattern,
    winner: &VariantResult,
    intent: &str,
    temperature: f32,
) -> Reflection {
    let prompt = prompts::build_reflection_prompt(
        &original.summary(),
        &winner.final_pattern.summary(),
        &winner.steps,
        intent,
    );

    let reply = match client.generate(&prompt, temperature) {
        Ok(reply) => reply,
        Err(e) => {
            warn!("reflection request failed: {}", e);
            return Reflection::placeholder();
        }
    };

    decode_reflection(&reply).unwrap_or_else(|| {
        warn!("reflection reply did not decode, using placeholder");
        Reflection::placeholder()
    })
}

fn decode_reflection(reply: &str) -> Option<Reflection> {
    let payload = extract_json_object(reply)?;
    let raw: Value = serde_json::from_str(&payload).ok()?;
    let typed: ReflectionPayload = serde_json::from_value(raw.clone()).ok()?;
    Some(Reflection {
        summary: typed.summary,
        strengths: typed.strengths,
        risks: typed.risks,
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{FakeLlmClient, LlmError};
    use crate::proposer::Proposer;
    use crate::variant::run_variant;

    fn winner() -> VariantResult {
        let client = FakeLlmClient::always_error(LlmError::EmptyResponse);
        let proposer = Proposer::new(&client);
        run_variant(&proposer, &Pattern::new(), "intent", 1, 0)
    }

    #[test]
    fn test_reflection_decodes_fenced_reply() {
        let client = FakeLlmClient::always_text(
            "```json\n{\"summary\": \"went well\", \"strengths\": [\"simple\"], \"risks\": []}\n```",
        );
        let reflection = request_reflection(&client, &Pattern::new(), &winner(), "intent", 0.7);
        assert_eq!(reflection.summary, "went well");
        assert_eq!(reflection.strengths, vec!["simple".to_string()]);
        assert!(reflection.risks.is_empty());
        assert_eq!(reflection.raw["summary"], "went well");
    }

    #[test]
    fn test_reflection_backend_failure_yields_placeholder() {
        let client = FakeLlmClient::always_error(LlmError::Timeout(60));
        let reflection = request_reflection(&client, &Pattern::new(), &winner(), "intent", 0.7);
        assert_eq!(reflection.summary, PLACEHOLDER_SUMMARY);
        assert!(reflection.strengths.is_empty());
        assert!(reflection.risks.is_empty());
    }

    #[test]
    fn test_reflection_garbage_reply_yields_placeholder() {
        let client = FakeLlmClient::always_text("no json in sight");
        let reflection = request_reflection(&client, &Pattern::new(), &winner(), "intent", 0.7);
        assert_eq!(reflection.summary, PLACEHOLDER_SUMMARY);
    }

    #[test]
    fn test_reflection_is_single_attempt() {
        let client = FakeLlmClient::always_error(LlmError::EmptyResponse);
        let _ = request_reflection(&client, &Pattern::new(), &winner(), "intent", 0.7);
        // One reflection call; the winner() helper used its own client.
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn test_placeholder_raw_matches_fields() {
        let placeholder = Reflection::placeholder();
        assert_eq!(placeholder.raw["summary"], PLACEHOLDER_SUMMARY);
        assert_eq!(placeholder.raw["strengths"], serde_json::json!([]));
    }
}
