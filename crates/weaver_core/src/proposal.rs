//! Mutation proposals and the reply decode protocol.
//!
//! The text backend answers in free form. This module is the only place that
//! ever looks at raw reply text: it extracts the JSON payload and produces a
//! typed [`MutationProposal`]. Everything downstream works on the typed
//! record.
//!
//! Decode protocol, in order:
//! 1. strip code-fence marker lines if present
//! 2. take the span from the first `{` to the last `}`
//! 3. if a blank line appears inside that span, cut there and re-find the
//!    closing brace (trailing prose sometimes carries stray braces)
//! 4. parse the remaining candidate as JSON

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Sentinel for narrative fields the model left out.
pub const NOT_STATED: &str = "(not stated)";

fn default_not_stated() -> String {
    NOT_STATED.to_string()
}

/// Impact text of a step: either free text or a key -> delta mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Learned {
    Text(String),
    Deltas(BTreeMap<String, Value>),
}

impl Default for Learned {
    fn default() -> Self {
        Learned::Text(String::new())
    }
}

impl Learned {
    /// Flatten to one line of text. Map form becomes "key value" pairs,
    /// which is also what the novelty predicate and the score-annotation
    /// scan run over.
    pub fn flatten(&self) -> String {
        match self {
            Learned::Text(text) => text.clone(),
            Learned::Deltas(map) => map
                .iter()
                .map(|(key, value)| match value.as_str() {
                    Some(s) => format!("{} {}", key, s),
                    None => format!("{} {}", key, value),
                })
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// `add_component` directive payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddComponent {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

/// `remove_component` directive payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveComponent {
    pub name: String,
}

/// One decoded mutation suggestion. All directives are optional and
/// independent; absent narrative fields read as [`NOT_STATED`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationProposal {
    #[serde(default = "default_not_stated")]
    pub planned: String,

    #[serde(default = "default_not_stated")]
    pub acted: String,

    #[serde(default)]
    pub learned: Learned,

    #[serde(default)]
    pub add_component: Option<AddComponent>,

    #[serde(default)]
    pub remove_component: Option<RemoveComponent>,

    #[serde(default)]
    pub update_score: Option<BTreeMap<String, Value>>,
}

impl Default for MutationProposal {
    fn default() -> Self {
        Self {
            planned: default_not_stated(),
            acted: default_not_stated(),
            learned: Learned::default(),
            add_component: None,
            remove_component: None,
            update_score: None,
        }
    }
}

/// Why a reply failed to decode.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("no JSON object found in reply")]
    NoJsonObject,

    #[error("reply JSON failed to parse: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Decode a raw backend reply into a proposal.
pub fn decode_proposal(raw: &str) -> Result<MutationProposal, DecodeError> {
    let payload = extract_json_object(raw).ok_or(DecodeError::NoJsonObject)?;
    Ok(serde_json::from_str(&payload)?)
}

/// Extract the JSON object payload from free text per the decode protocol.
/// Shared by proposal and reflection decoding.
pub fn extract_json_object(raw: &str) -> Option<String> {
    let text = strip_fence_lines(raw.trim());
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start >= end {
        return None;
    }
    let mut candidate = &text[start..=end];

    if let Some(cut) = candidate.find("\n\n") {
        let head = &candidate[..cut];
        let end = head.rfind('}')?;
        candidate = &head[..=end];
    }

    Some(candidate.to_string())
}

/// Drop code-fence marker lines (```json / ```), keep everything else.
fn strip_fence_lines(raw: &str) -> String {
    if !raw.contains("```") {
        return raw.to_string();
    }
    raw.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_fenced_reply() {
        let raw = "Sure! ```json\n{\"planned\":\"x\",\"acted\":\"y\",\"learned\":\"security +1.0\"}\n```\nThanks!";
        let proposal = decode_proposal(raw).unwrap();
        assert_eq!(proposal.planned, "x");
        assert_eq!(proposal.acted, "y");
        assert_eq!(proposal.learned, Learned::Text("security +1.0".to_string()));
        assert!(proposal.add_component.is_none());
    }

    #[test]
    fn test_decode_bare_json() {
        let raw = r#"{"planned": "p", "update_score": {"security": 0.5}}"#;
        let proposal = decode_proposal(raw).unwrap();
        assert_eq!(proposal.planned, "p");
        assert_eq!(proposal.acted, NOT_STATED);
        let deltas = proposal.update_score.unwrap();
        assert_eq!(deltas.get("security"), Some(&json!(0.5)));
    }

    #[test]
    fn test_decode_no_braces_fails() {
        let err = decode_proposal("I cannot help with that.").unwrap_err();
        assert!(matches!(err, DecodeError::NoJsonObject));
    }

    #[test]
    fn test_decode_unparseable_payload_fails() {
        let err = decode_proposal("{planned: unquoted}").unwrap_err();
        assert!(matches!(err, DecodeError::Parse(_)));
    }

    #[test]
    fn test_extract_cuts_at_blank_line() {
        // Commentary after a blank line carries a stray closing brace; the
        // candidate must end at the payload's own brace.
        let raw = "{\"planned\": \"x\"}\n\nPS: sometimes I write { weird } things";
        let payload = extract_json_object(raw).unwrap();
        assert_eq!(payload, "{\"planned\": \"x\"}");
    }

    #[test]
    fn test_decode_directives() {
        let raw = r#"{
            "planned": "swap auth",
            "acted": "replaced basic auth",
            "learned": {"security": "+1.5"},
            "add_component": {"name": "oauth", "value": "oidc"},
            "remove_component": {"name": "auth"}
        }"#;
        let proposal = decode_proposal(raw).unwrap();
        assert_eq!(proposal.add_component.unwrap().name, "oauth");
        assert_eq!(proposal.remove_component.unwrap().name, "auth");
        assert_eq!(proposal.learned.flatten(), "security +1.5");
    }

    #[test]
    fn test_learned_flatten_map_renders_values() {
        let learned = Learned::Deltas(BTreeMap::from([
            ("novelty".to_string(), json!(1.2)),
            ("security".to_string(), json!("+1.0")),
        ]));
        assert_eq!(learned.flatten(), "novelty 1.2, security +1.0");
    }

    #[test]
    fn test_missing_narrative_fields_use_sentinel() {
        let proposal = decode_proposal("{}").unwrap();
        assert_eq!(proposal.planned, NOT_STATED);
        assert_eq!(proposal.acted, NOT_STATED);
        assert_eq!(proposal.learned.flatten(), "");
    }
}
