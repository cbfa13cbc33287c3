//! Loom pattern document - the JSON state under evolution.
//!
//! A pattern is a JSON object with two reserved, optionally-absent sections:
//! `components` (name -> free-form value) and `scores` (name -> number).
//! Every other top-level key passes through untouched; the engine never
//! interprets or drops it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const COMPONENTS_KEY: &str = "components";
pub const SCORES_KEY: &str = "scores";

/// Ceiling on the summary sent to the text backend. The raw document can be
/// arbitrarily large; prompts must not be.
pub const SUMMARY_MAX_CHARS: usize = 1000;

/// Errors loading a pattern file. This is the engine's one fatal boundary:
/// a run aborts before any variant work if the starting pattern is unusable.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read pattern file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in pattern file: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("pattern root must be a JSON object")]
    NotAnObject,
}

/// The pattern document. Transparent newtype over the JSON object so that
/// passthrough keys survive serialization verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pattern {
    doc: Map<String, Value>,
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a parsed JSON value. Rejects anything that is not an object.
    pub fn from_value(value: Value) -> Result<Self, PatternError> {
        match value {
            Value::Object(doc) => Ok(Self { doc }),
            _ => Err(PatternError::NotAnObject),
        }
    }

    /// Load and validate a pattern file (fail-fast).
    pub fn load(path: &Path) -> Result<Self, PatternError> {
        if !path.exists() {
            return Err(PatternError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|source| PatternError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&text).map_err(PatternError::InvalidJson)?;
        Self::from_value(value)
    }

    /// Write the pattern back as pretty JSON.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let mut text = serde_json::to_string_pretty(&self.doc)?;
        text.push('\n');
        fs::write(path, text)?;
        Ok(())
    }

    pub fn as_object(&self) -> &Map<String, Value> {
        &self.doc
    }

    /// The `components` section, if present and an object.
    pub fn components(&self) -> Option<&Map<String, Value>> {
        self.doc.get(COMPONENTS_KEY).and_then(Value::as_object)
    }

    /// Numeric entries of the `scores` section. Non-numeric values are
    /// ignored, absent section reads as empty.
    pub fn scores(&self) -> BTreeMap<String, f64> {
        let mut out = BTreeMap::new();
        if let Some(scores) = self.doc.get(SCORES_KEY).and_then(Value::as_object) {
            for (name, value) in scores {
                if let Some(n) = value.as_f64() {
                    out.insert(name.clone(), n);
                }
            }
        }
        out
    }

    /// Make sure both reserved sections exist as objects before a write.
    /// A non-object value under a reserved key is replaced by an empty
    /// object; everything else in the document is left alone.
    pub fn ensure_sections(&mut self) {
        for key in [COMPONENTS_KEY, SCORES_KEY] {
            let is_object = self.doc.get(key).map(Value::is_object).unwrap_or(false);
            if !is_object {
                self.doc.insert(key.to_string(), Value::Object(Map::new()));
            }
        }
    }

    pub fn components_mut(&mut self) -> &mut Map<String, Value> {
        self.ensure_sections();
        self.doc
            .get_mut(COMPONENTS_KEY)
            .and_then(Value::as_object_mut)
            .expect("components section ensured above")
    }

    pub fn scores_mut(&mut self) -> &mut Map<String, Value> {
        self.ensure_sections();
        self.doc
            .get_mut(SCORES_KEY)
            .and_then(Value::as_object_mut)
            .expect("scores section ensured above")
    }

    /// Deterministic, size-bounded digest of the pattern for prompt building:
    /// component names and the score map only, never the raw document.
    pub fn summary(&self) -> String {
        let component_names: Vec<&str> = self
            .components()
            .map(|c| c.keys().map(String::as_str).collect())
            .unwrap_or_default();
        let scores = self.scores();

        let components_part = if component_names.is_empty() {
            "(none)".to_string()
        } else {
            component_names.join(", ")
        };
        let scores_part = if scores.is_empty() {
            "(none)".to_string()
        } else {
            scores
                .iter()
                .map(|(name, value)| format!("{}={:.1}", name, value))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut summary = format!("components: {} | scores: {}", components_part, scores_part);
        if summary.chars().count() > SUMMARY_MAX_CHARS {
            summary = summary.chars().take(SUMMARY_MAX_CHARS).collect();
            summary.push_str("... (truncated)");
        }
        summary
    }
}
