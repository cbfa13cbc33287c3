//! Text-generation backend boundary.
//!
//! The backend is a black box: prompt in, free text out, no schema. Anything
//! stronger than that (JSON extraction, retries, fallbacks) lives in the
//! proposer - this module only moves bytes and maps transport failures onto
//! [`LlmError`].

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Text backend configuration (Ollama-style endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Backend request failures. All of them feed the proposer's retry/fallback
/// path; none of them escape a variant run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("request timeout after {0} seconds")]
    Timeout(u64),

    #[error("backend returned empty response")]
    EmptyResponse,

    #[error("backend error: {0}")]
    Backend(String),
}

/// Generic text backend client.
pub trait LlmClient: Send + Sync {
    /// Send one prompt, get free text back.
    fn generate(&self, prompt: &str, temperature: f32) -> Result<String, LlmError>;
}

/// Real client: blocking HTTP against an Ollama-style `/api/generate`.
pub struct HttpLlmClient {
    config: LlmConfig,
    client: reqwest::blocking::Client,
}

impl HttpLlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to create HTTP client: {}", e))?;

        Ok(Self { config, client })
    }
}

impl LlmClient for HttpLlmClient {
    fn generate(&self, prompt: &str, temperature: f32) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.config.endpoint);

        let body = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "options": {"temperature": temperature},
        });

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.config.timeout_secs)
            } else {
                LlmError::HttpError(format!("request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            return Err(LlmError::HttpError(format!(
                "HTTP {} from backend",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|e| LlmError::Backend(format!("unreadable response body: {}", e)))?;

        let text = json
            .get("response")
            .and_then(|v| v.as_str())
            .ok_or(LlmError::EmptyResponse)?;

        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(text.to_string())
    }
}

/// Fake backend for testing: scripted queue of replies.
pub struct FakeLlmClient {
    responses: std::sync::Mutex<Vec<Result<String, LlmError>>>,
    call_count: std::sync::Mutex<usize>,
}

impl FakeLlmClient {
    /// Create a fake client with pre-defined responses. A single entry is
    /// returned on every call; multiple entries are consumed in order, and
    /// an exhausted queue reads as [`LlmError::EmptyResponse`].
    pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses),
            call_count: std::sync::Mutex::new(0),
        }
    }

    /// Fake client that always returns the same text.
    pub fn always_text(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    /// Fake client that always fails.
    pub fn always_error(error: LlmError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl LlmClient for FakeLlmClient {
    fn generate(&self, _prompt: &str, _temperature: f32) -> Result<String, LlmError> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        if responses.len() == 1 {
            responses[0].clone()
        } else {
            responses.remove(0)
        }
    }
}
