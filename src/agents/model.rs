//! External model access
//!
//! `ModelClient` is the seam between the model-backed agents and whatever
//! generates text for them. `GeminiClient` talks to the Gemini
//! `generateContent` endpoint; tests substitute an in-process fake.

use crate::config::{env_value, ModelConfig};
use crate::error::{Error, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Model API credential.
///
/// Zeroized on drop and redacted in `Debug` output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    /// Wrap an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Read the API key from an environment variable; `None` when unset or blank
    pub fn from_env(var: &str) -> Option<Self> {
        env_value(var).map(Self::new)
    }

    /// Access the raw key (for request signing only)
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Text generation backend used by the model-backed agents.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate a reply for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier (used in logs).
    fn model(&self) -> &str;
}

/// Gemini `generateContent` client
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    credentials: Credentials,
}

impl GeminiClient {
    /// Create a client from credentials and model configuration
    pub fn new(credentials: Credentials, config: &ModelConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            credentials,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": 0.0,
                "responseMimeType": "application/json",
            },
        });

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", self.credentials.api_key())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Model(format!(
                "{} returned {}: {}",
                self.model, status, detail
            )));
        }

        let reply: GenerateContentResponse = response.json().await?;
        reply
            .text()
            .ok_or_else(|| Error::Model(format!("{} returned no text", self.model)))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Strip a Markdown code fence around a model reply, if present.
pub(crate) fn reply_payload(reply: &str) -> &str {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[a-zA-Z]*\s*(.*?)\s*```").expect("fence pattern is valid")
    });

    match fence.captures(reply).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => reply.trim(),
    }
}
