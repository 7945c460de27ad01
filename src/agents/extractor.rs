//! Fact extraction
//!
//! A `FactExtractor` derives short, durable statements from a notification
//! and records them in the memory store. Every derived fact is returned to
//! the caller, including facts the store rejected as duplicates.

use super::model::{reply_payload, Credentials, GeminiClient, ModelClient};
use super::prompts;
use crate::config::ModelConfig;
use crate::error::{Error, Result};
use crate::memory::MemoryStore;
use crate::notification::Notification;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Maximum body characters quoted in a delivery fact
const DELIVERY_PREVIEW_CHARS: usize = 50;

/// Tags attached to every fact derived from `notification`.
///
/// The app name (lower-cased) plus each of `meeting`, `delivery` and
/// `reminder` whose keyword appears in the title or body.
pub fn tags_for(notification: &Notification) -> Vec<String> {
    let text = notification.search_text();
    let mut tags = vec![notification.app_name.to_lowercase()];

    if text.contains("meeting") {
        tags.push("meeting".to_string());
    }
    if text.contains("package") || text.contains("delivery") {
        tags.push("delivery".to_string());
    }
    if text.contains("reminder") {
        tags.push("reminder".to_string());
    }

    tags
}

/// Pluggable fact extraction capability.
#[async_trait]
pub trait FactExtractor: Send + Sync {
    /// Derive fact strings from a notification without touching any store.
    async fn derive_facts(&self, notification: &Notification) -> Result<Vec<String>>;

    /// Human-readable name for this extractor (used in logs).
    fn name(&self) -> &str;

    /// Derive facts and record each one in `store`.
    ///
    /// Returns every derived fact, in order, whether or not the store
    /// accepted it.
    async fn extract(&self, notification: &Notification, store: &mut MemoryStore) -> Result<Vec<String>> {
        tracing::info!("Extracting facts from notification: {}", notification.title);

        let facts = self.derive_facts(notification).await?;
        let tags = tags_for(notification);

        let mut added = 0;
        for fact in &facts {
            if store.add(fact, Some(notification.id.as_str()), tags.iter().cloned()) {
                added += 1;
            }
        }

        tracing::info!(
            extractor = self.name(),
            "Extracted {} facts ({} new)",
            facts.len(),
            added
        );
        Ok(facts)
    }
}

/// Offline rule-based extractor
#[derive(Debug, Default)]
pub struct KeywordExtractor;

impl KeywordExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FactExtractor for KeywordExtractor {
    async fn derive_facts(&self, notification: &Notification) -> Result<Vec<String>> {
        let title = notification.title.to_lowercase();
        let body = notification.body.to_lowercase();
        let mut facts = Vec::new();

        if body.contains("meeting") || title.contains("meeting") {
            facts.push(format!("User has a meeting: {}", notification.title));
        }

        if body.contains("package") || body.contains("delivery") {
            let preview: String = notification.body.chars().take(DELIVERY_PREVIEW_CHARS).collect();
            facts.push(format!("User has a delivery: {}", preview));
        }

        if facts.is_empty() {
            facts.push(format!(
                "Notification from {}: {}",
                notification.app_name, notification.title
            ));
        }

        Ok(facts)
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// Extractor backed by an external model
pub struct ModelExtractor {
    client: Arc<dyn ModelClient>,
}

impl ModelExtractor {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    /// Create a Gemini-backed extractor. Fails without credentials.
    pub fn from_credentials(credentials: Option<&Credentials>, config: &ModelConfig) -> Result<Self> {
        let credentials = credentials.ok_or_else(|| {
            Error::Config(format!(
                "Model API key is required for fact extraction. Set {} or run in offline mode.",
                config.api_key_env
            ))
        })?;
        let client = GeminiClient::new(credentials.clone(), config)?;
        Ok(Self::new(Arc::new(client)))
    }
}

#[async_trait]
impl FactExtractor for ModelExtractor {
    async fn derive_facts(&self, notification: &Notification) -> Result<Vec<String>> {
        let prompt = prompts::extraction_prompt(notification);
        let reply = self.client.generate(&prompt).await?;
        parse_facts(&reply)
    }

    fn name(&self) -> &str {
        "model"
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FactsReply {
    Object { facts: Vec<String> },
    List(Vec<String>),
}

/// Parse a model's fact list, dropping blank entries
fn parse_facts(reply: &str) -> Result<Vec<String>> {
    let parsed: FactsReply = serde_json::from_str(reply_payload(reply))
        .map_err(|e| Error::Extraction(format!("Malformed model reply: {}", e)))?;

    let facts = match parsed {
        FactsReply::Object { facts } | FactsReply::List(facts) => facts,
    };

    Ok(facts
        .into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect())
}
