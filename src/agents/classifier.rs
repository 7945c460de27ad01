//! Notification urgency classification
//!
//! `Classifier` is a pluggable capability with two variants chosen at
//! construction time:
//!
//! - `KeywordClassifier`: the offline fallback. Urgent keywords are checked
//!   first, then irrelevant keywords; anything else is `LESS_URGENT`.
//! - `ModelClassifier`: asks an external model, using recent memories as
//!   context. Requires credentials.
//!
//! Classifiers read the memory store but never write to it.

use super::model::{reply_payload, Credentials, GeminiClient, ModelClient};
use super::prompts;
use crate::config::ModelConfig;
use crate::error::{Error, Result};
use crate::memory::MemoryStore;
use crate::notification::Notification;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Keywords that mark a notification as urgent (checked first)
pub const URGENT_KEYWORDS: &[&str] = &["urgent", "alert", "security", "meeting", "reminder", "important"];

/// Keywords that mark a notification as irrelevant
pub const IRRELEVANT_KEYWORDS: &[&str] = &["sale", "promotion", "discount", "spam", "ad"];

/// Confidence reported by the keyword fallback
pub const KEYWORD_CONFIDENCE: f64 = 0.8;

/// Urgency category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Needs immediate attention
    Urgent,
    /// Spam, ads, noise
    Irrelevant,
    /// Informative, can wait
    LessUrgent,
}

impl Category {
    /// Wire name of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "URGENT",
            Self::Irrelevant => "IRRELEVANT",
            Self::LessUrgent => "LESS_URGENT",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "URGENT" => Ok(Self::Urgent),
            "IRRELEVANT" => Ok(Self::Irrelevant),
            "LESS_URGENT" => Ok(Self::LessUrgent),
            _ => Err(format!("unknown category: {}", s)),
        }
    }
}

/// Result of classifying one notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    /// Classified category
    pub category: Category,
    /// Confidence score (0.0 to 1.0)
    confidence: f64,
    /// Explanation for the classification
    pub reasoning: String,
    /// Identifier of the classified notification
    pub notification_id: String,
}

impl ClassificationResult {
    /// Create a result, rejecting confidence outside `[0.0, 1.0]`
    pub fn new(
        category: Category,
        confidence: f64,
        reasoning: impl Into<String>,
        notification_id: impl Into<String>,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(Error::Validation(format!(
                "confidence must be within [0.0, 1.0], got {}",
                confidence
            )));
        }

        Ok(Self {
            category,
            confidence,
            reasoning: reasoning.into(),
            notification_id: notification_id.into(),
        })
    }

    /// Confidence score
    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// Pluggable classification capability.
///
/// Implementations must be deterministic for identical input under the same
/// model version.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify a notification, optionally using stored memories as context.
    async fn classify(
        &self,
        notification: &Notification,
        context: Option<&MemoryStore>,
    ) -> Result<ClassificationResult>;

    /// Human-readable name for this classifier (used in logs).
    fn name(&self) -> &str;
}

/// Offline keyword-containment classifier
#[derive(Debug, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Category chosen by keyword containment over title and body
    pub fn categorize(&self, notification: &Notification) -> Category {
        let text = notification.search_text();

        if URGENT_KEYWORDS.iter().any(|k| text.contains(k)) {
            Category::Urgent
        } else if IRRELEVANT_KEYWORDS.iter().any(|k| text.contains(k)) {
            Category::Irrelevant
        } else {
            Category::LessUrgent
        }
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(
        &self,
        notification: &Notification,
        _context: Option<&MemoryStore>,
    ) -> Result<ClassificationResult> {
        tracing::info!(
            "Classifying notification: {} from {}",
            notification.title,
            notification.app_name
        );

        let result = ClassificationResult::new(
            self.categorize(notification),
            KEYWORD_CONFIDENCE,
            format!("Classified based on content analysis of '{}'", notification.title),
            notification.id.clone(),
        )?;

        tracing::info!(
            "Classification result: {} (confidence: {})",
            result.category,
            result.confidence
        );
        Ok(result)
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// Classifier backed by an external model
pub struct ModelClassifier {
    client: Arc<dyn ModelClient>,
    context_window: usize,
}

impl ModelClassifier {
    /// Create from any model client
    pub fn new(client: Arc<dyn ModelClient>, context_window: usize) -> Self {
        Self {
            client,
            context_window,
        }
    }

    /// Create a Gemini-backed classifier. Fails without credentials.
    pub fn from_credentials(credentials: Option<&Credentials>, config: &ModelConfig) -> Result<Self> {
        let credentials = credentials.ok_or_else(|| {
            Error::Config(format!(
                "Model API key is required for classification. Set {} or run in offline mode.",
                config.api_key_env
            ))
        })?;
        let client = GeminiClient::new(credentials.clone(), config)?;
        Ok(Self::new(Arc::new(client), config.context_window))
    }
}

#[async_trait]
impl Classifier for ModelClassifier {
    async fn classify(
        &self,
        notification: &Notification,
        context: Option<&MemoryStore>,
    ) -> Result<ClassificationResult> {
        tracing::info!(
            model = self.client.model(),
            "Classifying notification: {} from {}",
            notification.title,
            notification.app_name
        );

        let recent = context.map(|s| s.recent(self.context_window)).unwrap_or(&[]);
        let prompt = prompts::classification_prompt(notification, recent);
        let reply = self.client.generate(&prompt).await?;
        let result = parse_classification(&reply, &notification.id)?;

        tracing::info!(
            "Classification result: {} (confidence: {})",
            result.category,
            result.confidence
        );
        Ok(result)
    }

    fn name(&self) -> &str {
        "model"
    }
}

#[derive(Debug, Deserialize)]
struct ClassificationReply {
    category: String,
    confidence: f64,
    #[serde(default)]
    reasoning: String,
}

/// Parse a model's JSON classification reply
fn parse_classification(reply: &str, notification_id: &str) -> Result<ClassificationResult> {
    let parsed: ClassificationReply = serde_json::from_str(reply_payload(reply))
        .map_err(|e| Error::Classification(format!("Malformed model reply: {}", e)))?;

    let category = parsed
        .category
        .parse::<Category>()
        .map_err(Error::Classification)?;

    ClassificationResult::new(category, parsed.confidence, parsed.reasoning, notification_id)
}
