//! Pipeline orchestration
//!
//! ```text
//! Received -> Classified -> Extracted -> Dispatched -> Done
//!                       \-> Skipped  -/
//! ```
//!
//! Extraction runs only for `URGENT` and `LESS_URGENT`; `IRRELEVANT`
//! notifications are never mined for facts. Dispatch always runs. Stage
//! failures propagate to the caller unchanged.

use super::classifier::{Category, ClassificationResult, Classifier, KeywordClassifier, ModelClassifier};
use super::dispatcher::{ActionDispatcher, ActionResult};
use super::extractor::{FactExtractor, KeywordExtractor, ModelExtractor};
use super::model::Credentials;
use crate::config::ModelConfig;
use crate::error::Result;
use crate::memory::MemoryStore;
use crate::notification::Notification;
use serde::Serialize;

/// Pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Classified,
    Extracted,
    Skipped,
    Dispatched,
    Done,
}

impl PipelineStage {
    /// Stage entered after classification yields `category`
    pub fn after_classification(category: Category) -> Self {
        match category {
            Category::Urgent | Category::LessUrgent => Self::Extracted,
            Category::Irrelevant => Self::Skipped,
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Classified => "classified",
            Self::Extracted => "extracted",
            Self::Skipped => "skipped",
            Self::Dispatched => "dispatched",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Combined outcome of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub notification_id: String,
    pub classification: ClassificationResult,
    pub extracted_facts: Vec<String>,
    pub action: ActionResult,
    /// Memory store entry count after the run
    pub memory_count: usize,
}

/// Sequences classification, extraction and dispatch
pub struct Orchestrator {
    classifier: Box<dyn Classifier>,
    extractor: Box<dyn FactExtractor>,
    dispatcher: ActionDispatcher,
}

impl Orchestrator {
    /// Create from explicit stage implementations
    pub fn new(classifier: Box<dyn Classifier>, extractor: Box<dyn FactExtractor>) -> Self {
        Self {
            classifier,
            extractor,
            dispatcher: ActionDispatcher::new(),
        }
    }

    /// Keyword-rule pipeline requiring no credentials
    pub fn offline() -> Self {
        Self::new(Box::new(KeywordClassifier::new()), Box::new(KeywordExtractor::new()))
    }

    /// Select offline or model-backed stages.
    ///
    /// Outside offline mode a missing credential is a configuration error.
    pub fn from_credentials(
        credentials: Option<&Credentials>,
        offline: bool,
        config: &ModelConfig,
    ) -> Result<Self> {
        if offline {
            return Ok(Self::offline());
        }

        let classifier = ModelClassifier::from_credentials(credentials, config)?;
        let extractor = ModelExtractor::from_credentials(credentials, config)?;
        Ok(Self::new(Box::new(classifier), Box::new(extractor)))
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn extractor_name(&self) -> &str {
        self.extractor.name()
    }

    /// Classification stage only
    pub async fn classify(
        &self,
        notification: &Notification,
        store: &MemoryStore,
    ) -> Result<ClassificationResult> {
        self.classifier.classify(notification, Some(store)).await
    }

    /// Run the full pipeline for one notification.
    pub async fn run(&self, notification: &Notification, store: &mut MemoryStore) -> Result<PipelineResult> {
        tracing::info!(
            notification_id = %notification.id,
            "Processing notification: {}",
            notification.title
        );
        let mut stage = PipelineStage::Received;

        let classification = self.classifier.classify(notification, Some(&*store)).await?;
        stage = advance(stage, PipelineStage::Classified);

        let extracted_facts = match PipelineStage::after_classification(classification.category) {
            PipelineStage::Extracted => {
                let facts = self.extractor.extract(notification, store).await?;
                stage = advance(stage, PipelineStage::Extracted);
                facts
            }
            next => {
                stage = advance(stage, next);
                Vec::new()
            }
        };

        let action = self
            .dispatcher
            .dispatch(notification, &classification, Some(extracted_facts.as_slice()));
        stage = advance(stage, PipelineStage::Dispatched);

        let result = PipelineResult {
            notification_id: notification.id.clone(),
            classification,
            extracted_facts,
            action,
            memory_count: store.count(),
        };
        advance(stage, PipelineStage::Done);

        tracing::info!(
            notification_id = %result.notification_id,
            category = %result.classification.category,
            action = %result.action.action,
            "Notification processed"
        );
        Ok(result)
    }
}

fn advance(from: PipelineStage, to: PipelineStage) -> PipelineStage {
    tracing::debug!("Pipeline stage {} -> {}", from, to);
    to
}

/// Run one notification through a freshly selected pipeline.
///
/// Uses `store` when given, otherwise a new empty store. Without
/// credentials the pipeline falls back to offline mode.
pub async fn run_pipeline(
    notification: &Notification,
    store: Option<&mut MemoryStore>,
    credentials: Option<&Credentials>,
    offline: bool,
) -> Result<PipelineResult> {
    if !offline && credentials.is_none() {
        tracing::warn!("No model credentials available, falling back to offline mode");
    }
    let offline = offline || credentials.is_none();
    let orchestrator = Orchestrator::from_credentials(credentials, offline, &ModelConfig::default())?;

    let mut fresh = MemoryStore::new();
    let store = store.unwrap_or(&mut fresh);
    orchestrator.run(notification, store).await
}
