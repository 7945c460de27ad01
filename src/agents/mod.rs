//! Triage agents and the pipeline that sequences them
//!
//! - [`classifier`]: urgency classification (keyword fallback or model)
//! - [`extractor`]: fact extraction into the memory store
//! - [`dispatcher`]: category-to-action mapping
//! - [`orchestrator`]: classify, extract, dispatch
//! - [`model`]: external model client and credentials

pub mod classifier;
pub mod dispatcher;
pub mod extractor;
pub mod model;
pub mod orchestrator;
mod prompts;

pub use classifier::{
    Category, ClassificationResult, Classifier, KeywordClassifier, ModelClassifier,
    IRRELEVANT_KEYWORDS, URGENT_KEYWORDS,
};
pub use dispatcher::{ActionDispatcher, ActionKind, ActionResult, ActionStatus};
pub use extractor::{tags_for, FactExtractor, KeywordExtractor, ModelExtractor};
pub use model::{Credentials, GeminiClient, ModelClient};
pub use orchestrator::{run_pipeline, Orchestrator, PipelineResult, PipelineStage};
