//! Wire and record types for the Notifications API
//!
//! Field names are snake_case on the wire.

use crate::agents::{ActionKind, Category, ClassificationResult, PipelineResult};
use crate::error::Result;
use crate::notification::Notification;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request body for classify/process
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub app_name: String,
    #[serde(default)]
    pub package_name: Option<String>,
    #[serde(default)]
    pub timestamp: Option<RequestTimestamp>,
    #[serde(default)]
    pub extras: Option<HashMap<String, serde_json::Value>>,
}

/// Receive time as sent by a client.
///
/// Timestamps without an offset are read as UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RequestTimestamp {
    Zoned(DateTime<Utc>),
    Naive(NaiveDateTime),
}

impl From<RequestTimestamp> for DateTime<Utc> {
    fn from(ts: RequestTimestamp) -> Self {
        match ts {
            RequestTimestamp::Zoned(dt) => dt,
            RequestTimestamp::Naive(naive) => naive.and_utc(),
        }
    }
}

impl NotificationRequest {
    /// Validate and convert into a `Notification` with a fresh id
    pub fn into_notification(self) -> Result<Notification> {
        let mut builder = Notification::builder(self.title, self.body, self.app_name)
            .extras(self.extras.unwrap_or_default());
        if let Some(package_name) = self.package_name {
            builder = builder.package_name(package_name);
        }
        if let Some(timestamp) = self.timestamp {
            builder = builder.timestamp(timestamp.into());
        }
        builder.build()
    }
}

/// Response body for classification only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResponse {
    pub notification_id: String,
    pub category: Category,
    pub confidence: f64,
    pub reasoning: String,
}

impl From<ClassificationResult> for ClassificationResponse {
    fn from(result: ClassificationResult) -> Self {
        Self {
            confidence: result.confidence(),
            notification_id: result.notification_id,
            category: result.category,
            reasoning: result.reasoning,
        }
    }
}

/// Persisted outcome of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingRecord {
    pub notification_id: String,
    pub category: Category,
    pub confidence: f64,
    pub reasoning: String,
    pub action_taken: ActionKind,
    pub extracted_facts: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&PipelineResult> for ProcessingRecord {
    fn from(result: &PipelineResult) -> Self {
        Self {
            notification_id: result.notification_id.clone(),
            category: result.classification.category,
            confidence: result.classification.confidence(),
            reasoning: result.classification.reasoning.clone(),
            action_taken: result.action.action,
            extracted_facts: result.extracted_facts.clone(),
            created_at: Utc::now(),
        }
    }
}

/// A notification with its latest processing result
#[derive(Debug, Clone, Serialize)]
pub struct NotificationDetail {
    pub notification: Notification,
    pub processing_result: Option<ProcessingRecord>,
}

/// Listing entry
#[derive(Debug, Clone, Serialize)]
pub struct NotificationSummary {
    pub id: String,
    pub title: String,
    pub app_name: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Notification> for NotificationSummary {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id.clone(),
            title: n.title.clone(),
            app_name: n.app_name.clone(),
            timestamp: n.timestamp,
        }
    }
}

/// Offset-paginated listing
#[derive(Debug, Clone, Serialize)]
pub struct NotificationList {
    pub notifications: Vec<NotificationSummary>,
    pub total: usize,
    pub skip: usize,
    pub limit: usize,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

/// API error detail
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}
