//! Category-driven action dispatch
//!
//! | Category      | Action    | Payload                     |
//! |---------------|-----------|-----------------------------|
//! | `URGENT`      | `display` | reason                      |
//! | `IRRELEVANT`  | `block`   | reason                      |
//! | `LESS_URGENT` | `save`    | reason, extracted facts     |
//!
//! Category values arriving as loose strings go through
//! [`ActionDispatcher::dispatch_raw`]; anything that does not parse yields
//! an error-status result with action `none` instead of failing.

use super::classifier::{Category, ClassificationResult};
use crate::notification::Notification;
use serde::{Deserialize, Serialize};

/// Action taken for a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Show the notification immediately
    Display,
    /// Suppress the notification
    Block,
    /// Keep the notification for later review
    Save,
    /// No action (unrecognized category)
    None,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Display => "display",
            Self::Block => "block",
            Self::Save => "save",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Category> for ActionKind {
    fn from(category: Category) -> Self {
        match category {
            Category::Urgent => Self::Display,
            Category::Irrelevant => Self::Block,
            Category::LessUrgent => Self::Save,
        }
    }
}

/// Outcome status of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Success,
    Error,
}

/// Structured result of a dispatched action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub action: ActionKind,
    pub status: ActionStatus,
    pub notification_id: String,
    pub title: String,
    pub app_name: String,
    /// Classification reasoning behind the action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Facts saved alongside the notification (`save` only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_facts: Option<Vec<String>>,
    /// Error description (`none` only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ActionResult {
    fn for_notification(notification: &Notification, action: ActionKind, status: ActionStatus) -> Self {
        Self {
            action,
            status,
            notification_id: notification.id.clone(),
            title: notification.title.clone(),
            app_name: notification.app_name.clone(),
            reason: None,
            extracted_facts: None,
            message: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ActionStatus::Success
    }
}

/// Stateless category-to-action mapper
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionDispatcher;

impl ActionDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Dispatch the action for a classified notification.
    pub fn dispatch(
        &self,
        notification: &Notification,
        classification: &ClassificationResult,
        facts: Option<&[String]>,
    ) -> ActionResult {
        self.dispatch_category(
            notification,
            classification.category,
            &classification.reasoning,
            facts,
        )
    }

    /// Dispatch from a category given as a string.
    ///
    /// For library callers holding a category label from outside the
    /// pipeline (stored records, another classifier). The pipeline itself
    /// always goes through [`dispatch`](Self::dispatch). Unparseable values
    /// produce an error-status result naming the value.
    pub fn dispatch_raw(
        &self,
        notification: &Notification,
        category: &str,
        reasoning: &str,
        facts: Option<&[String]>,
    ) -> ActionResult {
        match category.parse::<Category>() {
            Ok(category) => self.dispatch_category(notification, category, reasoning, facts),
            Err(_) => {
                tracing::warn!(
                    notification_id = %notification.id,
                    "Unknown category: {}",
                    category
                );
                let mut result =
                    ActionResult::for_notification(notification, ActionKind::None, ActionStatus::Error);
                result.message = Some(format!("Unknown category: {}", category));
                result
            }
        }
    }

    fn dispatch_category(
        &self,
        notification: &Notification,
        category: Category,
        reasoning: &str,
        facts: Option<&[String]>,
    ) -> ActionResult {
        let action = ActionKind::from(category);
        let mut result = ActionResult::for_notification(notification, action, ActionStatus::Success);
        result.reason = Some(reasoning.to_string());

        match action {
            ActionKind::Display => {
                tracing::info!(app = %notification.app_name, "Displaying urgent notification: {}", notification.title);
            }
            ActionKind::Block => {
                tracing::info!(app = %notification.app_name, "Blocking notification: {}", notification.title);
            }
            ActionKind::Save => {
                let facts = facts.map(<[String]>::to_vec).unwrap_or_default();
                tracing::info!(
                    app = %notification.app_name,
                    facts = facts.len(),
                    "Saving notification: {}",
                    notification.title
                );
                result.extracted_facts = Some(facts);
            }
            ActionKind::None => {}
        }

        result
    }
}
