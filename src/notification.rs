//! Inbound notification records
//!
//! A `Notification` is the unit the pipeline triages. It is built through
//! `NotificationBuilder`, which assigns an identifier when the caller did not
//! supply one and rejects records without a title or source app.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A notification to be classified and processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification identifier
    pub id: String,
    /// Notification title
    pub title: String,
    /// Notification body/content
    pub body: String,
    /// Name of the app that generated the notification
    pub app_name: String,
    /// Android package name
    pub package_name: Option<String>,
    /// When the notification was received
    pub timestamp: DateTime<Utc>,
    /// Additional notification metadata
    #[serde(default)]
    pub extras: HashMap<String, serde_json::Value>,
}

impl Notification {
    /// Start building a notification from its required fields
    pub fn builder(
        title: impl Into<String>,
        body: impl Into<String>,
        app_name: impl Into<String>,
    ) -> NotificationBuilder {
        NotificationBuilder::new(title, body, app_name)
    }

    /// Title and body joined and lower-cased, used for keyword matching
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.body).to_lowercase()
    }
}

/// Builder for constructing `Notification` instances
pub struct NotificationBuilder {
    id: Option<String>,
    title: String,
    body: String,
    app_name: String,
    package_name: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    extras: HashMap<String, serde_json::Value>,
}

impl NotificationBuilder {
    /// Create a new builder with the required fields
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            body: body.into(),
            app_name: app_name.into(),
            package_name: None,
            timestamp: None,
            extras: HashMap::new(),
        }
    }

    /// Use an existing identifier instead of generating one
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the Android package name
    pub fn package_name(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = Some(package_name.into());
        self
    }

    /// Set the receive timestamp
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Add a metadata entry
    pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }

    /// Replace all metadata
    pub fn extras(mut self, extras: HashMap<String, serde_json::Value>) -> Self {
        self.extras = extras;
        self
    }

    /// Build the notification, returning a validation error for blank
    /// title or app name
    pub fn build(self) -> Result<Notification> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("title must not be blank".to_string()));
        }
        if self.app_name.trim().is_empty() {
            return Err(Error::Validation("app_name must not be blank".to_string()));
        }

        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => Uuid::new_v4().to_string(),
        };

        Ok(Notification {
            id,
            title: self.title,
            body: self.body,
            app_name: self.app_name,
            package_name: self.package_name,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            extras: self.extras,
        })
    }
}
