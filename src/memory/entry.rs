//! Memory entry data type
//!
//! Entries are created by the fact extractor through `MemoryStore::add`
//! and are never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Importance assigned to entries unless stated otherwise
pub const DEFAULT_IMPORTANCE: f32 = 0.5;

/// A single fact extracted from a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Unique entry identifier
    pub id: Uuid,
    /// The fact text
    pub content: String,
    /// Identifier of the notification the fact came from
    pub source_notification_id: Option<String>,
    /// When the fact was extracted
    pub extracted_at: DateTime<Utc>,
    /// Tags for categorization
    pub tags: BTreeSet<String>,
    /// Importance score (0.0 to 1.0)
    pub importance: f32,
}

impl MemoryEntry {
    /// Create an entry with a fresh id, the current time and default importance
    pub fn new(
        content: impl Into<String>,
        source_notification_id: Option<String>,
        tags: BTreeSet<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            source_notification_id,
            extracted_at: Utc::now(),
            tags,
            importance: DEFAULT_IMPORTANCE,
        }
    }

    /// Content form used for duplicate detection
    pub fn normalized_content(&self) -> String {
        normalize(&self.content)
    }

    /// Whether any of the entry's tags is in `tags`
    pub fn has_any_tag<'a>(&self, tags: impl IntoIterator<Item = &'a str>) -> bool {
        tags.into_iter().any(|t| self.tags.contains(t))
    }
}

/// Trim and case-fold content for comparison
pub(crate) fn normalize(content: &str) -> String {
    content.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_defaults() {
        let entry = MemoryEntry::new("User has a meeting at 3pm", Some("notif-123".into()), BTreeSet::new());

        assert_eq!(entry.content, "User has a meeting at 3pm");
        assert_eq!(entry.source_notification_id.as_deref(), Some("notif-123"));
        assert!(entry.tags.is_empty());
        assert!((entry.importance - DEFAULT_IMPORTANCE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_normalized_content() {
        let entry = MemoryEntry::new("  Hello World \n", None, BTreeSet::new());
        assert_eq!(entry.normalized_content(), "hello world");
    }

    #[test]
    fn test_has_any_tag() {
        let tags: BTreeSet<String> = ["meeting", "calendar"].iter().map(|s| s.to_string()).collect();
        let entry = MemoryEntry::new("x", None, tags);

        assert!(entry.has_any_tag(["delivery", "meeting"]));
        assert!(!entry.has_any_tag(["delivery"]));
        assert!(!entry.has_any_tag(std::iter::empty()));
    }
}
