//! Deduplicating fact store
//!
//! An append log of `MemoryEntry` values in insertion order. Two entries
//! never share the same trimmed, case-folded content; a duplicate `add` is
//! rejected with `false` rather than an error. The only removal path is
//! `clear`.
//!
//! `MemoryStore` itself is not synchronized. Callers that share one store
//! across concurrent pipeline runs wrap it in [`SharedMemory`].

use super::entry::{normalize, MemoryEntry};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A store shared across concurrent pipeline runs
pub type SharedMemory = Arc<Mutex<MemoryStore>>;

/// Ordered, deduplicated collection of facts
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: Vec<MemoryEntry>,
    /// Normalized content of every entry
    keys: HashSet<String>,
    last_updated: DateTime<Utc>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            keys: HashSet::new(),
            last_updated: Utc::now(),
        }
    }

    /// Wrap a new empty store for sharing across tasks
    pub fn shared() -> SharedMemory {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Append a fact unless one with equivalent content already exists.
    ///
    /// Returns `true` if the entry was added, `false` if it was a duplicate.
    pub fn add<I, S>(&mut self, content: &str, source_notification_id: Option<&str>, tags: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.keys.insert(normalize(content)) {
            tracing::debug!("Duplicate memory entry skipped: {}", preview(content));
            return false;
        }

        let tags: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
        let entry = MemoryEntry::new(content, source_notification_id.map(str::to_string), tags);
        self.entries.push(entry);
        self.last_updated = Utc::now();

        tracing::debug!("Added memory entry: {}", preview(content));
        true
    }

    /// The last `limit` entries, oldest first
    pub fn recent(&self, limit: usize) -> &[MemoryEntry] {
        let start = self.entries.len().saturating_sub(limit);
        &self.entries[start..]
    }

    /// Entries whose content contains `query`, case-insensitively.
    ///
    /// An empty query matches every entry.
    pub fn search(&self, query: &str) -> Vec<&MemoryEntry> {
        let query = query.to_lowercase();
        let matches: Vec<&MemoryEntry> = self
            .entries
            .iter()
            .filter(|e| e.content.to_lowercase().contains(&query))
            .collect();
        tracing::debug!("Found {} memory entries matching '{}'", matches.len(), query);
        matches
    }

    /// Entries carrying at least one of `tags`
    pub fn by_tags<I, S>(&self, tags: I) -> Vec<&MemoryEntry>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wanted: HashSet<String> = tags.into_iter().map(|t| t.as_ref().to_string()).collect();
        self.entries
            .iter()
            .filter(|e| e.has_any_tag(wanted.iter().map(String::as_str)))
            .collect()
    }

    /// Copy of every entry in insertion order
    pub fn all(&self) -> Vec<MemoryEntry> {
        self.entries.clone()
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.keys.clear();
        self.last_updated = Utc::now();
        tracing::info!("All memories cleared");
    }

    /// Number of entries
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time of the last successful add or clear
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn preview(content: &str) -> String {
    content.chars().take(50).collect()
}
