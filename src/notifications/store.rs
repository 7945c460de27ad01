//! Notification store with file-based JSON persistence
//!
//! Directory layout:
//! ```text
//! <data_dir>/
//! ├── notifications/
//! │   ├── <notification-id>.json
//! │   └── ...
//! └── results/
//!     ├── <notification-id>.json   (latest processing result)
//!     └── ...
//! ```
//!
//! Writes are awaited so a record is on disk before the request that
//! produced it returns.

use crate::agents::PipelineResult;
use crate::error::{Error, Result};
use crate::notification::Notification;
use crate::notifications::types::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory notification store backed by JSON files
pub struct NotificationStore {
    notifications_dir: PathBuf,
    results_dir: PathBuf,
    /// Ordered by timestamp, newest first
    notifications: Arc<RwLock<Vec<Notification>>>,
    results: Arc<RwLock<HashMap<String, ProcessingRecord>>>,
}

impl NotificationStore {
    /// Open (or create) a store at the given base directory
    pub async fn new(base_dir: PathBuf) -> Result<Self> {
        let notifications_dir = base_dir.join("notifications");
        let results_dir = base_dir.join("results");

        tokio::fs::create_dir_all(&notifications_dir).await?;
        tokio::fs::create_dir_all(&results_dir).await?;

        let store = Self {
            notifications_dir,
            results_dir,
            notifications: Arc::new(RwLock::new(Vec::new())),
            results: Arc::new(RwLock::new(HashMap::new())),
        };

        store.load_from_disk().await;
        Ok(store)
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Insert or replace a notification
    pub async fn save_notification(&self, notification: &Notification) -> Result<()> {
        let path = record_path(&self.notifications_dir, &notification.id)?;
        write_json(&path, notification).await?;

        let mut notifications = self.notifications.write().await;
        notifications.retain(|n| n.id != notification.id);
        let pos = notifications
            .iter()
            .position(|n| n.timestamp <= notification.timestamp)
            .unwrap_or(notifications.len());
        notifications.insert(pos, notification.clone());

        tracing::debug!("Stored notification {}", notification.id);
        Ok(())
    }

    /// Record the outcome of a pipeline run, replacing any earlier result
    pub async fn save_result(&self, record: &ProcessingRecord) -> Result<()> {
        let path = record_path(&self.results_dir, &record.notification_id)?;
        write_json(&path, record).await?;

        self.results
            .write()
            .await
            .insert(record.notification_id.clone(), record.clone());

        tracing::debug!("Stored processing result for {}", record.notification_id);
        Ok(())
    }

    /// Persist a processed notification together with its result.
    ///
    /// When the result cannot be written the notification record is removed
    /// again, so a stored notification never stands for a run whose outcome
    /// was lost.
    pub async fn save_processed(&self, notification: &Notification, result: &PipelineResult) -> Result<()> {
        self.save_notification(notification).await?;

        if let Err(e) = self.save_result(&ProcessingRecord::from(result)).await {
            tracing::warn!("Rolling back notification {}: {}", notification.id, e);
            self.remove_notification(&notification.id).await;
            return Err(e);
        }
        Ok(())
    }

    /// Notification and its latest processing result
    pub async fn get(&self, id: &str) -> Option<NotificationDetail> {
        let notification = {
            let notifications = self.notifications.read().await;
            notifications.iter().find(|n| n.id == id).cloned()?
        };
        let processing_result = self.results.read().await.get(id).cloned();

        Some(NotificationDetail {
            notification,
            processing_result,
        })
    }

    /// Newest-first page of notification summaries
    pub async fn list(&self, skip: usize, limit: usize) -> NotificationList {
        let notifications = self.notifications.read().await;

        NotificationList {
            notifications: notifications
                .iter()
                .skip(skip)
                .take(limit)
                .map(NotificationSummary::from)
                .collect(),
            total: notifications.len(),
            skip,
            limit,
        }
    }

    pub async fn count(&self) -> usize {
        self.notifications.read().await.len()
    }

    async fn remove_notification(&self, id: &str) {
        if let Ok(path) = record_path(&self.notifications_dir, id) {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove {}: {}", path.display(), e);
                }
            }
        }
        self.notifications.write().await.retain(|n| n.id != id);
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Load all notifications and results from disk
    async fn load_from_disk(&self) {
        let mut notifications = load_json_files::<Notification>(&self.notifications_dir);
        notifications.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let results: HashMap<String, ProcessingRecord> = load_json_files::<ProcessingRecord>(&self.results_dir)
            .into_iter()
            .map(|r| (r.notification_id.clone(), r))
            .collect();

        tracing::info!(
            "Loaded {} notifications and {} processing results",
            notifications.len(),
            results.len()
        );

        *self.notifications.write().await = notifications;
        *self.results.write().await = results;
    }
}

/// File path for a record id, rejecting ids that could escape `dir`
fn record_path(dir: &Path, id: &str) -> Result<PathBuf> {
    if id.is_empty() || id.contains(|c: char| c == '/' || c == '\\') || id.starts_with('.') {
        return Err(Error::Storage(format!("Invalid record id: {}", id)));
    }
    Ok(dir.join(format!("{}.json", id)))
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| Error::Storage(format!("Failed to write {}: {}", path.display(), e)))
}

/// Load all JSON files from a directory into a Vec
fn load_json_files<T: serde::de::DeserializeOwned>(dir: &Path) -> Vec<T> {
    let mut items = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to read directory {}: {}", dir.display(), e);
            }
            return items;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(item) => items.push(item),
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", path.display(), e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
            }
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{ActionKind, Category};
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    async fn make_store() -> (NotificationStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = NotificationStore::new(dir.path().to_path_buf()).await.unwrap();
        (store, dir)
    }

    fn make_notification(id: &str, minutes_ago: i64) -> Notification {
        Notification::builder(format!("Title {}", id), "Body", "TestApp")
            .id(id)
            .timestamp(Utc::now() - Duration::minutes(minutes_ago))
            .build()
            .unwrap()
    }

    fn make_record(id: &str, category: Category, action: ActionKind) -> ProcessingRecord {
        ProcessingRecord {
            notification_id: id.to_string(),
            category,
            confidence: 0.8,
            reasoning: "test".to_string(),
            action_taken: action,
            extracted_facts: vec!["fact".to_string()],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let (store, _dir) = make_store().await;
        let n = make_notification("n-1", 0);

        store.save_notification(&n).await.unwrap();
        let detail = store.get("n-1").await.unwrap();
        assert_eq!(detail.notification, n);
        assert!(detail.processing_result.is_none());

        let record = make_record("n-1", Category::Urgent, ActionKind::Display);
        store.save_result(&record).await.unwrap();
        let detail = store.get("n-1").await.unwrap();
        assert_eq!(detail.processing_result, Some(record));
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let (store, _dir) = make_store().await;
        assert!(store.get("nonexistent").await.is_none());
    }

    #[tokio::test]
    async fn test_latest_result_wins() {
        let (store, _dir) = make_store().await;
        store.save_notification(&make_notification("n-1", 0)).await.unwrap();

        store
            .save_result(&make_record("n-1", Category::Urgent, ActionKind::Display))
            .await
            .unwrap();
        store
            .save_result(&make_record("n-1", Category::LessUrgent, ActionKind::Save))
            .await
            .unwrap();

        let result = store.get("n-1").await.unwrap().processing_result.unwrap();
        assert_eq!(result.category, Category::LessUrgent);
        assert_eq!(result.action_taken, ActionKind::Save);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_pagination() {
        let (store, _dir) = make_store().await;

        // Inserted out of order
        for (id, age) in [("b", 20), ("a", 30), ("d", 0), ("c", 10)] {
            store.save_notification(&make_notification(id, age)).await.unwrap();
        }

        let page = store.list(0, 100).await;
        let ids: Vec<&str> = page.notifications.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "c", "b", "a"]);
        assert_eq!(page.total, 4);

        let page = store.list(1, 2).await;
        let ids: Vec<&str> = page.notifications.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
        assert_eq!(page.total, 4);
        assert_eq!(page.skip, 1);
        assert_eq!(page.limit, 2);

        let page = store.list(10, 2).await;
        assert!(page.notifications.is_empty());
        assert_eq!(page.total, 4);
    }

    #[tokio::test]
    async fn test_resave_replaces() {
        let (store, _dir) = make_store().await;
        store.save_notification(&make_notification("n-1", 5)).await.unwrap();
        store.save_notification(&make_notification("n-1", 0)).await.unwrap();
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_reload_from_disk() {
        let dir = TempDir::new().unwrap();
        {
            let store = NotificationStore::new(dir.path().to_path_buf()).await.unwrap();
            store.save_notification(&make_notification("old", 10)).await.unwrap();
            store.save_notification(&make_notification("new", 0)).await.unwrap();
            store
                .save_result(&make_record("new", Category::Irrelevant, ActionKind::Block))
                .await
                .unwrap();
        }

        let store = NotificationStore::new(dir.path().to_path_buf()).await.unwrap();
        assert_eq!(store.count().await, 2);
        assert_eq!(store.list(0, 1).await.notifications[0].id, "new");

        let result = store.get("new").await.unwrap().processing_result.unwrap();
        assert_eq!(result.action_taken, ActionKind::Block);
    }

    #[tokio::test]
    async fn test_corrupt_files_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("notifications")).unwrap();
        std::fs::write(dir.path().join("notifications/bad.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("notifications/notes.txt"), "ignored").unwrap();

        let store = NotificationStore::new(dir.path().to_path_buf()).await.unwrap();
        assert_eq!(store.count().await, 0);
    }

    fn make_pipeline_result(id: &str) -> PipelineResult {
        use crate::agents::{ActionDispatcher, ClassificationResult};

        let classification = ClassificationResult::new(Category::Urgent, 0.8, "test", id).unwrap();
        let n = make_notification(id, 0);
        let action = ActionDispatcher::new().dispatch(&n, &classification, None);
        PipelineResult {
            notification_id: id.to_string(),
            classification,
            extracted_facts: vec!["User has a meeting: standup".to_string()],
            action,
            memory_count: 1,
        }
    }

    #[tokio::test]
    async fn test_save_processed() {
        let (store, _dir) = make_store().await;
        let n = make_notification("n-1", 0);

        store.save_processed(&n, &make_pipeline_result("n-1")).await.unwrap();

        let detail = store.get("n-1").await.unwrap();
        let record = detail.processing_result.unwrap();
        assert_eq!(record.category, Category::Urgent);
        assert_eq!(record.action_taken, ActionKind::Display);
        assert_eq!(record.extracted_facts, vec!["User has a meeting: standup"]);
    }

    #[tokio::test]
    async fn test_save_processed_rolls_back_on_result_failure() {
        let dir = TempDir::new().unwrap();
        let store = NotificationStore::new(dir.path().to_path_buf()).await.unwrap();

        // A plain file where the results directory should be makes the
        // result write fail.
        std::fs::remove_dir(dir.path().join("results")).unwrap();
        std::fs::write(dir.path().join("results"), "").unwrap();

        let n = make_notification("n-1", 0);
        let err = store
            .save_processed(&n, &make_pipeline_result("n-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));

        assert!(store.get("n-1").await.is_none());
        assert_eq!(store.count().await, 0);
        assert!(!dir.path().join("notifications/n-1.json").exists());
    }

    #[tokio::test]
    async fn test_invalid_id_rejected() {
        let (store, _dir) = make_store().await;
        let n = make_notification("../escape", 0);
        let err = store.save_notification(&n).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(store.count().await, 0);
    }
}
