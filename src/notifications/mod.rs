//! Notifications module: persistence and HTTP surface around the pipeline
//!
//! Notifications and their latest processing results are persisted as JSON
//! files under the configured data directory. POST endpoints require an
//! `X-API-Key` header when an API key is configured.

pub mod auth;
pub mod handler;
pub mod store;
pub mod types;

pub use auth::{ApiKeyAuth, AuthOutcome};
pub use handler::{notifications_router, NotificationsState};
pub use store::NotificationStore;
