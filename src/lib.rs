//! Focus Filter - notification triage with fact memory
//!
//! Focus Filter takes an inbound notification, decides how urgent it is,
//! remembers durable facts from it, and dispatches an action: display,
//! block or save for later.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     HTTP API (axum)                          │
//! │   /api/v1/notifications/{classify,process,:id}               │
//! │   X-API-Key check ── NotificationStore (JSON files)          │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ Notification
//! ┌──────────────────────────────▼───────────────────────────────┐
//! │                       Orchestrator                           │
//! │                                                              │
//! │   Classifier ──► URGENT / LESS_URGENT ──► FactExtractor      │
//! │       │                                       │              │
//! │       └──────► IRRELEVANT (skip) ─────────────┤              │
//! │                                               ▼              │
//! │                                      ActionDispatcher        │
//! │                                  display / block / save      │
//! └──────────────┬──────────────────────────────┬────────────────┘
//!                │ read                         │ add
//! ┌──────────────▼──────────────────────────────▼────────────────┐
//! │            MemoryStore (deduplicating fact log)              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Classification and extraction each come in two variants: keyword rules
//! that work offline, and an external model that needs an API key. The
//! variant is chosen once, when the `Orchestrator` is built.
//!
//! ## Modules
//!
//! - [`agents`]: classifier, extractor, dispatcher and the pipeline
//! - [`memory`]: fact memory store
//! - [`notification`]: notification record and builder
//! - [`notifications`]: persistence, API key check and HTTP handlers
//! - [`api`]: application router
//! - [`config`]: configuration management

pub mod agents;
pub mod api;
pub mod config;
pub mod error;
pub mod memory;
pub mod notification;
pub mod notifications;

pub use config::FocusFilterConfig;
pub use error::{Error, Result};
