//! HTTP handlers for the Notifications API
//!
//! - POST   /api/v1/notifications/classify: classify only (API key)
//! - POST   /api/v1/notifications/process : full pipeline (API key)
//! - GET    /api/v1/notifications/:id     : notification + latest result
//! - GET    /api/v1/notifications         : list (skip/limit, newest first)

use crate::agents::Orchestrator;
use crate::config::MemoryMode;
use crate::error::Error;
use crate::memory::{MemoryStore, SharedMemory};
use crate::notifications::auth::{ApiKeyAuth, AuthOutcome};
use crate::notifications::store::NotificationStore;
use crate::notifications::types::*;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Default page size for listings
const DEFAULT_LIMIT: usize = 100;
/// Largest accepted page size
const MAX_LIMIT: usize = 1000;

/// Shared state for notification handlers
#[derive(Clone)]
pub struct NotificationsState {
    pub store: Arc<NotificationStore>,
    pub pipeline: Arc<Orchestrator>,
    /// Store shared by all requests; `None` gives each request a fresh one
    pub memory: Option<SharedMemory>,
    pub auth: ApiKeyAuth,
}

impl NotificationsState {
    pub fn new(
        store: Arc<NotificationStore>,
        pipeline: Arc<Orchestrator>,
        mode: MemoryMode,
        auth: ApiKeyAuth,
    ) -> Self {
        let memory = match mode {
            MemoryMode::PerRequest => None,
            MemoryMode::Shared => Some(MemoryStore::shared()),
        };
        Self {
            store,
            pipeline,
            memory,
            auth,
        }
    }
}

/// Create the notifications router with all REST endpoints
pub fn notifications_router(state: NotificationsState) -> Router {
    Router::new()
        .route("/api/v1/notifications", get(list_notifications))
        .route("/api/v1/notifications/classify", post(classify_notification))
        .route("/api/v1/notifications/process", post(process_notification))
        .route("/api/v1/notifications/:id", get(get_notification))
        .with_state(state)
}

// =============================================================================
// Query parameter types
// =============================================================================

#[derive(Debug, Deserialize)]
struct ListQuery {
    skip: Option<usize>,
    limit: Option<usize>,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/v1/notifications/classify
async fn classify_notification(
    State(state): State<NotificationsState>,
    headers: HeaderMap,
    Json(request): Json<NotificationRequest>,
) -> Response {
    if let Err(resp) = authorize(&state.auth, &headers) {
        return resp;
    }

    let notification = match request.into_notification() {
        Ok(n) => n,
        Err(e) => return error_response("classifying", e),
    };

    let classification = match &state.memory {
        Some(shared) => {
            let memory = shared.lock().await;
            state.pipeline.classify(&notification, &memory).await
        }
        None => state.pipeline.classify(&notification, &MemoryStore::new()).await,
    };
    let classification = match classification {
        Ok(c) => c,
        Err(e) => return error_response("classifying", e),
    };

    if let Err(e) = state.store.save_notification(&notification).await {
        return error_response("classifying", e);
    }

    tracing::info!(
        "Notification {} classified: {} (confidence: {})",
        notification.id,
        classification.category,
        classification.confidence()
    );
    Json(ClassificationResponse::from(classification)).into_response()
}

/// POST /api/v1/notifications/process
async fn process_notification(
    State(state): State<NotificationsState>,
    headers: HeaderMap,
    Json(request): Json<NotificationRequest>,
) -> Response {
    if let Err(resp) = authorize(&state.auth, &headers) {
        return resp;
    }

    let notification = match request.into_notification() {
        Ok(n) => n,
        Err(e) => return error_response("processing", e),
    };

    // Shared mode holds the lock for the whole run so stages see a
    // consistent store.
    let result = match &state.memory {
        Some(shared) => {
            let mut memory = shared.lock().await;
            state.pipeline.run(&notification, &mut memory).await
        }
        None => state.pipeline.run(&notification, &mut MemoryStore::new()).await,
    };
    let result = match result {
        Ok(r) => r,
        Err(e) => return error_response("processing", e),
    };

    if let Err(e) = state.store.save_processed(&notification, &result).await {
        return error_response("processing", e);
    }

    tracing::info!(
        "Notification {} processed: {} -> {}",
        notification.id,
        result.classification.category,
        result.action.action
    );
    Json(result).into_response()
}

/// GET /api/v1/notifications/:id
async fn get_notification(
    State(state): State<NotificationsState>,
    Path(id): Path<String>,
) -> Response {
    match state.store.get(&id).await {
        Some(detail) => Json(detail).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiError::not_found(format!("Notification {} not found", id))),
        )
            .into_response(),
    }
}

/// GET /api/v1/notifications
async fn list_notifications(
    State(state): State<NotificationsState>,
    Query(params): Query<ListQuery>,
) -> impl IntoResponse {
    let skip = params.skip.unwrap_or(0);
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    Json(state.store.list(skip, limit).await)
}

// =============================================================================
// Helpers
// =============================================================================

fn authorize(auth: &ApiKeyAuth, headers: &HeaderMap) -> Result<(), Response> {
    match auth.verify(headers) {
        AuthOutcome::Authenticated | AuthOutcome::NotApplicable => Ok(()),
        AuthOutcome::Missing { reason } => Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiError::unauthorized(reason)),
        )
            .into_response()),
        AuthOutcome::Invalid { reason } => {
            tracing::warn!("Rejected request with invalid API key");
            Err((StatusCode::FORBIDDEN, Json(ApiError::forbidden(reason))).into_response())
        }
    }
}

fn error_response(operation: &str, err: Error) -> Response {
    match err {
        Error::Validation(message) => {
            (StatusCode::BAD_REQUEST, Json(ApiError::bad_request(message))).into_response()
        }
        other => {
            tracing::error!("Error {} notification: {}", operation, other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::internal(format!(
                    "Error {} notification: {}",
                    operation, other
                ))),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn make_app_with(auth: ApiKeyAuth, mode: MemoryMode) -> (Router, NotificationsState, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(NotificationStore::new(dir.path().to_path_buf()).await.unwrap());
        let state = NotificationsState::new(store, Arc::new(Orchestrator::offline()), mode, auth);
        (notifications_router(state.clone()), state, dir)
    }

    async fn make_app() -> (Router, TempDir) {
        let (app, _state, dir) = make_app_with(ApiKeyAuth::disabled(), MemoryMode::PerRequest).await;
        (app, dir)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 64)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn meeting_body() -> serde_json::Value {
        serde_json::json!({
            "title": "Urgent Meeting Reminder",
            "body": "You have a meeting in 5 minutes",
            "app_name": "Calendar"
        })
    }

    #[tokio::test]
    async fn test_process_urgent_notification() {
        let (app, _dir) = make_app().await;

        let resp = app
            .clone()
            .oneshot(post("/api/v1/notifications/process", meeting_body()))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["classification"]["category"], "URGENT");
        assert_eq!(json["action"]["action"], "display");
        assert_eq!(json["action"]["status"], "success");
        assert!(!json["extracted_facts"].as_array().unwrap().is_empty());
        assert_eq!(json["memory_count"], 1);

        // Persisted with its result
        let id = json["notification_id"].as_str().unwrap();
        let resp = app
            .oneshot(get_req(&format!("/api/v1/notifications/{}", id)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let detail = body_json(resp).await;
        assert_eq!(detail["notification"]["title"], "Urgent Meeting Reminder");
        assert_eq!(detail["processing_result"]["category"], "URGENT");
        assert_eq!(detail["processing_result"]["action_taken"], "display");
    }

    #[tokio::test]
    async fn test_process_irrelevant_notification() {
        let (app, _dir) = make_app().await;

        let resp = app
            .oneshot(post(
                "/api/v1/notifications/process",
                serde_json::json!({"title": "50% off sale", "body": "Limited time", "app_name": "ShopApp"}),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["classification"]["category"], "IRRELEVANT");
        assert_eq!(json["action"]["action"], "block");
        assert!(json["extracted_facts"].as_array().unwrap().is_empty());
        assert_eq!(json["memory_count"], 0);
    }

    #[tokio::test]
    async fn test_classify_persists_without_result() {
        let (app, _dir) = make_app().await;

        let resp = app
            .clone()
            .oneshot(post("/api/v1/notifications/classify", meeting_body()))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["category"], "URGENT");
        assert_eq!(json["confidence"], 0.8);

        let id = json["notification_id"].as_str().unwrap();
        let resp = app
            .oneshot(get_req(&format!("/api/v1/notifications/{}", id)))
            .await
            .unwrap();
        let detail = body_json(resp).await;
        assert!(detail["processing_result"].is_null());
    }

    #[tokio::test]
    async fn test_blank_title_is_bad_request() {
        let (app, _dir) = make_app().await;

        let resp = app
            .oneshot(post(
                "/api/v1/notifications/process",
                serde_json::json!({"title": "  ", "body": "Body", "app_name": "App"}),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_process_accepts_null_extras_and_naive_timestamp() {
        let (app, _dir) = make_app().await;

        let resp = app
            .clone()
            .oneshot(post(
                "/api/v1/notifications/process",
                serde_json::json!({
                    "title": "Team meeting",
                    "body": "Room B",
                    "app_name": "Calendar",
                    "extras": null,
                    "timestamp": "2024-01-01T08:00:00"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let id = body_json(resp).await["notification_id"]
            .as_str()
            .unwrap()
            .to_string();
        let resp = app
            .oneshot(get_req(&format!("/api/v1/notifications/{}", id)))
            .await
            .unwrap();
        let detail = body_json(resp).await;
        assert_eq!(detail["notification"]["extras"], serde_json::json!({}));
        assert_eq!(detail["notification"]["timestamp"], "2024-01-01T08:00:00Z");
    }

    #[tokio::test]
    async fn test_classify_accepts_null_extras() {
        let (app, _dir) = make_app().await;

        let resp = app
            .oneshot(post(
                "/api/v1/notifications/classify",
                serde_json::json!({
                    "title": "50% off sale",
                    "body": "Today only",
                    "app_name": "ShopApp",
                    "extras": null
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["category"], "IRRELEVANT");
    }

    #[tokio::test]
    async fn test_get_notification_not_found() {
        let (app, _dir) = make_app().await;
        let resp = app
            .oneshot(get_req("/api/v1/notifications/nonexistent"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_list_notifications() {
        let (app, _dir) = make_app().await;

        for (title, ts) in [
            ("First", "2024-01-01T08:00:00Z"),
            ("Third", "2024-01-03T08:00:00Z"),
            ("Second", "2024-01-02T08:00:00Z"),
        ] {
            let body = serde_json::json!({
                "title": title,
                "body": "Body",
                "app_name": "App",
                "timestamp": ts
            });
            let resp = app
                .clone()
                .oneshot(post("/api/v1/notifications/process", body))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let resp = app
            .clone()
            .oneshot(get_req("/api/v1/notifications"))
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["total"], 3);
        assert_eq!(json["skip"], 0);
        assert_eq!(json["limit"], 100);
        let titles: Vec<&str> = json["notifications"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Third", "Second", "First"]);

        let resp = app
            .oneshot(get_req("/api/v1/notifications?skip=1&limit=1"))
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["total"], 3);
        assert_eq!(json["notifications"][0]["title"], "Second");
        assert_eq!(json["notifications"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_limit_clamped() {
        let (app, _dir) = make_app().await;
        let resp = app
            .oneshot(get_req("/api/v1/notifications?limit=5000"))
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["limit"], 1000);
    }

    #[tokio::test]
    async fn test_api_key_required() {
        let (app, _state, _dir) = make_app_with(ApiKeyAuth::new("secret"), MemoryMode::PerRequest).await;

        let resp = app
            .clone()
            .oneshot(post("/api/v1/notifications/process", meeting_body()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let mut req = post("/api/v1/notifications/classify", meeting_body());
        req.headers_mut().insert("x-api-key", "wrong".parse().unwrap());
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let mut req = post("/api/v1/notifications/process", meeting_body());
        req.headers_mut().insert("x-api-key", "secret".parse().unwrap());
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        // Reads are not protected
        let resp = app.oneshot(get_req("/api/v1/notifications")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_shared_memory_dedups_across_requests() {
        let (app, state, _dir) = make_app_with(ApiKeyAuth::disabled(), MemoryMode::Shared).await;

        for _ in 0..2 {
            let resp = app
                .clone()
                .oneshot(post("/api/v1/notifications/process", meeting_body()))
                .await
                .unwrap();
            let json = body_json(resp).await;
            assert_eq!(json["memory_count"], 1);
        }

        let memory = state.memory.unwrap();
        assert_eq!(memory.lock().await.count(), 1);
    }
}
