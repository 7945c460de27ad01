//! Application router for Focus Filter
//!
//! Merges the notifications router with the root probes, and adds CORS and
//! request tracing.
//!
//! ## Endpoint Map
//!
//! | Path                                 | Description                    |
//! |--------------------------------------|--------------------------------|
//! | `/`                                  | Service banner                 |
//! | `/health`                            | Load balancer health probe     |
//! | `/api/v1/notifications`              | List notifications             |
//! | `/api/v1/notifications/:id`          | Notification + latest result   |
//! | `/api/v1/notifications/classify`     | Classify only                  |
//! | `/api/v1/notifications/process`      | Full pipeline                  |

use crate::notifications::{notifications_router, NotificationsState};
use axum::{
    http::{header::{self, HeaderName}, HeaderValue, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the complete Focus Filter HTTP application
///
/// Merges all routers, adds CORS and tracing middleware, and returns a
/// single `Router` ready to be served by `axum::serve`.
pub fn build_app(notifications_state: NotificationsState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(notifications_router(notifications_state))
        .layer(build_cors(cors_origins))
        .layer(TraceLayer::new_for_http())
}

// =============================================================================
// Root handlers
// =============================================================================

#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

async fn root() -> impl IntoResponse {
    Json(RootResponse {
        message: "Focus Filter API",
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        service: "focus-filter",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-api-key"),
        ]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(parsed)
    }
}
