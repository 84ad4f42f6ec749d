//! Unified API router for QQL Studio
//!
//! Merges the studio routes with the static web UI and wraps everything in
//! request tracing, panic recovery and CORS.
//!
//! ## Endpoint Map
//!
//! | Prefix                 | Module | Description                          |
//! |------------------------|--------|--------------------------------------|
//! | `/health`              | api    | Liveness probe                       |
//! | `/api/status`          | studio | CLI presence and version             |
//! | `/api/test`            | studio | CLI smoke test                       |
//! | `/api/help`            | studio | CLI usage text                       |
//! | `/api/generate`        | studio | Render a seed                        |
//! | `/api/save`            | studio | Save the latest render of a seed     |
//! | `/api/image/:filename` | studio | Stream an artifact                   |
//! | `/api/list-outputs`    | studio | List artifacts                       |
//! | `/*`                   | api    | Static web UI, if configured         |

use crate::studio::types::ApiFailure;
use crate::studio::{studio_router, StudioState, INTERNAL_ERROR};
use axum::{
    handler::HandlerWithoutStateExt,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::any::Any;
use std::path::Path;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

const NOT_FOUND: &str = "API endpoint not found";

/// Build the complete QQL Studio HTTP application
///
/// API routes take precedence; everything else is served from `static_dir`
/// when given. Unmatched requests get a JSON 404.
pub fn build_app(
    studio_state: StudioState,
    static_dir: Option<&Path>,
    cors_origins: &[String],
) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .merge(studio_router(studio_state));

    let router = match static_dir {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir)
                .call_fallback_on_method_not_allowed(true)
                .not_found_service(not_found.into_service()),
        ),
        None => router.fallback(not_found),
    };

    with_middleware(router, cors_origins)
}

/// Tracing, panic-to-500 and CORS around `router`
fn with_middleware(router: Router, cors_origins: &[String]) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(build_cors(cors_origins))
            .layer(CatchPanicLayer::custom(handle_panic)),
    )
}

// =============================================================================
// Root handlers
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(ApiFailure::new(NOT_FOUND))).into_response()
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(panic = %detail, "Request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiFailure::new(INTERNAL_ERROR)),
    )
        .into_response()
}

// =============================================================================
// CORS
// =============================================================================

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if origins.is_empty() {
        cors.allow_origin(AnyOrigin)
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(parsed)
    }
}
