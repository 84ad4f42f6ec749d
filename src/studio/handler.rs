//! HTTP handlers for the Studio API
//!
//! Provides 7 endpoints:
//! - GET  /api/status             CLI presence and version
//! - GET  /api/test               run `qql-cli --help` as a smoke test
//! - GET  /api/help               CLI usage text
//! - POST /api/generate           render a seed
//! - POST /api/save               copy the latest render of a seed
//! - GET  /api/image/:filename    stream an artifact
//! - GET  /api/list-outputs       list artifacts, newest first
//!
//! Business failures are HTTP 200 with `success: false`; only missing
//! images (404) and internal faults (500) change the status code.

use super::service::Studio;
use super::types::*;
use crate::error::Error;
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

/// Long-lived cache for immutable artifacts
const IMAGE_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Body of every 500 response
pub const INTERNAL_ERROR: &str = "Internal server error";

/// Shared state for studio handlers
#[derive(Clone)]
pub struct StudioState {
    pub studio: Arc<Studio>,
}

/// Create the studio router with all REST endpoints
pub fn studio_router(state: StudioState) -> Router {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/test", get(run_test))
        .route("/api/help", get(get_help))
        .route("/api/generate", post(generate))
        .route("/api/save", post(save))
        .route("/api/image/:filename", get(get_image))
        .route("/api/list-outputs", get(list_outputs))
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/status
async fn get_status(State(state): State<StudioState>) -> Response {
    match state.studio.status().await {
        Ok(report) => success(report),
        Err(e) => failure(ApiFailure::new(e.to_string())),
    }
}

/// GET /api/test
async fn run_test(State(state): State<StudioState>) -> Response {
    match state.studio.test().await {
        Ok(report) => success(report),
        Err(e) => failure(
            ApiFailure::new(e.to_string()).with_output(e.captured_output()),
        ),
    }
}

/// GET /api/help
async fn get_help(State(state): State<StudioState>) -> Response {
    match state.studio.help().await {
        Ok(report) => success(report),
        Err(e) => failure(ApiFailure::new(e.to_string())),
    }
}

/// POST /api/generate
async fn generate(
    State(state): State<StudioState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_body(rejection),
    };

    match state.studio.generate(request).await {
        Ok(report) => success(report),
        Err(e) => failure(
            ApiFailure::new(e.to_string()).with_logs(e.captured_output()),
        ),
    }
}

/// POST /api/save
async fn save(
    State(state): State<StudioState>,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_body(rejection),
    };

    match state.studio.save(request).await {
        Ok(report) => success(report),
        Err(e) => failure(ApiFailure::new(e.to_string())),
    }
}

/// GET /api/image/:filename
async fn get_image(State(state): State<StudioState>, Path(filename): Path<String>) -> Response {
    let record = match state.studio.image(&filename).await {
        Ok(record) => record,
        Err(Error::NotFound(message)) => {
            return (StatusCode::NOT_FOUND, Json(ApiFailure::new(message))).into_response()
        }
        Err(e) => return internal_error(&e),
    };

    let file = match tokio::fs::File::open(&record.absolute_path).await {
        Ok(file) => file,
        Err(e) => return internal_error(&Error::Io(e)),
    };
    // The file may have been rewritten since it was resolved
    let size = match file.metadata().await {
        Ok(metadata) => metadata.len(),
        Err(e) => return internal_error(&Error::Io(e)),
    };

    (
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CACHE_CONTROL, IMAGE_CACHE_CONTROL.to_string()),
            (header::CONTENT_LENGTH, size.to_string()),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response()
}

/// GET /api/list-outputs
async fn list_outputs(State(state): State<StudioState>) -> Response {
    match state.studio.list_outputs().await {
        Ok(list) => success(list),
        Err(e) => failure(ApiFailure::new(e.to_string())),
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn success<T: Serialize>(body: T) -> Response {
    Json(ApiSuccess::new(body)).into_response()
}

/// Business failures stay HTTP 200
fn failure(body: ApiFailure) -> Response {
    Json(body).into_response()
}

fn bad_body(rejection: JsonRejection) -> Response {
    tracing::warn!(error = %rejection.body_text(), "Rejected request body");
    Json(ApiFailure::new(rejection.body_text())).into_response()
}

/// Generic 500 JSON body
pub fn internal_error(error: &Error) -> Response {
    tracing::error!(error = %error, "Internal error while handling request");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiFailure::new(INTERNAL_ERROR)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::FsArtifactStore;
    use crate::config::QqlConfig;
    use crate::process::ProcessRunner;
    use axum::http::Request;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn seed_a() -> String {
        format!("0x{}", "a".repeat(64))
    }

    fn make_state(dir: &TempDir, cli: PathBuf) -> StudioState {
        let mut config = QqlConfig::default();
        config.cli.path = cli;
        config.cli.working_dir = Some(dir.path().to_path_buf());
        config.cli.status_timeout_ms = 5_000;
        config.cli.generate_timeout_ms = 5_000;
        config.storage.output_dir = dir.path().join("output");
        let store = Arc::new(FsArtifactStore::new(&config.storage.output_dir));
        StudioState {
            studio: Arc::new(Studio::new(config, ProcessRunner::new(), store)),
        }
    }

    fn make_app(dir: &TempDir) -> Router {
        studio_router(make_state(dir, dir.path().join("missing-cli")))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 64)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn post_json(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_status_missing_cli() {
        let dir = TempDir::new().unwrap();
        let resp = make_app(&dir).oneshot(get_req("/api/status")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("qql-cli not found: "));
    }

    #[tokio::test]
    async fn test_generate_bad_seed_is_business_error() {
        let dir = TempDir::new().unwrap();
        let body = serde_json::json!({"seed": "0x1234"}).to_string();
        let resp = make_app(&dir)
            .oneshot(post_json("/api/generate", body))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid seed format"));
        assert!(json.get("logs").is_none());
    }

    #[tokio::test]
    async fn test_generate_malformed_json() {
        let dir = TempDir::new().unwrap();
        let resp = make_app(&dir)
            .oneshot(post_json("/api/generate", "{not json".to_string()))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert!(!json["error"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_without_seed() {
        let dir = TempDir::new().unwrap();
        let resp = make_app(&dir)
            .oneshot(post_json("/api/save", "{}".to_string()))
            .await
            .unwrap();

        let json = body_json(resp).await;
        assert_eq!(json, serde_json::json!({"success": false, "error": "No seed provided"}));
    }

    #[tokio::test]
    async fn test_save_and_list() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("output");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("qql_aaaaaaaa_100.png"), b"png").unwrap();

        let app = make_app(&dir);
        let body = serde_json::json!({"seed": seed_a()}).to_string();
        let resp = app
            .clone()
            .oneshot(post_json("/api/save", body))
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["originalFile"], "qql_aaaaaaaa_100.png");
        assert_eq!(json["seed"], seed_a());
        let saved = json["filename"].as_str().unwrap().to_string();
        assert!(saved.starts_with("saved_aaaaaaaa_"));

        let resp = app.oneshot(get_req("/api/list-outputs")).await.unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        let files = json["files"].as_array().unwrap();
        assert_eq!(files.len(), 2);
        let names: Vec<_> = files.iter().map(|f| f["name"].as_str().unwrap()).collect();
        assert!(names.contains(&saved.as_str()));
        assert_eq!(files[0]["size"], 3);
        assert!(files[0]["created"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_list_outputs_empty() {
        let dir = TempDir::new().unwrap();
        let resp = make_app(&dir).oneshot(get_req("/api/list-outputs")).await.unwrap();
        let json = body_json(resp).await;
        assert_eq!(json, serde_json::json!({"success": true, "files": []}));
    }

    #[tokio::test]
    async fn test_list_outputs_io_failure_is_business_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("output"), b"not a directory").unwrap();

        let resp = make_app(&dir).oneshot(get_req("/api/list-outputs")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().starts_with("IO error"));
    }

    #[tokio::test]
    async fn test_get_image() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("output");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("qql_aaaaaaaa_1.png"), b"\x89PNG").unwrap();

        let resp = make_app(&dir)
            .oneshot(get_req("/api/image/qql_aaaaaaaa_1.png"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(resp.headers()[header::CACHE_CONTROL], IMAGE_CACHE_CONTROL);
        assert_eq!(resp.headers()[header::CONTENT_LENGTH], "4");
        let body = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"\x89PNG");
    }

    #[tokio::test]
    async fn test_get_image_not_found() {
        let dir = TempDir::new().unwrap();
        let app = make_app(&dir);

        for uri in ["/api/image/missing.png", "/api/image/..%2Fsecret.png"] {
            let resp = app.clone().oneshot(get_req(uri)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
            let json = body_json(resp).await;
            assert_eq!(json["success"], false);
            assert_eq!(json["error"], "Image not found");
        }
    }

    #[test]
    fn test_internal_error_is_500() {
        let resp = internal_error(&Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom")));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_generate_end_to_end() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let args_file = dir.path().join("args");
        let cli = dir.path().join("qql-cli");
        std::fs::write(
            &cli,
            format!(
                "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\nprintf png > \"$5\"\necho done\n",
                args_file.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&cli, std::fs::Permissions::from_mode(0o755)).unwrap();

        let app = studio_router(make_state(&dir, cli));
        let body = serde_json::json!({"seed": seed_a(), "width": 800}).to_string();
        let resp = app
            .clone()
            .oneshot(post_json("/api/generate", body))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        let filename = json["filename"].as_str().unwrap().to_string();
        assert!(filename.contains("aaaaaaaa"));
        assert_eq!(json["width"], 800);
        assert_eq!(json["traits"], serde_json::json!({}));
        assert_eq!(json["logs"], "done");

        let recorded = std::fs::read_to_string(&args_file).unwrap();
        let recorded: Vec<&str> = recorded.lines().collect();
        assert_eq!(recorded[0], "a".repeat(64));
        assert_eq!(recorded[1..4], ["--width", "800", "-o"]);
        assert!(recorded[4].ends_with(&filename));

        let resp = app
            .oneshot(get_req(&format!("/api/image/{filename}")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_generate_failure_carries_logs() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let cli = dir.path().join("qql-cli");
        std::fs::write(&cli, "#!/bin/sh\necho loading\necho 'bad width' >&2\nexit 1\n").unwrap();
        std::fs::set_permissions(&cli, std::fs::Permissions::from_mode(0o755)).unwrap();

        let app = studio_router(make_state(&dir, cli));
        let body = serde_json::json!({"seed": seed_a()}).to_string();
        let resp = app.oneshot(post_json("/api/generate", body)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "bad width");
        assert_eq!(json["logs"], "loading");
    }
}
