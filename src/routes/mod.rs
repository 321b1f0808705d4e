//! HTTP Routes
//!
//! - `POST /upload` - Upload a CSV file (multipart field `file`)
//! - `GET /splitedfile` - Next window of records for an uploaded file
//! - `GET /health` - Health check

pub mod health;
pub mod split;
pub mod upload;

use axum::Router;
use tracing::info;

use crate::middleware::{apply_cors, apply_trace};
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let router = Router::new()
        .merge(upload::router(state.clone()))
        .merge(split::router(state.clone()))
        .merge(health::router(state));

    apply_trace(apply_cors(router))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "----windowedcsvboundary";

    fn test_state(dir: &TempDir) -> AppState {
        let mut config = Config::default();
        config.staging.upload_dir = dir.path().join("uploads");
        AppState::new(config)
    }

    fn multipart_request(
        field: &str,
        filename: &str,
        content: impl AsRef<[u8]>,
    ) -> Request<Body> {
        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: text/csv\r\n\r\n",
            b = BOUNDARY,
            field = field,
            filename = filename,
        )
        .into_bytes();
        body.extend_from_slice(content.as_ref());
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    async fn upload(app: &Router, filename: &str, content: &str) -> Response {
        app.clone()
            .oneshot(multipart_request("file", filename, content))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_and_parse() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let app = create_router(state.clone());

        let response = upload(&app, "test.csv", "name,age\nalice,30\nbob,41\n").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["message"],
            "File test.csv uploaded and parsed successfully."
        );
        assert!(state.store.contains("test.csv").await);

        let staged: Vec<_> = std::fs::read_dir(dir.path().join("uploads"))
            .unwrap()
            .collect();
        assert_eq!(staged.len(), 1);
    }

    #[tokio::test]
    async fn test_split_returns_csv_windows() {
        let dir = TempDir::new().unwrap();
        let app = create_router(test_state(&dir));
        upload(&app, "test.csv", "id\nr0\nr1\nr2\nr3\nr4\n").await;

        let response = app
            .clone()
            .oneshot(get("/splitedfile?filename=test.csv&n=2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"split_test.csv\""
        );
        assert_eq!(body_text(response).await, "\"id\"\n\"r0\"\n\"r1\"");

        let mut bodies = Vec::new();
        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(get("/splitedfile?filename=test.csv&n=2"))
                .await
                .unwrap();
            bodies.push(body_text(response).await);
        }
        assert_eq!(
            bodies,
            vec![
                "\"id\"\n\"r2\"\n\"r3\"",
                "\"id\"\n\"r4\"",
                "\"id\"\n\"r0\"\n\"r1\"",
            ]
        );
    }

    #[tokio::test]
    async fn test_split_unknown_file() {
        let dir = TempDir::new().unwrap();
        let app = create_router(test_state(&dir));

        for uri in ["/splitedfile?filename=nonexistent.csv&n=2", "/splitedfile?n=2"] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert_eq!(body_json(response).await["error"], "File not found.");
        }
    }

    #[tokio::test]
    async fn test_split_empty_window() {
        let dir = TempDir::new().unwrap();
        let app = create_router(test_state(&dir));
        upload(&app, "test.csv", "id\n1\n2\n").await;

        for uri in [
            "/splitedfile?filename=test.csv&n=0",
            "/splitedfile?filename=test.csv&n=abc",
            "/splitedfile?filename=test.csv",
            "/splitedfile?filename=test.csv&n=-3",
        ] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NO_CONTENT, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_upload_without_file_field() {
        let dir = TempDir::new().unwrap();
        let app = create_router(test_state(&dir));

        let response = app
            .clone()
            .oneshot(multipart_request("document", "test.csv", "a\n1\n"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "No file uploaded.");
    }

    #[tokio::test]
    async fn test_upload_unparsable_file() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(multipart_request("file", "broken.csv", b"a\n\xff\n"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Failed to process uploaded file.");
        assert!(body["details"].is_string());
        assert!(!state.store.contains("broken.csv").await);

        let response = app
            .clone()
            .oneshot(get("/splitedfile?filename=broken.csv&n=1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reupload_restarts_cursor() {
        let dir = TempDir::new().unwrap();
        let app = create_router(test_state(&dir));
        upload(&app, "test.csv", "id\n1\n2\n3\n").await;
        app.clone()
            .oneshot(get("/splitedfile?filename=test.csv&n=2"))
            .await
            .unwrap();

        upload(&app, "test.csv", "id\n1\n2\n3\n").await;
        let response = app
            .clone()
            .oneshot(get("/splitedfile?filename=test.csv&n=1"))
            .await
            .unwrap();
        assert_eq!(body_text(response).await, "\"id\"\n\"1\"");
    }

    #[tokio::test]
    async fn test_health() {
        let dir = TempDir::new().unwrap();
        let app = create_router(test_state(&dir));
        upload(&app, "a.csv", "x\n1\n").await;

        let response = app.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["datasets"], 1);
    }
}
