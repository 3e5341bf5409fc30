//! Common test utilities for in-process API testing with mocks.
//!
//! This module provides a test fixture that builds the router around a
//! `TranscodeOrchestrator` wired to `MockEncoder` and `MockStore`, so the
//! upload endpoint can be exercised without ffmpeg or network access.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use vidladder_core::{
    config::{Config, ServerConfig, StorageConfig},
    ladder::RenditionCatalog,
    testing::{MockEncoder, MockStore},
    TranscodeOrchestrator,
};

/// Re-export fixtures for test convenience
pub use vidladder_core::testing::fixtures;

pub const BOUNDARY: &str = "----vidladder-test-boundary";

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_upload() {
///     let fixture = TestFixture::new().await;
///     fixture.set_source_height(720).await;
///
///     let response = fixture.upload("clip.mov", b"data").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock encoder - configure probe results and failures
    pub encoder: Arc<MockEncoder>,
    /// Mock store - inspect and fail publish calls
    pub store: Arc<MockStore>,
    pub upload_dir: PathBuf,
    pub output_root: PathBuf,
    /// Temporary directory holding uploads and output
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let upload_dir = temp_dir.path().join("uploads");
        let output_root = temp_dir.path().join("output");
        std::fs::create_dir_all(&upload_dir).expect("Failed to create upload dir");
        std::fs::create_dir_all(&output_root).expect("Failed to create output dir");

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
                max_upload_bytes: 16 * 1024 * 1024,
            },
            storage: StorageConfig {
                upload_dir: upload_dir.clone(),
                output_root: output_root.clone(),
            },
            ..Config::default()
        };

        let encoder = Arc::new(MockEncoder::new());
        let store = Arc::new(MockStore::new());
        let orchestrator = Arc::new(TranscodeOrchestrator::new(
            RenditionCatalog::default(),
            &output_root,
            encoder.clone(),
            store.clone(),
        ));

        let state = Arc::new(vidladder_server::state::AppState::new(config, orchestrator));
        let router = vidladder_server::api::create_router(state);

        Self {
            router,
            encoder,
            store,
            upload_dir,
            output_root,
            temp_dir,
        }
    }

    /// Every upload probes as a source of `height` pixels.
    ///
    /// Stored uploads get a random prefix, so the probe result is keyed on
    /// whatever path the mock sees; the default probe answer is replaced here.
    pub async fn set_source_height(&self, height: u32) {
        self.encoder
            .set_default_media_info(fixtures::media_info("/uploads/any", height))
            .await;
    }

    /// Files currently in the upload directory.
    pub fn uploads_left(&self) -> usize {
        count_entries(&self.upload_dir)
    }

    /// Entries currently in the output root.
    pub fn outputs(&self) -> usize {
        count_entries(&self.output_root)
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// GET returning the raw body (for non-JSON routes).
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    /// POST a multipart body with a single `video` file field.
    pub async fn upload(&self, file_name: &str, content: &[u8]) -> TestResponse {
        self.post_multipart(multipart_body(&[("video", Some(file_name), content)]))
            .await
    }

    /// POST a prebuilt multipart body to the upload endpoint.
    pub async fn post_multipart(&self, body: Vec<u8>) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/videos")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Builds a multipart/form-data body from `(field, file_name, content)` parts.
pub fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file_name {
            Some(file_name) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: video/quicktime\r\n\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
