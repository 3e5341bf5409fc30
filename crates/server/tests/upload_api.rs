//! Upload endpoint tests against the in-process router.

mod common;

use axum::http::StatusCode;
use common::{multipart_body, TestFixture};
use vidladder_core::encoder::EncoderError;

#[tokio::test]
async fn test_health_and_config() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/health").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");

    let response = fixture.get("/api/v1/config").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["store"]["backend"], "pinata");
    assert_eq!(response.body["store"]["pinata"]["api_key_configured"], false);
    assert!(response.body["store"]["pinata"].get("api_key").is_none());
    assert_eq!(response.body["ladder"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_upload_full_hd_returns_four_cids() {
    let fixture = TestFixture::new().await;
    fixture.set_source_height(1080).await;

    let response = fixture.upload("concert.mov", b"fake video bytes").await;

    assert_status!(response, StatusCode::OK);
    assert!(response.body["message"].is_string());
    let files = response.body["files"].as_object().unwrap();
    assert_eq!(files.len(), 4);
    for tag in ["1080p", "720p", "480p", "360p"] {
        let (_, entry) = files
            .iter()
            .find(|(name, _)| name.starts_with(&format!("{}_", tag)))
            .unwrap_or_else(|| panic!("missing {}", tag));
        assert!(!entry["videoCID"].as_str().unwrap().is_empty());
    }
    assert_eq!(fixture.uploads_left(), 0);
}

#[tokio::test]
async fn test_upload_below_smallest_rung_returns_empty_files() {
    let fixture = TestFixture::new().await;
    fixture.set_source_height(300).await;

    let response = fixture.upload("tiny.mp4", b"fake").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["files"], serde_json::json!({}));
    assert_eq!(fixture.uploads_left(), 0);
    assert_eq!(fixture.outputs(), 0);
}

#[tokio::test]
async fn test_probe_failure_returns_processing_failed() {
    let fixture = TestFixture::new().await;
    fixture
        .encoder
        .set_probe_error(EncoderError::probe_failed("moov atom not found"))
        .await;

    let response = fixture.upload("corrupt.mp4", b"garbage").await;

    assert_status!(response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["error"], "Processing failed");
    assert!(response.body["details"]
        .as_str()
        .unwrap()
        .contains("moov atom not found"));
    assert_eq!(fixture.uploads_left(), 0);
    assert_eq!(fixture.outputs(), 0);
}

#[tokio::test]
async fn test_encode_failure_returns_processing_failed() {
    let fixture = TestFixture::new().await;
    fixture.set_source_height(720).await;
    fixture.encoder.fail_rendition("480p").await;

    let response = fixture.upload("clip.mov", b"fake").await;

    assert_status!(response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["error"], "Processing failed");
    assert!(response.body.get("files").is_none());
    assert!(fixture.store.calls().await.is_empty());
    assert_eq!(fixture.uploads_left(), 0);
}

#[tokio::test]
async fn test_publish_failure_returns_no_files() {
    let fixture = TestFixture::new().await;
    fixture.set_source_height(1080).await;
    fixture.store.fail_on_call(1).await;

    let response = fixture.upload("clip.mov", b"fake").await;

    assert_status!(response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["error"], "Processing failed");
    assert!(response.body.get("files").is_none());
    assert_eq!(fixture.uploads_left(), 0);
}

#[tokio::test]
async fn test_missing_credentials_fail_at_publish() {
    let fixture = TestFixture::new().await;
    fixture.set_source_height(360).await;
    fixture.store.set_not_configured();

    let response = fixture.upload("clip.mov", b"fake").await;

    assert_status!(response, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body["details"]
        .as_str()
        .unwrap()
        .contains("not configured"));
}

#[tokio::test]
async fn test_missing_video_field_is_bad_request() {
    let fixture = TestFixture::new().await;

    let body = multipart_body(&[("title", None, b"holiday".as_slice())]);
    let response = fixture.post_multipart(body).await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].is_string());
    assert!(response.body["details"].is_string());
    assert_eq!(fixture.encoder.probe_count().await, 0);
}

#[tokio::test]
async fn test_extra_fields_are_ignored() {
    let fixture = TestFixture::new().await;
    fixture.set_source_height(480).await;

    let body = multipart_body(&[
        ("title", None, b"holiday".as_slice()),
        ("video", Some("../../escape.mov"), b"fake".as_slice()),
    ]);
    let response = fixture.post_multipart(body).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["files"].as_object().unwrap().len(), 2);

    let probed = fixture.encoder.recorded_encodes().await[0].job.input_path.clone();
    assert!(probed.starts_with(&fixture.upload_dir));
    assert!(probed.to_string_lossy().ends_with("_escape.mov"));
}

#[tokio::test]
async fn test_renditions_served_from_output() {
    let fixture = TestFixture::new().await;
    fixture.set_source_height(360).await;

    let response = fixture.upload("clip.mov", b"fake").await;
    assert_status!(response, StatusCode::OK);

    let file_name = response.body["files"]
        .as_object()
        .unwrap()
        .keys()
        .next()
        .unwrap()
        .clone();
    let token = file_name
        .strip_prefix("360p_")
        .and_then(|rest| rest.strip_suffix(".mp4"))
        .unwrap();

    let (status, body) = fixture
        .get_text(&format!("/output/{}/{}", token, file_name))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("360p"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let (status, body) = fixture.get_text("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("vidladder_http_requests_total"));
}
