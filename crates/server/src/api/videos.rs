//! Video upload endpoint.

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use vidladder_core::{PipelineError, TranscodeOutcome, FAILURE_CATEGORY};

use crate::metrics::UPLOADS_RECEIVED;
use crate::state::AppState;

/// Multipart field carrying the video.
pub const VIDEO_FIELD: &str = "video";

const SUCCESS_MESSAGE: &str = "Video processed and uploaded successfully";
const INVALID_UPLOAD: &str = "Invalid upload";
const MAX_NAME_LEN: usize = 100;

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    /// Published renditions keyed by output filename.
    pub files: BTreeMap<String, PublishedFile>,
}

#[derive(Debug, Serialize)]
pub struct PublishedFile {
    #[serde(rename = "videoCID")]
    pub video_cid: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

impl From<TranscodeOutcome> for UploadResponse {
    fn from(outcome: TranscodeOutcome) -> Self {
        Self {
            message: SUCCESS_MESSAGE.to_string(),
            files: outcome
                .files
                .into_iter()
                .map(|(file_name, result)| {
                    (
                        file_name,
                        PublishedFile {
                            video_cid: result.content_id,
                        },
                    )
                })
                .collect(),
        }
    }
}

fn error_response(status: StatusCode, error: &str, details: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            details: details.into(),
        }),
    )
        .into_response()
}

// ============================================================================
// Upload reception
// ============================================================================

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No 'video' file field in request")]
    MissingField,

    #[error("Failed to read request body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        match self {
            UploadError::MissingField => {
                error_response(StatusCode::BAD_REQUEST, INVALID_UPLOAD, self.to_string())
            }
            // 400 for malformed bodies, 413 when the body limit is hit.
            UploadError::Multipart(ref e) => {
                error_response(e.status(), INVALID_UPLOAD, self.to_string())
            }
            UploadError::Io(_) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                FAILURE_CATEGORY,
                self.to_string(),
            ),
        }
    }
}

/// Reduces a client-supplied filename to a safe single path component.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Streams the `video` field into `upload_dir` and returns the stored path.
async fn receive_upload(multipart: &mut Multipart, upload_dir: &Path) -> Result<PathBuf, UploadError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(VIDEO_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let original = field.file_name().unwrap_or("upload").to_string();
        let path = upload_dir.join(format!(
            "{}_{}",
            Uuid::new_v4().simple(),
            sanitize_file_name(&original)
        ));

        return match write_field(field, &path).await {
            Ok(bytes) => {
                info!("Received upload {:?} ({} bytes) as {:?}", original, bytes, path);
                Ok(path)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&path).await;
                Err(e)
            }
        };
    }

    Err(UploadError::MissingField)
}

async fn write_field(mut field: Field<'_>, path: &Path) -> Result<u64, UploadError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = field.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/videos
///
/// Accepts a multipart upload with a `video` file field, runs the transcode
/// pipeline and returns the content identifier of every rendition.
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Response {
    let upload_path = match receive_upload(&mut multipart, state.upload_dir()).await {
        Ok(path) => {
            UPLOADS_RECEIVED.with_label_values(&["stored"]).inc();
            path
        }
        Err(e) => {
            UPLOADS_RECEIVED.with_label_values(&["rejected"]).inc();
            error!("Upload rejected: {}", e);
            return e.into_response();
        }
    };

    // Run detached from the connection so a client hang-up cannot skip cleanup.
    let orchestrator = state.orchestrator();
    let task_path = upload_path.clone();
    let task = tokio::spawn(async move { orchestrator.handle(&task_path).await });

    await_transcode(task, &upload_path).await
}

/// Shapes the spawned pipeline's result into the HTTP response.
///
/// A panicked task never reached the orchestrator's own cleanup, so the
/// upload is removed here.
async fn await_transcode(
    task: JoinHandle<Result<TranscodeOutcome, PipelineError>>,
    upload_path: &Path,
) -> Response {
    match task.await {
        Ok(Ok(outcome)) => Json(UploadResponse::from(outcome)).into_response(),
        Ok(Err(e)) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.category(),
            e.to_string(),
        ),
        Err(e) => {
            error!("Transcode task panicked: {}", e);
            if let Err(remove_err) = tokio::fs::remove_file(upload_path).await {
                if remove_err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to delete upload {:?}: {}", upload_path, remove_err);
                }
            }
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                FAILURE_CATEGORY,
                format!("transcode task failed: {}", e),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidladder_core::pipeline::{PublishResult, SourceProfile};

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("clip.mov"), "clip.mov");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\videos\\my clip.mp4"), "my_clip.mp4");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "upload");
        assert_eq!(sanitize_file_name("..."), "upload");
        assert_eq!(sanitize_file_name(&"a".repeat(300)).len(), MAX_NAME_LEN);
    }

    #[test]
    fn test_upload_response_shape() {
        let mut files = BTreeMap::new();
        files.insert(
            "720p_1-abcd1234.mp4".to_string(),
            PublishResult {
                rendition_name: "720p".to_string(),
                content_id: "QmHash".to_string(),
            },
        );
        let outcome = TranscodeOutcome {
            request_token: "1-abcd1234".to_string(),
            source: SourceProfile {
                height_pixels: 720,
                duration_secs: None,
            },
            files,
        };

        let json = serde_json::to_value(UploadResponse::from(outcome)).unwrap();
        assert_eq!(json["message"], SUCCESS_MESSAGE);
        assert_eq!(json["files"]["720p_1-abcd1234.mp4"]["videoCID"], "QmHash");
    }

    #[tokio::test]
    async fn test_panicked_transcode_removes_upload() {
        let dir = tempfile::tempdir().unwrap();
        let upload = dir.path().join("abc_clip.mov");
        tokio::fs::write(&upload, b"fake").await.unwrap();

        let task: JoinHandle<Result<TranscodeOutcome, PipelineError>> =
            tokio::spawn(async { panic!("encoder blew up") });
        let response = await_transcode(task, &upload).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!upload.exists());
    }

    #[tokio::test]
    async fn test_pipeline_error_maps_to_processing_failed() {
        let dir = tempfile::tempdir().unwrap();
        let task = tokio::spawn(async {
            Err(PipelineError::ProbeFailed("no video stream".to_string()))
        });

        let response = await_transcode(task, &dir.path().join("gone.mov")).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upload_error_status() {
        let missing = UploadError::MissingField.into_response();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let io = UploadError::Io(std::io::Error::other("disk full")).into_response();
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
