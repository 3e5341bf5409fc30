//! Types for the pipeline module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::encoder::{EncodeProgress, ENCODING_POLICY};
use crate::ladder::RenditionSpec;

/// Callback invoked for every encode progress event.
pub type ProgressCallback = Arc<dyn Fn(&EncodeProgress) + Send + Sync>;

/// What the probe learned about an upload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceProfile {
    /// Height of the first video stream in pixels.
    pub height_pixels: u32,
    /// Container duration in seconds, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

/// Lifecycle of one rendition encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Succeeded(PathBuf),
    Failed(String),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
        }
    }
}

/// A finished rendition file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionArtifact {
    /// Rendition name, e.g. "720p".
    pub rendition: String,
    /// Output filename, e.g. "720p_1760000000000-1a2b3c4d.mp4".
    pub file_name: String,
    /// Full path to the file.
    pub path: PathBuf,
}

/// One successfully stored rendition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResult {
    pub rendition_name: String,
    pub content_id: String,
}

/// Published renditions keyed by output filename.
pub type PublishedRenditions = BTreeMap<String, PublishResult>;

/// Final result of one successful request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeOutcome {
    /// Request token (also the name of the output subdirectory).
    pub request_token: String,
    pub source: SourceProfile,
    pub files: PublishedRenditions,
}

/// Per-request state: token, working directory and the upload being processed.
#[derive(Debug, Clone)]
pub struct RequestContext {
    token: String,
    upload_path: PathBuf,
    work_dir: PathBuf,
    started_at: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a context with a fresh token under `output_root`.
    pub fn new(output_root: &Path, upload_path: impl Into<PathBuf>) -> Self {
        let started_at = Utc::now();
        let token = new_request_token(started_at);
        let work_dir = output_root.join(&token);

        Self {
            token,
            upload_path: upload_path.into(),
            work_dir,
            started_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn upload_path(&self) -> &Path {
        &self.upload_path
    }

    /// Directory all renditions of this request are written to.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// `<unix-millis>-<8 hex chars>`; sorts by time and stays unique within a millisecond.
pub fn new_request_token(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", now.timestamp_millis(), &suffix[..8])
}

/// Output filename for a rendition in the request identified by `token`.
pub fn rendition_file_name(spec: &RenditionSpec, token: &str) -> String {
    format!("{}_{}.{}", spec.name, token, ENCODING_POLICY.container_extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_state_terminal() {
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Succeeded(PathBuf::from("/x.mp4")).is_terminal());
        assert!(JobState::Failed("boom".into()).is_terminal());
        assert_eq!(JobState::Failed("boom".into()).label(), "failed");
    }

    #[test]
    fn test_request_tokens_are_unique() {
        let now = Utc::now();
        let a = new_request_token(now);
        let b = new_request_token(now);
        assert_ne!(a, b);
        assert!(a.starts_with(&now.timestamp_millis().to_string()));
    }

    #[test]
    fn test_rendition_file_name_contains_tag_and_token() {
        let spec = RenditionSpec::new("720p", 1280, 720, "2800k");
        assert_eq!(rendition_file_name(&spec, "123-abcd1234"), "720p_123-abcd1234.mp4");
    }

    #[test]
    fn test_same_rendition_in_two_requests_never_collides() {
        let spec = RenditionSpec::new("1080p", 1920, 1080, "5000k");
        let root = Path::new("/output");
        let first = RequestContext::new(root, "/uploads/a.mov");
        let second = RequestContext::new(root, "/uploads/b.mov");

        let a = first.work_dir().join(rendition_file_name(&spec, first.token()));
        let b = second.work_dir().join(rendition_file_name(&spec, second.token()));
        assert_ne!(a, b);
        assert_ne!(
            rendition_file_name(&spec, first.token()),
            rendition_file_name(&spec, second.token())
        );
    }

    #[test]
    fn test_context_work_dir_under_root() {
        let ctx = RequestContext::new(Path::new("/output"), "/uploads/a.mov");
        assert_eq!(ctx.work_dir(), Path::new("/output").join(ctx.token()));
        assert_eq!(ctx.upload_path(), Path::new("/uploads/a.mov"));
    }
}
