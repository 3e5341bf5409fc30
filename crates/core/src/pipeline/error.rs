//! Error type for transcode requests.

use thiserror::Error;

/// The single user-facing category every pipeline failure collapses to.
pub const FAILURE_CATEGORY: &str = "Processing failed";

/// Fatal failures of one transcode request.
///
/// The variants exist for logs and metrics; callers only ever see
/// [`FAILURE_CATEGORY`] plus the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Inspection errored, or no usable video stream/resolution was found.
    #[error("Probe failed: {0}")]
    ProbeFailed(String),

    /// One rendition's encode reported an error.
    #[error("Encoding {rendition} failed: {message}")]
    EncodeFailed { rendition: String, message: String },

    /// One store call errored.
    #[error("Publishing {rendition} failed: {message}")]
    PublishFailed { rendition: String, message: String },

    /// The per-request output directory could not be prepared.
    #[error("Failed to prepare output directory: {0}")]
    Workspace(String),
}

impl PipelineError {
    /// The user-facing error category.
    pub fn category(&self) -> &'static str {
        FAILURE_CATEGORY
    }

    /// Short label used for metrics and logs.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ProbeFailed(_) => "probe_failed",
            Self::EncodeFailed { .. } => "encode_failed",
            Self::PublishFailed { .. } => "publish_failed",
            Self::Workspace(_) => "workspace_failed",
        }
    }
}
