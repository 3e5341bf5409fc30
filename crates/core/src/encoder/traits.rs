//! Trait definitions for the encoder module.

use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;

use super::error::EncoderError;
use super::types::{EncodeJob, EncodeProgress, EncodeResult, MediaInfo};

/// The external inspect + encode capability.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Returns the name of this encoder implementation.
    fn name(&self) -> &str;

    /// Probes a media file to get its stream metadata.
    async fn probe(&self, path: &Path) -> Result<MediaInfo, EncoderError>;

    /// Encodes one rendition.
    async fn encode(&self, job: EncodeJob) -> Result<EncodeResult, EncoderError>;

    /// Encodes one rendition with progress reporting.
    ///
    /// Progress is best-effort: a full or dropped receiver never affects the
    /// encode result.
    async fn encode_with_progress(
        &self,
        job: EncodeJob,
        progress_tx: mpsc::Sender<EncodeProgress>,
    ) -> Result<EncodeResult, EncoderError>;

    /// Validates that the encoder is properly configured and ready.
    async fn validate(&self) -> Result<(), EncoderError>;
}
