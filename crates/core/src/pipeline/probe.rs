//! Source resolution probe.

use std::path::Path;

use tracing::debug;

use super::error::PipelineError;
use super::types::SourceProfile;
use crate::encoder::Encoder;

const NO_RESOLUTION: &str = "no video stream / no resolution";

/// Determines the vertical resolution of an upload with a single inspect call.
pub async fn probe_source(encoder: &dyn Encoder, path: &Path) -> Result<SourceProfile, PipelineError> {
    let info = encoder
        .probe(path)
        .await
        .map_err(|e| PipelineError::ProbeFailed(e.to_string()))?;

    let height = info
        .first_video_stream()
        .and_then(|stream| stream.height)
        .filter(|h| *h > 0)
        .ok_or_else(|| PipelineError::ProbeFailed(NO_RESOLUTION.to_string()))?;

    debug!("Probed {:?}: {} streams, height {}", path, info.streams.len(), height);

    Ok(SourceProfile {
        height_pixels: height,
        duration_secs: Some(info.duration_secs).filter(|d| *d > 0.0),
    })
}
