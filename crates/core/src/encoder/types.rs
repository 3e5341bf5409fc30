//! Types for the encoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ladder::RenditionSpec;

/// Fixed codec parameters applied to every rendition.
///
/// These are policy constants, not request-configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingPolicy {
    pub video_codec: &'static str,
    pub preset: &'static str,
    pub audio_codec: &'static str,
    pub audio_bitrate: &'static str,
    pub container_extension: &'static str,
}

/// The encoding policy used for all renditions.
pub const ENCODING_POLICY: EncodingPolicy = EncodingPolicy {
    video_codec: "libx264",
    preset: "veryfast",
    audio_codec: "aac",
    audio_bitrate: "128k",
    container_extension: "mp4",
};

/// A single stream as reported by the inspect capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Stream type ("video", "audio", "subtitle", ...).
    pub codec_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl StreamInfo {
    pub fn video(width: u32, height: u32) -> Self {
        Self {
            codec_type: "video".to_string(),
            codec_name: Some("h264".to_string()),
            width: Some(width),
            height: Some(height),
        }
    }

    pub fn audio() -> Self {
        Self {
            codec_type: "audio".to_string(),
            codec_name: Some("aac".to_string()),
            width: None,
            height: None,
        }
    }

    pub fn is_video(&self) -> bool {
        self.codec_type == "video"
    }
}

/// Information about a media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Path to the file.
    pub path: PathBuf,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Container format (first entry of ffprobe's format_name).
    pub format: String,
    /// Streams in container order.
    pub streams: Vec<StreamInfo>,
}

impl MediaInfo {
    /// First stream whose type is "video".
    pub fn first_video_stream(&self) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| s.is_video())
    }
}

/// One rendition encode request.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeJob {
    /// Unique job identifier.
    pub job_id: String,
    /// Rendition to produce.
    pub rendition: RenditionSpec,
    /// Source file.
    pub input_path: PathBuf,
    /// Output file; must be unique among concurrent jobs.
    pub output_path: PathBuf,
    /// Source duration from the probe, used to compute progress percentages.
    pub source_duration_secs: Option<f64>,
}

/// Progress update during an encode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeProgress {
    /// Job ID.
    pub job_id: String,
    /// Rendition name.
    pub rendition: String,
    /// Progress percentage (0-100).
    pub percent: f32,
    /// Current time position in seconds.
    pub time_secs: f64,
    /// Total duration in seconds (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    /// Processing speed (e.g., "2.5x").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
}

/// Result of a successful encode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeResult {
    /// Job ID.
    pub job_id: String,
    /// Path to the output file.
    pub output_path: PathBuf,
    /// Output file size in bytes.
    pub output_size_bytes: u64,
    /// Encode duration in milliseconds.
    pub duration_ms: u64,
}
