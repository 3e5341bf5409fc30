//! Types for the ladder module.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Output frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One entry of the rendition catalog.
///
/// Immutable once the catalog is built; the name doubles as the resolution
/// tag in output filenames (e.g. `720p_<token>.mp4`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionSpec {
    /// Rendition name, e.g. "1080p".
    pub name: String,
    /// Target frame size.
    #[serde(flatten)]
    pub frame_size: FrameSize,
    /// Target video bitrate in ffmpeg notation, e.g. "5000k".
    pub video_bitrate: String,
}

impl RenditionSpec {
    pub fn new(name: impl Into<String>, width: u32, height: u32, video_bitrate: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frame_size: FrameSize::new(width, height),
            video_bitrate: video_bitrate.into(),
        }
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.frame_size.height
    }
}
