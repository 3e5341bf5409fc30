//! Encoder module: the inspect and encode capabilities behind one trait.
//!
//! This module provides the `Encoder` trait and an FFmpeg implementation that
//! produces one H.264/AAC MP4 per rendition.
//!
//! # Example
//!
//! ```ignore
//! use vidladder_core::encoder::{EncodeJob, Encoder, EncoderConfig, FfmpegEncoder};
//! use vidladder_core::ladder::RenditionSpec;
//!
//! let encoder = FfmpegEncoder::new(EncoderConfig::default());
//! encoder.validate().await?;
//!
//! let info = encoder.probe(Path::new("/uploads/clip.mov")).await?;
//! let job = EncodeJob {
//!     job_id: "720p-1".to_string(),
//!     rendition: RenditionSpec::new("720p", 1280, 720, "2800k"),
//!     input_path: PathBuf::from("/uploads/clip.mov"),
//!     output_path: PathBuf::from("/output/abc/720p_abc.mp4"),
//!     source_duration_secs: Some(info.duration_secs),
//! };
//!
//! let (tx, mut rx) = tokio::sync::mpsc::channel(16);
//! let result = encoder.encode_with_progress(job, tx).await?;
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::EncoderConfig;
pub use error::EncoderError;
pub use ffmpeg::FfmpegEncoder;
pub use traits::Encoder;
pub use types::{
    EncodeJob, EncodeProgress, EncodeResult, EncodingPolicy, MediaInfo, StreamInfo,
    ENCODING_POLICY,
};
