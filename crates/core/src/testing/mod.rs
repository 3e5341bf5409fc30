//! Testing utilities and mock implementations.
//!
//! Mocks for the two external capabilities (encoder and content store) so
//! the pipeline and the HTTP surface can be exercised without ffmpeg or
//! network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use vidladder_core::testing::{fixtures, MockEncoder, MockStore};
//!
//! let encoder = MockEncoder::new();
//! encoder.set_probe_result("/uploads/clip.mov", fixtures::media_info("/uploads/clip.mov", 720)).await;
//! encoder.fail_rendition("480p").await;
//!
//! let store = MockStore::new();
//! store.fail_on_call(1).await;
//! ```

mod mock_encoder;
mod mock_store;

pub use mock_encoder::{MockEncoder, RecordedEncode};
pub use mock_store::MockStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use crate::encoder::{MediaInfo, StreamInfo};
    use crate::ladder::RenditionSpec;
    use crate::pipeline::{rendition_file_name, RenditionArtifact};

    /// Bytes written by [`write_upload`]; content is irrelevant to the mocks.
    pub const UPLOAD_BYTES: &[u8] = b"\x00\x00\x00\x18ftypmp42not-really-a-video";

    /// A 16:9 source of the given height with one video and one audio stream.
    pub fn media_info(path: impl AsRef<Path>, height: u32) -> MediaInfo {
        let width = (height * 16 / 9) & !1;
        MediaInfo {
            path: path.as_ref().to_path_buf(),
            size_bytes: 50 * 1024 * 1024,
            duration_secs: 60.0,
            format: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
            streams: vec![StreamInfo::video(width, height), StreamInfo::audio()],
        }
    }

    /// A finished artifact as the coordinator would produce it.
    pub fn artifact(rendition: &str, token: &str, dir: &Path) -> RenditionArtifact {
        let spec = RenditionSpec::new(rendition, 1280, 720, "1000k");
        let file_name = rendition_file_name(&spec, token);
        RenditionArtifact {
            rendition: rendition.to_string(),
            path: dir.join(&file_name),
            file_name,
        }
    }

    /// Writes a small fake upload into `dir` and returns its path.
    pub async fn write_upload(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        tokio::fs::write(&path, UPLOAD_BYTES)
            .await
            .expect("failed to write test upload");
        path
    }
}
