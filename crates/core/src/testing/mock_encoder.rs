//! Mock encoder for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

use crate::encoder::{
    EncodeJob, EncodeProgress, EncodeResult, Encoder, EncoderError, MediaInfo, StreamInfo,
};

/// A recorded encode job for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedEncode {
    /// The job that was submitted.
    pub job: EncodeJob,
    /// Whether the encode succeeded.
    pub success: bool,
}

/// Mock implementation of the Encoder trait.
///
/// Encodes sleep for a configurable time, emit a few progress events and
/// write a placeholder file to the job's output path. Specific renditions
/// can be made to fail.
#[derive(Debug)]
pub struct MockEncoder {
    encodes: Arc<RwLock<Vec<RecordedEncode>>>,
    probe_results: Arc<RwLock<HashMap<PathBuf, MediaInfo>>>,
    probe_calls: Arc<RwLock<Vec<PathBuf>>>,
    /// Answer for paths without a specific probe result.
    default_media_info: Arc<RwLock<Option<MediaInfo>>>,
    /// If set, the next probe fails with this error.
    probe_error: Arc<RwLock<Option<EncoderError>>>,
    failing_renditions: Arc<RwLock<HashSet<String>>>,
    encode_duration: Arc<RwLock<Duration>>,
    rendition_durations: Arc<RwLock<HashMap<String, Duration>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl Default for MockEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEncoder {
    pub fn new() -> Self {
        Self {
            encodes: Arc::new(RwLock::new(Vec::new())),
            probe_results: Arc::new(RwLock::new(HashMap::new())),
            probe_calls: Arc::new(RwLock::new(Vec::new())),
            default_media_info: Arc::new(RwLock::new(None)),
            probe_error: Arc::new(RwLock::new(None)),
            failing_renditions: Arc::new(RwLock::new(HashSet::new())),
            encode_duration: Arc::new(RwLock::new(Duration::from_millis(10))),
            rendition_durations: Arc::new(RwLock::new(HashMap::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get all recorded encodes.
    pub async fn recorded_encodes(&self) -> Vec<RecordedEncode> {
        self.encodes.read().await.clone()
    }

    /// Number of encode calls so far, failed ones included.
    pub async fn encode_count(&self) -> usize {
        self.encodes.read().await.len()
    }

    pub async fn probe_count(&self) -> usize {
        self.probe_calls.read().await.len()
    }

    /// Highest number of encodes observed running at the same time.
    pub fn max_concurrent_encodes(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Set a probe result for a specific path.
    pub async fn set_probe_result(&self, path: impl AsRef<Path>, info: MediaInfo) {
        self.probe_results
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), info);
    }

    /// Set the media info returned for paths without a specific result.
    pub async fn set_default_media_info(&self, info: MediaInfo) {
        *self.default_media_info.write().await = Some(info);
    }

    /// Configure the next probe to fail with the given error.
    pub async fn set_probe_error(&self, error: EncoderError) {
        *self.probe_error.write().await = Some(error);
    }

    /// Every encode of `rendition` fails.
    pub async fn fail_rendition(&self, rendition: &str) {
        self.failing_renditions
            .write()
            .await
            .insert(rendition.to_string());
    }

    /// Set the simulated encode duration for all renditions.
    pub async fn set_encode_duration(&self, duration: Duration) {
        *self.encode_duration.write().await = duration;
    }

    /// Override the simulated encode duration for one rendition.
    pub async fn set_rendition_duration(&self, rendition: &str, duration: Duration) {
        self.rendition_durations
            .write()
            .await
            .insert(rendition.to_string(), duration);
    }

    async fn duration_for(&self, rendition: &str) -> Duration {
        if let Some(d) = self.rendition_durations.read().await.get(rendition) {
            return *d;
        }
        *self.encode_duration.read().await
    }

    fn default_info(path: &Path) -> MediaInfo {
        MediaInfo {
            path: path.to_path_buf(),
            size_bytes: 100 * 1024 * 1024,
            duration_secs: 60.0,
            format: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
            streams: vec![StreamInfo::video(1920, 1080), StreamInfo::audio()],
        }
    }

    async fn run_encode(
        &self,
        job: EncodeJob,
        progress_tx: Option<mpsc::Sender<EncodeProgress>>,
    ) -> Result<EncodeResult, EncoderError> {
        let rendition = job.rendition.name.clone();
        let fails = self.failing_renditions.read().await.contains(&rendition);
        self.encodes.write().await.push(RecordedEncode {
            job: job.clone(),
            success: !fails,
        });

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let duration = self.duration_for(&rendition).await;
        let steps = 4u32;
        for i in 0..steps {
            tokio::time::sleep(duration / steps).await;
            if let Some(ref tx) = progress_tx {
                let _ = tx.try_send(EncodeProgress {
                    job_id: job.job_id.clone(),
                    rendition: rendition.clone(),
                    percent: (i + 1) as f32 / steps as f32 * 100.0,
                    time_secs: job.source_duration_secs.unwrap_or(60.0) * (i + 1) as f64
                        / steps as f64,
                    duration_secs: job.source_duration_secs,
                    speed: Some("8.0x".to_string()),
                });
            }
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if fails {
            return Err(EncoderError::encode_failed(
                format!("FFmpeg exited with code: Some(1) ({})", rendition),
                Some("Conversion failed!".to_string()),
            ));
        }

        let body = format!("mock {} encode of {:?}", rendition, job.input_path);
        tokio::fs::write(&job.output_path, body.as_bytes()).await?;

        Ok(EncodeResult {
            job_id: job.job_id,
            output_path: job.output_path,
            output_size_bytes: body.len() as u64,
            duration_ms: duration.as_millis() as u64,
        })
    }
}

#[async_trait]
impl Encoder for MockEncoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, EncoderError> {
        self.probe_calls.write().await.push(path.to_path_buf());

        if let Some(err) = self.probe_error.write().await.take() {
            return Err(err);
        }

        if let Some(info) = self.probe_results.read().await.get(path) {
            return Ok(info.clone());
        }

        if let Some(info) = self.default_media_info.read().await.as_ref() {
            let mut info = info.clone();
            info.path = path.to_path_buf();
            return Ok(info);
        }

        Ok(Self::default_info(path))
    }

    async fn encode(&self, job: EncodeJob) -> Result<EncodeResult, EncoderError> {
        self.run_encode(job, None).await
    }

    async fn encode_with_progress(
        &self,
        job: EncodeJob,
        progress_tx: mpsc::Sender<EncodeProgress>,
    ) -> Result<EncodeResult, EncoderError> {
        self.run_encode(job, Some(progress_tx)).await
    }

    async fn validate(&self) -> Result<(), EncoderError> {
        Ok(())
    }
}
