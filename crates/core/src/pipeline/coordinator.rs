//! Parallel encode coordinator.
//!
//! Fans out one spawned task per ladder rung and joins them all-or-nothing.
//! There is no concurrency cap: the fan-out is bounded by the catalog size,
//! which is fine for a handful of rungs but would need a semaphore for a
//! large catalog.
//!
//! When one job fails the coordinator returns immediately. Sibling tasks are
//! not cancelled; they keep running detached and their results are dropped.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::error::PipelineError;
use super::types::{
    rendition_file_name, JobState, ProgressCallback, RenditionArtifact, RequestContext,
    SourceProfile,
};
use crate::encoder::{EncodeJob, EncodeProgress, Encoder};
use crate::ladder::RenditionSpec;
use crate::metrics::{ENCODE_DURATION, ENCODE_JOBS_TOTAL};

/// Progress events buffered per job before `try_send` starts dropping them.
const PROGRESS_BUFFER: usize = 32;

/// Runs every rendition of a ladder concurrently.
pub struct EncodeCoordinator {
    encoder: Arc<dyn Encoder>,
    progress_callback: Option<ProgressCallback>,
}

impl EncodeCoordinator {
    pub fn new(encoder: Arc<dyn Encoder>) -> Self {
        Self {
            encoder,
            progress_callback: None,
        }
    }

    /// Forwards every progress event to `callback` in addition to the log.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Encodes `ladder` from the request's upload into its work directory.
    ///
    /// Returns artifacts in completion order, or the first failure observed.
    pub async fn run_all(
        &self,
        ctx: &RequestContext,
        source: &SourceProfile,
        ladder: &[RenditionSpec],
    ) -> Result<Vec<RenditionArtifact>, PipelineError> {
        if ladder.is_empty() {
            debug!("Empty ladder for request {}, nothing to encode", ctx.token());
            return Ok(Vec::new());
        }

        tokio::fs::create_dir_all(ctx.work_dir()).await.map_err(|e| {
            PipelineError::Workspace(format!("{}: {}", ctx.work_dir().display(), e))
        })?;

        let mut states: BTreeMap<String, JobState> = ladder
            .iter()
            .map(|spec| (spec.name.clone(), JobState::Pending))
            .collect();
        let mut pending = FuturesUnordered::new();

        for spec in ladder {
            let file_name = rendition_file_name(spec, ctx.token());
            let job = EncodeJob {
                job_id: format!("{}-{}", ctx.token(), spec.name),
                rendition: spec.clone(),
                input_path: ctx.upload_path().to_path_buf(),
                output_path: ctx.work_dir().join(&file_name),
                source_duration_secs: source.duration_secs,
            };

            let handle = tokio::spawn(run_job(
                Arc::clone(&self.encoder),
                job,
                self.progress_callback.clone(),
            ));
            states.insert(spec.name.clone(), JobState::Running);

            let rendition = spec.name.clone();
            pending.push(async move { (rendition, file_name, handle.await) });
        }

        info!(
            "Launched {} encode jobs for request {}",
            ladder.len(),
            ctx.token()
        );

        let mut artifacts = Vec::with_capacity(ladder.len());
        while let Some((rendition, file_name, joined)) = pending.next().await {
            let outcome = joined.unwrap_or_else(|e| Err(format!("encode task aborted: {}", e)));

            match outcome {
                Ok(path) => {
                    debug!("{} finished: {:?}", rendition, path);
                    states.insert(rendition.clone(), JobState::Succeeded(path.clone()));
                    artifacts.push(RenditionArtifact {
                        rendition,
                        file_name,
                        path,
                    });
                }
                Err(message) => {
                    states.insert(rendition.clone(), JobState::Failed(message.clone()));
                    let running = states.values().filter(|s| !s.is_terminal()).count();
                    if running > 0 {
                        warn!(
                            "Request {}: {} failed, {} sibling encode(s) left running; their output will be discarded [{}]",
                            ctx.token(),
                            rendition,
                            running,
                            state_summary(&states)
                        );
                    }
                    return Err(PipelineError::EncodeFailed { rendition, message });
                }
            }
        }

        Ok(artifacts)
    }
}

/// Renders job states as `name=state` pairs, sorted by name.
fn state_summary(states: &BTreeMap<String, JobState>) -> String {
    states
        .iter()
        .map(|(name, state)| format!("{}={}", name, state.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Encodes one rendition, draining its progress channel into the log.
async fn run_job(
    encoder: Arc<dyn Encoder>,
    job: EncodeJob,
    callback: Option<ProgressCallback>,
) -> Result<PathBuf, String> {
    let rendition = job.rendition.name.clone();
    let (progress_tx, mut progress_rx) = mpsc::channel::<EncodeProgress>(PROGRESS_BUFFER);

    let sink = tokio::spawn(async move {
        while let Some(progress) = progress_rx.recv().await {
            debug!(
                rendition = %progress.rendition,
                percent = progress.percent,
                "Encode progress"
            );
            if let Some(ref callback) = callback {
                callback(&progress);
            }
        }
    });

    info!(
        "Encoding {} ({}, {}) to {:?}",
        rendition, job.rendition.frame_size, job.rendition.video_bitrate, job.output_path
    );
    let start = Instant::now();
    let result = encoder.encode_with_progress(job, progress_tx).await;
    let _ = sink.await;

    ENCODE_DURATION
        .with_label_values(&[&rendition])
        .observe(start.elapsed().as_secs_f64());

    match result {
        Ok(done) => {
            ENCODE_JOBS_TOTAL
                .with_label_values(&[&rendition, "success"])
                .inc();
            info!(
                "Encoded {} in {} ms ({} bytes)",
                rendition, done.duration_ms, done.output_size_bytes
            );
            Ok(done.output_path)
        }
        Err(e) => {
            ENCODE_JOBS_TOTAL
                .with_label_values(&[&rendition, "failed"])
                .inc();
            error!("Encoding {} failed: {}", rendition, e.detailed_message());
            Err(e.detailed_message())
        }
    }
}
