//! Request orchestrator: probe, select, encode, publish, clean up.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use super::coordinator::EncodeCoordinator;
use super::error::PipelineError;
use super::probe::probe_source;
use super::publisher::Publisher;
use super::types::{ProgressCallback, RequestContext, TranscodeOutcome};
use crate::encoder::Encoder;
use crate::ladder::RenditionCatalog;
use crate::metrics::{CLEANUP_FAILURES, LADDER_SIZE, REQUESTS_TOTAL};
use crate::store::ContentStore;

/// Drives one uploaded file through the whole pipeline.
///
/// Requests are independent; the orchestrator holds no per-request state
/// and can be shared behind an `Arc`.
pub struct TranscodeOrchestrator {
    catalog: RenditionCatalog,
    output_root: PathBuf,
    encoder: Arc<dyn Encoder>,
    coordinator: EncodeCoordinator,
    publisher: Publisher,
}

impl TranscodeOrchestrator {
    pub fn new(
        catalog: RenditionCatalog,
        output_root: impl Into<PathBuf>,
        encoder: Arc<dyn Encoder>,
        store: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            catalog,
            output_root: output_root.into(),
            coordinator: EncodeCoordinator::new(Arc::clone(&encoder)),
            encoder,
            publisher: Publisher::new(store),
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.coordinator = self.coordinator.with_progress_callback(callback);
        self
    }

    pub fn catalog(&self) -> &RenditionCatalog {
        &self.catalog
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Processes the upload at `upload_path`.
    ///
    /// The upload is deleted exactly once whatever the outcome. A failed
    /// deletion is logged and counted, never reported to the caller.
    pub async fn handle(&self, upload_path: &Path) -> Result<TranscodeOutcome, PipelineError> {
        let ctx = RequestContext::new(&self.output_root, upload_path);
        info!(token = %ctx.token(), "Processing upload {:?}", upload_path);

        let result = self.run(&ctx).await;
        remove_upload(ctx.upload_path()).await;

        let elapsed_ms = (chrono::Utc::now() - ctx.started_at()).num_milliseconds();
        match &result {
            Ok(outcome) => {
                REQUESTS_TOTAL.with_label_values(&["success"]).inc();
                info!(
                    token = %ctx.token(),
                    "Request finished in {} ms with {} rendition(s)",
                    elapsed_ms,
                    outcome.files.len()
                );
            }
            Err(e) => {
                REQUESTS_TOTAL.with_label_values(&[e.stage()]).inc();
                error!(token = %ctx.token(), stage = e.stage(), "Request failed: {}", e);
            }
        }

        result
    }

    async fn run(&self, ctx: &RequestContext) -> Result<TranscodeOutcome, PipelineError> {
        let source = probe_source(self.encoder.as_ref(), ctx.upload_path()).await?;

        let ladder = self.catalog.select(source.height_pixels);
        LADDER_SIZE.observe(ladder.len() as f64);
        info!(
            "Source is {}p, selected ladder: [{}]",
            source.height_pixels,
            ladder
                .iter()
                .map(|r| r.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let artifacts = self.coordinator.run_all(ctx, &source, &ladder).await?;
        let files = self.publisher.publish_all(&artifacts).await?;

        Ok(TranscodeOutcome {
            request_token: ctx.token().to_string(),
            source,
            files,
        })
    }
}

async fn remove_upload(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        CLEANUP_FAILURES.inc();
        warn!("Failed to delete upload {:?}: {}", path, e);
    }
}
