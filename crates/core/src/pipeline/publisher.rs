//! Sequential publisher.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use super::error::PipelineError;
use super::types::{PublishResult, PublishedRenditions, RenditionArtifact};
use crate::metrics::{PUBLISH_DURATION, PUBLISH_TOTAL};
use crate::store::ContentStore;

/// Sends finished renditions to a content store, one at a time.
pub struct Publisher {
    store: Arc<dyn ContentStore>,
}

impl Publisher {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Publishes `files` in order. The first store error aborts the whole
    /// batch; renditions already stored are not rolled back.
    pub async fn publish_all(
        &self,
        files: &[RenditionArtifact],
    ) -> Result<PublishedRenditions, PipelineError> {
        let store_name = self.store.name().to_string();
        let mut published = PublishedRenditions::new();

        for artifact in files {
            let start = Instant::now();
            let result = self.store.store(&artifact.file_name, &artifact.path).await;
            PUBLISH_DURATION
                .with_label_values(&[&store_name])
                .observe(start.elapsed().as_secs_f64());

            match result {
                Ok(content_id) => {
                    PUBLISH_TOTAL
                        .with_label_values(&[&store_name, "success"])
                        .inc();
                    info!(
                        "Published {} to {} as {}",
                        artifact.file_name, store_name, content_id
                    );
                    published.insert(
                        artifact.file_name.clone(),
                        PublishResult {
                            rendition_name: artifact.rendition.clone(),
                            content_id,
                        },
                    );
                }
                Err(e) => {
                    PUBLISH_TOTAL
                        .with_label_values(&[&store_name, "failed"])
                        .inc();
                    error!("Publishing {} failed: {}", artifact.file_name, e);
                    if !published.is_empty() {
                        warn!(
                            "{} rendition(s) already stored in {} remain there",
                            published.len(),
                            store_name
                        );
                    }
                    return Err(PipelineError::PublishFailed {
                        rendition: artifact.rendition.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(published)
    }
}
