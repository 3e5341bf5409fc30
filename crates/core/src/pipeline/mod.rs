//! Transcode pipeline.
//!
//! One request flows through four stages:
//!
//! 1. [`probe_source`] reads the upload's vertical resolution.
//! 2. The [`RenditionCatalog`](crate::ladder::RenditionCatalog) selects the ladder.
//! 3. [`EncodeCoordinator`] encodes every rung in parallel.
//! 4. [`Publisher`] stores the finished files one after another.
//!
//! [`TranscodeOrchestrator`] ties the stages together and always removes the
//! upload afterwards.

mod coordinator;
mod error;
mod orchestrator;
mod probe;
mod publisher;
mod types;

pub use coordinator::EncodeCoordinator;
pub use error::{PipelineError, FAILURE_CATEGORY};
pub use orchestrator::TranscodeOrchestrator;
pub use probe::probe_source;
pub use publisher::Publisher;
pub use types::{
    new_request_token, rendition_file_name, JobState, ProgressCallback, PublishResult,
    PublishedRenditions, RenditionArtifact, RequestContext, SourceProfile, TranscodeOutcome,
};
