pub mod config;
pub mod encoder;
pub mod ladder;
pub mod metrics;
pub mod pipeline;
pub mod store;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    StoreBackend,
};
pub use encoder::{Encoder, EncoderConfig, EncoderError, FfmpegEncoder};
pub use ladder::{LadderError, RenditionCatalog, RenditionSpec};
pub use pipeline::{
    PipelineError, PublishedRenditions, SourceProfile, TranscodeOrchestrator, TranscodeOutcome,
    FAILURE_CATEGORY,
};
pub use store::{ContentStore, PinataConfig, PinataStore, StoreError};
