use std::path::Path;
use std::sync::Arc;
use vidladder_core::{Config, SanitizedConfig, TranscodeOrchestrator};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<TranscodeOrchestrator>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Arc<TranscodeOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn orchestrator(&self) -> Arc<TranscodeOrchestrator> {
        Arc::clone(&self.orchestrator)
    }

    /// Scratch directory raw uploads are written to.
    pub fn upload_dir(&self) -> &Path {
        &self.config.storage.upload_dir
    }

    /// Document root of the `/output` static route.
    pub fn output_root(&self) -> &Path {
        self.orchestrator.output_root()
    }
}
