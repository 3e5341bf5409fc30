//! Content-addressed store integration.
//!
//! A store takes the bytes of one finished rendition and answers with an
//! opaque content identifier (an IPFS CID for the Pinata backend).

mod pinata;

pub use pinata::{PinataConfig, PinataStore};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when talking to a content store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Credentials missing from configuration.
    #[error("Store not configured: {0}")]
    NotConfigured(String),

    /// Credentials rejected by the remote side.
    #[error("Store rejected credentials (HTTP {status})")]
    Unauthorized { status: u16 },

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Could not read the artifact from disk.
    #[error("Failed to read artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// The external store capability.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Returns the name of this store implementation.
    fn name(&self) -> &str;

    /// Streams the file at `path` to the store under `file_name` and returns
    /// its content identifier.
    async fn store(&self, file_name: &str, path: &Path) -> Result<String, StoreError>;
}
