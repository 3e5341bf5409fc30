use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::encoder::EncoderConfig;
use crate::ladder::{default_renditions, LadderError, RenditionCatalog, RenditionSpec};
use crate::store::PinataConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub store: StoreConfig,
    /// Rendition catalog override; the built-in catalog when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ladder: Option<Vec<RenditionSpec>>,
}

impl Config {
    /// Builds the effective rendition catalog.
    pub fn rendition_catalog(&self) -> Result<RenditionCatalog, LadderError> {
        match &self.ladder {
            Some(entries) => RenditionCatalog::new(entries.clone()),
            None => Ok(RenditionCatalog::default()),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted request body in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    3000
}

fn default_max_upload_bytes() -> usize {
    2 * 1024 * 1024 * 1024 // 2 GiB
}

/// Filesystem locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Scratch directory for raw uploads.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Root for per-request rendition folders; also served under `/output`.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            output_root: default_output_root(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_output_root() -> PathBuf {
    PathBuf::from("output")
}

/// Content store configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Store backend type
    #[serde(default)]
    pub backend: StoreBackend,
    /// Pinata-specific configuration
    #[serde(default)]
    pub pinata: PinataConfig,
}

/// Available content store backends
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Pinata,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Pinata => "pinata",
        }
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub encoder: EncoderConfig,
    pub store: SanitizedStoreConfig,
    /// Effective rendition catalog.
    pub ladder: Vec<RenditionSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStoreConfig {
    pub backend: String,
    pub pinata: SanitizedPinataConfig,
}

/// Sanitized Pinata config (credentials hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPinataConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub api_key_configured: bool,
    pub api_secret_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let pinata = &config.store.pinata;
        Self {
            server: config.server.clone(),
            storage: config.storage.clone(),
            encoder: config.encoder.clone(),
            store: SanitizedStoreConfig {
                backend: config.store.backend.as_str().to_string(),
                pinata: SanitizedPinataConfig {
                    base_url: pinata.base_url.clone(),
                    api_key_configured: !pinata.api_key.is_empty(),
                    api_secret_configured: !pinata.api_secret.is_empty(),
                    timeout_secs: pinata.timeout_secs,
                },
            },
            ladder: config.ladder.clone().unwrap_or_else(default_renditions),
        }
    }
}
