//! Pinata (IPFS pinning service) client.
//!
//! Files are pinned with `POST /pinning/pinFileToIPFS`, authenticated with an
//! API key / secret pair sent as headers.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ContentStore, StoreError};

/// Pinata client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinataConfig {
    /// Pinata API key.
    #[serde(default)]
    pub api_key: String,
    /// Pinata API secret.
    #[serde(default)]
    pub api_secret: String,
    /// Base URL (default: https://api.pinata.cloud).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Request timeout in seconds (default: 300).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    300
}

impl Default for PinataConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            base_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl PinataConfig {
    /// Whether both credentials are present.
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct PinFileResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

/// Pinata API client.
pub struct PinataStore {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl PinataStore {
    /// Create a new Pinata client.
    ///
    /// Missing credentials are not an error here; every `store` call fails
    /// with `StoreError::NotConfigured` instead.
    pub fn new(config: PinataConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://api.pinata.cloud".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            api_secret: config.api_secret,
        })
    }

    async fn file_part(file_name: &str, path: &Path) -> Result<Part, StoreError> {
        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();

        let part = Part::stream_with_length(Body::from(file), len)
            .file_name(file_name.to_string())
            .mime_str("video/mp4")?;

        Ok(part)
    }
}

#[async_trait]
impl ContentStore for PinataStore {
    fn name(&self) -> &str {
        "pinata"
    }

    async fn store(&self, file_name: &str, path: &Path) -> Result<String, StoreError> {
        if self.api_key.is_empty() || self.api_secret.is_empty() {
            return Err(StoreError::NotConfigured(
                "Pinata API key and secret are required".to_string(),
            ));
        }

        let url = format!("{}/pinning/pinFileToIPFS", self.base_url);
        debug!("Pinata pin: file='{}'", file_name);

        let form = Form::new().part("file", Self::file_part(file_name, path).await?);

        let response = self
            .client
            .post(&url)
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.api_secret)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StoreError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let pinned: PinFileResponse = response.json().await.map_err(|e| {
            StoreError::ParseError(format!("Failed to parse pin response: {}", e))
        })?;

        if pinned.ipfs_hash.is_empty() {
            return Err(StoreError::ParseError(
                "Pin response contained an empty IpfsHash".to_string(),
            ));
        }

        Ok(pinned.ipfs_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> PinataConfig {
        PinataConfig {
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            base_url: Some(base_url.to_string()),
            timeout_secs: 5,
        }
    }

    fn artifact() -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"fake mp4 bytes").unwrap();
        file
    }

    #[tokio::test]
    async fn test_store_returns_ipfs_hash() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pinning/pinFileToIPFS"))
            .and(header("pinata_api_key", "key"))
            .and(header("pinata_secret_api_key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "IpfsHash": "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi",
                "PinSize": 14,
                "Timestamp": "2026-01-01T00:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = PinataStore::new(config(&server.uri())).unwrap();
        let file = artifact();
        let cid = store.store("720p_tok.mp4", file.path()).await.unwrap();
        assert_eq!(cid, "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi");
    }

    #[tokio::test]
    async fn test_store_rejected_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let store = PinataStore::new(config(&server.uri())).unwrap();
        let file = artifact();
        let result = store.store("720p_tok.mp4", file.path()).await;
        assert!(matches!(result, Err(StoreError::Unauthorized { status: 401 })));
    }

    #[tokio::test]
    async fn test_store_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let store = PinataStore::new(config(&server.uri())).unwrap();
        let file = artifact();
        match store.store("720p_tok.mp4", file.path()).await {
            Err(StoreError::ApiError { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_store_empty_hash_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "IpfsHash": "" })))
            .mount(&server)
            .await;

        let store = PinataStore::new(config(&server.uri())).unwrap();
        let file = artifact();
        let result = store.store("720p_tok.mp4", file.path()).await;
        assert!(matches!(result, Err(StoreError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_store_without_credentials() {
        let store = PinataStore::new(PinataConfig::default()).unwrap();
        let file = artifact();
        let result = store.store("720p_tok.mp4", file.path()).await;
        assert!(matches!(result, Err(StoreError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_store_missing_artifact() {
        let server = MockServer::start().await;
        let store = PinataStore::new(config(&server.uri())).unwrap();
        let result = store.store("gone.mp4", Path::new("/nonexistent/gone.mp4")).await;
        assert!(matches!(result, Err(StoreError::Io(_))));
    }

    #[test]
    fn test_has_credentials() {
        assert!(!PinataConfig::default().has_credentials());
        assert!(config("http://x").has_credentials());
    }
}
