//! Mock content store for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::store::{ContentStore, StoreError};

/// Mock implementation of the ContentStore trait.
///
/// Records every call in order and returns a distinct fake CID for each
/// file. A call index or a file name can be made to fail, and the store can
/// pretend its credentials are missing.
#[derive(Debug, Default)]
pub struct MockStore {
    calls: Arc<RwLock<Vec<(String, PathBuf)>>>,
    /// Zero-based index of the call that should fail.
    fail_on: Arc<RwLock<Option<usize>>>,
    /// File names whose store call fails.
    failing_files: Arc<RwLock<HashSet<String>>>,
    not_configured: Arc<AtomicBool>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// File names passed to `store`, in call order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Paths passed to `store`, in call order.
    pub async fn stored_paths(&self) -> Vec<PathBuf> {
        self.calls
            .read()
            .await
            .iter()
            .map(|(_, path)| path.clone())
            .collect()
    }

    /// Make the `index`-th call (zero-based) fail.
    pub async fn fail_on_call(&self, index: usize) {
        *self.fail_on.write().await = Some(index);
    }

    /// Make every call for `file_name` fail.
    pub async fn fail_on_file(&self, file_name: &str) {
        self.failing_files
            .write()
            .await
            .insert(file_name.to_string());
    }

    /// Behave like a store without credentials.
    pub fn set_not_configured(&self) {
        self.not_configured.store(true, Ordering::SeqCst);
    }

    /// The CID the mock hands out for a given call.
    pub fn content_id_for(index: usize, file_name: &str) -> String {
        format!("QmMock{:04}{}", index, file_name.len())
    }
}

#[async_trait]
impl ContentStore for MockStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn store(&self, file_name: &str, path: &Path) -> Result<String, StoreError> {
        let index = {
            let mut calls = self.calls.write().await;
            calls.push((file_name.to_string(), path.to_path_buf()));
            calls.len() - 1
        };

        if self.not_configured.load(Ordering::SeqCst) {
            return Err(StoreError::NotConfigured(
                "mock store has no credentials".to_string(),
            ));
        }

        if *self.fail_on.read().await == Some(index)
            || self.failing_files.read().await.contains(file_name)
        {
            return Err(StoreError::ApiError {
                status: 500,
                message: format!("mock failure storing {}", file_name),
            });
        }

        Ok(Self::content_id_for(index, file_name))
    }
}
