//! Object store backed by a local directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::error::StorageError;
use crate::models::config::StorageConfig;
use crate::ports::ObjectStore;

/// Writes uploads under `<root>/files` and OCR results under `<root>/results`.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    base_url: Option<String>,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            base_url: None,
        }
    }

    /// Return `<base_url>/<name>` URLs instead of `file://` ones.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        let store = Self::new(&config.root);
        match &config.public_base_url {
            Some(url) => store.with_base_url(url.as_str()),
            None => store,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::Write {
                key: name.to_string(),
                reason: e.to_string(),
            })?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());

        match &self.base_url {
            Some(base) => Ok(format!("{}/{}", base, name)),
            None => Ok(format!("file://{}", std::path::absolute(&path)?.display())),
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put_file(&self, bytes: &[u8], filename: &str) -> Result<String, StorageError> {
        let name = format!("files/{}-{}", Uuid::new_v4(), safe_name(filename));
        self.write(&name, bytes).await
    }

    async fn put_json(
        &self,
        value: &serde_json::Value,
        id_hint: &str,
    ) -> Result<String, StorageError> {
        let name = format!("results/{}.json", safe_name(id_hint));
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write(&name, &bytes).await
    }
}

/// Keep only characters that are safe in a path segment.
fn safe_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    match cleaned.trim_start_matches('.') {
        "" => "object".to_string(),
        name => name.to_string(),
    }
}
