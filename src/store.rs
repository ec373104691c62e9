use std::{collections::BTreeMap, io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::show::TrackedShow;

/// Every show ever scraped, keyed by [`crate::show::ShowRecord::key`].
pub type ShowStore = BTreeMap<String, TrackedShow>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid store JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Whole-store persistence: read once at start, written once at the end.
#[async_trait]
pub trait ShowRepository: Send + Sync {
    async fn load(&self) -> Result<ShowStore, StoreError>;
    async fn save(&self, store: &ShowStore) -> Result<(), StoreError>;
}

pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ShowRepository for JsonFileRepository {
    async fn load(&self) -> Result<ShowStore, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ShowStore::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, store: &ShowStore) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let serialized = serde_json::to_string_pretty(store)?;
        tokio::fs::write(&self.path, serialized).await?;
        Ok(())
    }
}
