//! Video metadata store boundary
//!
//! The store owning video records is an external collaborator; the pipeline
//! only needs to find videos lacking renditions and write rendition URLs back
//! on full job success. [`JsonVideoStore`] is a file-backed implementation
//! used by the CLI and tests.

use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Errors from video metadata store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Video not found: {id}")]
    VideoNotFound { id: String },

    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persisted rendition URLs, written only on full job success
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionUrls {
    pub high: String,
    pub medium: String,
    pub low: String,
}

/// One persisted video record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    /// URL of the original upload, null for records without media
    pub source_url: Option<String>,
    pub video_url_high: Option<String>,
    pub video_url_medium: Option<String>,
    pub video_url_low: Option<String>,
}

impl VideoRecord {
    /// Migration selection rule: a non-null source with no high rendition
    pub fn needs_renditions(&self) -> bool {
        self.source_url.is_some() && self.video_url_high.is_none()
    }

    /// Filename component of the source URL
    pub fn source_filename(&self) -> Option<&str> {
        self.source_url
            .as_deref()
            .and_then(|url| url.rsplit('/').next())
            .filter(|name| !name.is_empty())
    }
}

/// Store interface the transcoding pipeline depends on
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// All records matching the migration selection rule
    ///
    /// # Errors
    /// - `StoreError::Io` - Backing storage unreadable
    async fn videos_missing_renditions(&self) -> Result<Vec<VideoRecord>, StoreError>;

    /// Persist rendition URLs for one record
    ///
    /// # Errors
    /// - `StoreError::VideoNotFound` - No record with this id
    /// - `StoreError::Io` - Backing storage unwritable
    async fn update_renditions(&self, id: &str, urls: &RenditionUrls) -> Result<(), StoreError>;
}

/// JSON-file-backed video store
pub struct JsonVideoStore {
    path: PathBuf,
    records: RwLock<Vec<VideoRecord>>,
}

impl JsonVideoStore {
    /// Load a store from a JSON file containing an array of records
    ///
    /// # Errors
    /// - `StoreError::Io` - File unreadable
    /// - `StoreError::Serialization` - File is not a valid record array
    pub async fn load(path: PathBuf) -> Result<Self, StoreError> {
        let contents = tokio::fs::read_to_string(&path).await?;
        let records: Vec<VideoRecord> = serde_json::from_str(&contents)?;

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    /// Create a store at `path` with the given records, writing the file
    ///
    /// # Errors
    /// - `StoreError::Io` - File unwritable
    pub async fn create(path: PathBuf, records: Vec<VideoRecord>) -> Result<Self, StoreError> {
        let store = Self {
            path,
            records: RwLock::new(records),
        };
        store.persist().await?;
        Ok(store)
    }

    /// All records currently held, in store order
    pub fn records(&self) -> Vec<VideoRecord> {
        self.records.read().clone()
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let serialized = {
            let records = self.records.read();
            serde_json::to_string_pretty(&*records)?
        };
        tokio::fs::write(&self.path, serialized).await?;
        Ok(())
    }
}

#[async_trait]
impl VideoStore for JsonVideoStore {
    async fn videos_missing_renditions(&self) -> Result<Vec<VideoRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .iter()
            .filter(|record| record.needs_renditions())
            .cloned()
            .collect())
    }

    async fn update_renditions(&self, id: &str, urls: &RenditionUrls) -> Result<(), StoreError> {
        {
            let mut records = self.records.write();
            let record = records
                .iter_mut()
                .find(|record| record.id == id)
                .ok_or_else(|| StoreError::VideoNotFound { id: id.to_string() })?;

            record.video_url_high = Some(urls.high.clone());
            record.video_url_medium = Some(urls.medium.clone());
            record.video_url_low = Some(urls.low.clone());
        }

        self.persist().await
    }
}
