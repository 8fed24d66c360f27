//! Object store wrapper

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::StorageError;

/// Metadata for a single stored object
#[derive(Debug, Clone, Serialize)]
pub struct ObjectInfo {
    pub key: String,
    pub filename: String,
    pub size: i64,
    pub last_modified: DateTime<Utc>,
    pub etag: Option<String>,
}

impl ObjectInfo {
    fn from_meta(meta: &ObjectMeta) -> Self {
        let key = meta.location.to_string();
        let filename = key.rsplit('/').next().unwrap_or(&key).to_string();
        Self {
            key,
            filename,
            size: meta.size as i64,
            last_modified: meta.last_modified,
            etag: meta.e_tag.clone(),
        }
    }
}

/// A folder (common prefix) in a delimiter listing
#[derive(Debug, Clone, Serialize)]
pub struct FolderEntry {
    pub key: String,
    pub name: String,
}

/// Result of a delimiter listing: immediate folders and files
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub folders: Vec<FolderEntry>,
    pub files: Vec<ObjectInfo>,
    pub prefix: Option<String>,
}

/// Object store handle used by the file routes
#[derive(Clone)]
pub struct FileStore {
    inner: Arc<dyn ObjectStore>,
}

impl FileStore {
    /// Open an S3-backed store
    pub fn new_s3(
        bucket: &str,
        region: &str,
        access_key_id: &str,
        secret_access_key: &str,
        endpoint: Option<&str>,
        allow_http: bool,
    ) -> Result<Self, StorageError> {
        info!("Opening S3 store for bucket: {}", bucket);
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(bucket)
            .with_region(region)
            .with_access_key_id(access_key_id)
            .with_secret_access_key(secret_access_key)
            .with_allow_http(allow_http);
        if let Some(endpoint) = endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        let store = builder.build()?;
        Ok(Self {
            inner: Arc::new(store),
        })
    }

    /// Open a local-filesystem store rooted at `path`
    pub fn new_local(path: &str) -> Result<Self, StorageError> {
        info!("Opening local store at: {}", path);
        let store = LocalFileSystem::new_with_prefix(path)?;
        Ok(Self {
            inner: Arc::new(store),
        })
    }

    /// Open an in-memory store (tests and demos)
    pub fn new_in_memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
        }
    }

    fn path_for(prefix: &str) -> Option<ObjectPath> {
        let trimmed = prefix.trim_matches('/');
        if trimmed.is_empty() {
            None
        } else {
            Some(ObjectPath::from(trimmed))
        }
    }

    /// Flat listing of objects under a prefix
    pub async fn list(&self, prefix: &str, max_keys: usize) -> Result<Vec<ObjectInfo>, StorageError> {
        let path = Self::path_for(prefix);
        let metas: Vec<ObjectMeta> = self
            .inner
            .list(path.as_ref())
            .take(max_keys)
            .try_collect()
            .await?;
        debug!("Listed {} objects under '{}'", metas.len(), prefix);
        Ok(metas.iter().map(ObjectInfo::from_meta).collect())
    }

    /// Delimiter listing: immediate folders and files under a prefix
    pub async fn list_with_folders(&self, prefix: &str) -> Result<Listing, StorageError> {
        let path = Self::path_for(prefix);
        let result = self.inner.list_with_delimiter(path.as_ref()).await?;

        let folders = result
            .common_prefixes
            .iter()
            .map(|p| {
                let key = p.to_string();
                let name = key.rsplit('/').next().unwrap_or(&key).to_string();
                FolderEntry { key, name }
            })
            .collect();
        let files = result.objects.iter().map(ObjectInfo::from_meta).collect();

        Ok(Listing {
            folders,
            files,
            prefix: path.map(|p| p.to_string()),
        })
    }

    /// Read an object fully into memory
    pub async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        let path = Self::path_for(key).ok_or_else(|| StorageError::InvalidKey(key.to_string()))?;
        match self.inner.get(&path).await {
            Ok(result) => Ok(result.bytes().await?),
            Err(object_store::Error::NotFound { .. }) => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write an object
    pub async fn put(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        let path = Self::path_for(key).ok_or_else(|| StorageError::InvalidKey(key.to_string()))?;
        self.inner.put(&path, data.into()).await?;
        Ok(())
    }

    /// Delete an object; absent keys report `false`
    pub async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let path = Self::path_for(key).ok_or_else(|| StorageError::InvalidKey(key.to_string()))?;
        match self.inner.delete(&path).await {
            Ok(()) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
