//! Cloud storage support (S3, R2, GCS, Azure, local)

use super::chunked::ChunkReader;
use super::types::{ByteStream, FileDescriptor, FileStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore};
use std::sync::Arc;
use tracing::debug;

/// File store backed by an [`ObjectStore`]
#[derive(Debug, Clone)]
pub struct ObjectStoreFiles {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Original URL scheme for logging
    scheme: String,
}

impl ObjectStoreFiles {
    /// Wrap an existing object store
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            scheme: "custom".to_string(),
        }
    }

    /// Parse a storage URL and create the appropriate object store
    ///
    /// Credentials and endpoints come from the environment.
    ///
    /// Supported formats:
    /// - `s3://bucket` - AWS S3
    /// - `r2://bucket` - Cloudflare R2 (S3-compatible)
    /// - `gs://bucket` - Google Cloud Storage
    /// - `az://container` - Azure Blob Storage
    /// - `file:///local/path` or `/local/path` - Local filesystem
    pub fn parse(url: &str) -> Result<Self> {
        if let Some(bucket) = url.strip_prefix("s3://") {
            Self::build_s3(bucket_name(bucket), false)
        } else if let Some(bucket) = url.strip_prefix("r2://") {
            Self::build_s3(bucket_name(bucket), true)
        } else if let Some(bucket) = url.strip_prefix("gs://") {
            let store = GoogleCloudStorageBuilder::from_env()
                .with_bucket_name(bucket_name(bucket))
                .build()
                .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;
            Ok(Self::with_scheme(Arc::new(store), "gs"))
        } else if let Some(container) = url.strip_prefix("az://") {
            let store = MicrosoftAzureBuilder::from_env()
                .with_container_name(bucket_name(container))
                .build()
                .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?;
            Ok(Self::with_scheme(Arc::new(store), "az"))
        } else {
            Self::build_local(url.strip_prefix("file://").unwrap_or(url))
        }
    }

    fn with_scheme(store: Arc<dyn ObjectStore>, scheme: &str) -> Self {
        Self {
            store,
            scheme: scheme.to_string(),
        }
    }

    fn build_s3(bucket: &str, is_r2: bool) -> Result<Self> {
        let scheme = if is_r2 { "r2" } else { "s3" };
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

        // R2 endpoint: https://<account_id>.r2.cloudflarestorage.com
        if is_r2 {
            if let Ok(endpoint) = std::env::var("R2_ENDPOINT_URL") {
                builder = builder.with_endpoint(endpoint);
            }
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create {scheme} client: {e}")))?;
        Ok(Self::with_scheme(Arc::new(store), scheme))
    }

    fn build_local(path: &str) -> Result<Self> {
        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::config(format!("Failed to open local store {path}: {e}")))?;
        Ok(Self::with_scheme(Arc::new(store), "file"))
    }

    /// Get the scheme (s3, r2, gs, az, file)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Check if this is a cloud store (not local)
    pub fn is_cloud(&self) -> bool {
        self.scheme != "file"
    }
}

/// Strip any path after the bucket name
fn bucket_name(rest: &str) -> &str {
    rest.split('/').next().unwrap_or(rest)
}

fn to_descriptor(meta: ObjectMeta) -> FileDescriptor {
    FileDescriptor::new(meta.location.to_string(), meta.last_modified, meta.size as u64)
}

#[async_trait]
impl FileStore for ObjectStoreFiles {
    async fn list(&self, prefix: Option<&str>) -> Result<Vec<FileDescriptor>> {
        // Object store prefixes are whole path segments; list the enclosing
        // directory and match the remainder of the prefix on the key.
        let prefix = prefix.unwrap_or("").trim_start_matches('/');
        let directory = prefix.rsplit_once('/').map(|(dir, _)| dir);
        let directory = directory
            .filter(|d| !d.is_empty())
            .map(ObjectPath::parse)
            .transpose()
            .map_err(|e| Error::storage(format!("Invalid search prefix '{prefix}': {e}")))?;

        debug!(scheme = %self.scheme, prefix, "Listing objects");
        let objects: Vec<ObjectMeta> = self.store.list(directory.as_ref()).try_collect().await?;

        Ok(objects
            .into_iter()
            .map(to_descriptor)
            .filter(|file| file.key.starts_with(prefix))
            .collect())
    }

    async fn open(&self, key: &str) -> Result<ByteStream> {
        let path = ObjectPath::parse(key)
            .map_err(|e| Error::storage(format!("Invalid object key '{key}': {e}")))?;
        let body = self.store.get(&path).await?;
        debug!(key, size = body.meta.size, "Streaming object");
        Ok(Box::new(ChunkReader::spawn(body.into_stream())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use object_store::memory::InMemory;
    use std::io::Read;

    async fn store_with(keys: &[&str]) -> ObjectStoreFiles {
        let memory = InMemory::new();
        for key in keys {
            memory
                .put(&ObjectPath::from(*key), Bytes::from(key.to_string()).into())
                .await
                .unwrap();
        }
        ObjectStoreFiles::new(Arc::new(memory))
    }

    #[tokio::test]
    async fn test_list_all() {
        let files = store_with(&["a/1.csv", "a/2.csv", "b/3.csv"]).await;
        let listed = files.list(None).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed.iter().all(|f| f.size == 7));
    }

    #[tokio::test]
    async fn test_list_with_partial_segment_prefix() {
        let files = store_with(&["data/orders_1.csv", "data/users_1.csv", "other/x.csv"]).await;
        let listed = files.list(Some("data/orders")).await.unwrap();
        let keys: Vec<_> = listed.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["data/orders_1.csv"]);
    }

    #[tokio::test]
    async fn test_open_reads_contents() {
        let files = store_with(&["a/1.csv"]).await;
        let mut reader = files.open("a/1.csv").await.unwrap();
        let contents = tokio::task::spawn_blocking(move || {
            let mut contents = String::new();
            reader.read_to_string(&mut contents).unwrap();
            contents
        })
        .await
        .unwrap();
        assert_eq!(contents, "a/1.csv");
    }

    #[tokio::test]
    async fn test_open_missing_is_storage_fault() {
        let files = store_with(&[]).await;
        let err = files.open("missing.csv").await.err().unwrap();
        assert_eq!(err.kind(), crate::error::FaultKind::Storage);
    }

    #[test]
    fn test_parse_local_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().to_str().unwrap();
        let files = ObjectStoreFiles::parse(path).unwrap();
        assert_eq!(files.scheme(), "file");
        assert!(!files.is_cloud());
    }

    #[test]
    fn test_bucket_name() {
        assert_eq!(bucket_name("bucket/some/path"), "bucket");
        assert_eq!(bucket_name("bucket"), "bucket");
    }
}
