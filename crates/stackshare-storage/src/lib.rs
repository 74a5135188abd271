// stackshare-storage - The object-storage collaborator
//
// Implementations:
// - S3Store (AWS S3 via the official SDK)
// - MemoryStore (hermetic tests)
//
// Deliberately thin: list, get, put, bucket location. No retries, no
// caching; failures propagate to the pipeline unmodified.

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

mod memory;
mod s3;

pub use memory::MemoryStore;
pub use s3::S3Store;

/// Object-storage operations the share pipeline consumes
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List all object keys under a prefix
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;

    /// Read an object into memory
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Stream an object to a local file, returning the byte count
    async fn get_to_file(&self, bucket: &str, key: &str, path: &Path) -> Result<u64>;

    /// Write an object from memory
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;

    /// Write an object from a local file
    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()>;

    /// Region the bucket lives in (for building public object URLs)
    async fn bucket_region(&self, bucket: &str) -> Result<String>;
}
