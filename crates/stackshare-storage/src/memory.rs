// In-memory implementation of the ObjectStore trait, for tests.
//
// Keyed by (bucket, key); bucket regions default to us-east-1 the way
// the real GetBucketLocation API does for unconstrained buckets.

use crate::ObjectStore;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    objects: HashMap<(String, String), Vec<u8>>,
    regions: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        self.lock()
            .objects
            .insert((bucket.to_string(), key.to_string()), body.into());
    }

    /// Pin a bucket to a region (default is us-east-1)
    pub fn set_bucket_region(&self, bucket: &str, region: &str) {
        self.lock()
            .regions
            .insert(bucket.to_string(), region.to_string());
    }

    /// Read back an object, if present
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// All keys currently stored in a bucket, sorted
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let inner = self.lock();
        let mut keys: Vec<String> = inner
            .objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, key)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store lock poisoned")
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .keys(bucket)
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.object(bucket, key)
            .ok_or_else(|| anyhow!("no such object: s3://{}/{}", bucket, key))
    }

    async fn get_to_file(&self, bucket: &str, key: &str, path: &Path) -> Result<u64> {
        let body = self.get(bucket, key).await?;
        std::fs::write(path, &body).with_context(|| format!("writing {}", path.display()))?;
        Ok(body.len() as u64)
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.insert(bucket, key, body);
        Ok(())
    }

    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        let body =
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        self.insert(bucket, key, body);
        Ok(())
    }

    async fn bucket_region(&self, bucket: &str) -> Result<String> {
        Ok(self
            .lock()
            .regions
            .get(bucket)
            .cloned()
            .unwrap_or_else(|| "us-east-1".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = MemoryStore::new();
        store.put("bucket", "a/b.txt", b"hello".to_vec()).await.unwrap();
        assert_eq!(store.get("bucket", "a/b.txt").await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn get_missing_object_fails() {
        let store = MemoryStore::new();
        let err = store.get("bucket", "missing").await.unwrap_err();
        assert!(err.to_string().contains("no such object"));
    }

    #[tokio::test]
    async fn list_filters_by_prefix() {
        let store = MemoryStore::new();
        store.insert("bucket", "a/1", b"x".to_vec());
        store.insert("bucket", "a/2", b"x".to_vec());
        store.insert("bucket", "b/1", b"x".to_vec());
        store.insert("other", "a/3", b"x".to_vec());

        let keys = store.list("bucket", "a/").await.unwrap();
        assert_eq!(keys, vec!["a/1".to_string(), "a/2".to_string()]);
    }

    #[tokio::test]
    async fn file_round_trip() {
        let store = MemoryStore::new();
        store.insert("bucket", "code.zip", b"zip-bytes".to_vec());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code.zip");

        let written = store.get_to_file("bucket", "code.zip", &path).await.unwrap();
        assert_eq!(written, 9);

        store.put_file("bucket", "copy.zip", &path).await.unwrap();
        assert_eq!(store.object("bucket", "copy.zip").unwrap(), b"zip-bytes");
    }

    #[tokio::test]
    async fn bucket_region_defaults_to_us_east_1() {
        let store = MemoryStore::new();
        assert_eq!(store.bucket_region("bucket").await.unwrap(), "us-east-1");

        store.set_bucket_region("bucket", "eu-west-1");
        assert_eq!(store.bucket_region("bucket").await.unwrap(), "eu-west-1");
    }
}
