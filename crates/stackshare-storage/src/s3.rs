// AWS S3 implementation of the ObjectStore trait
//
// Credentials and default region come from the ambient environment via
// the standard provider chain. Errors carry the bucket/key context and
// otherwise propagate as-is.

use crate::ObjectStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Object store backed by AWS S3
#[derive(Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Build a store from the ambient credential/region chain
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }

    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.with_context(|| format!("listing s3://{}/{}", bucket, prefix))?;
            for object in page.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }
        }

        debug!("Listed {} object(s) under s3://{}/{}", keys.len(), bucket, prefix);
        Ok(keys)
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let object = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("fetching s3://{}/{}", bucket, key))?;

        let body = object
            .body
            .collect()
            .await
            .with_context(|| format!("reading body of s3://{}/{}", bucket, key))?;
        Ok(body.into_bytes().to_vec())
    }

    async fn get_to_file(&self, bucket: &str, key: &str, path: &Path) -> Result<u64> {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;

        let mut object = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("fetching s3://{}/{}", bucket, key))?;

        let mut written = 0u64;
        while let Some(chunk) = object
            .body
            .try_next()
            .await
            .with_context(|| format!("reading body of s3://{}/{}", bucket, key))?
        {
            file.write_all(&chunk)
                .with_context(|| format!("writing {}", path.display()))?;
            written += chunk.len() as u64;
        }

        Ok(written)
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .with_context(|| format!("uploading s3://{}/{}", bucket, key))?;
        Ok(())
    }

    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        let body = ByteStream::from_path(path)
            .await
            .with_context(|| format!("opening {}", path.display()))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .with_context(|| format!("uploading s3://{}/{}", bucket, key))?;
        Ok(())
    }

    async fn bucket_region(&self, bucket: &str) -> Result<String> {
        let location = self
            .client
            .get_bucket_location()
            .bucket(bucket)
            .send()
            .await
            .with_context(|| format!("resolving region of bucket {}", bucket))?;

        // Legacy API quirk: an absent or empty LocationConstraint means us-east-1
        let region = location
            .location_constraint()
            .map(|constraint| constraint.as_str().to_string())
            .filter(|region| !region.is_empty())
            .unwrap_or_else(|| "us-east-1".to_string());
        Ok(region)
    }
}
