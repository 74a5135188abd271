// stackshare - Republish a deployed stack for public sharing
//
// Reads the latest deployment from the private deployment bucket,
// elaborates the compiled template, republishes template + code archive
// to a public bucket, and returns a console quick-create link.

use anyhow::Result;
use stackshare_config::ShareConfig;
use stackshare_storage::S3Store;
use std::sync::Arc;

pub mod pipeline;

/// Run the share pipeline against AWS using ambient credentials
pub async fn run_with_config(config: ShareConfig) -> Result<String> {
    let store = Arc::new(S3Store::from_env().await);
    pipeline::run(config, store).await
}
