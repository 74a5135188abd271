// The share pipeline: a fixed, strictly sequential list of stages.
//
// Each stage reads the immutable ShareConfig and the shared ObjectStore
// handle, and passes intermediate results (resolved version, fetched
// template, finished link) through the ShareRun state. No hooks, no
// events: the order is the whole contract.

use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use stackshare_config::ShareConfig;
use stackshare_core::link;
use stackshare_core::template::{self, ElaborateOptions};
use stackshare_core::ShareError;
use stackshare_storage::ObjectStore;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::info;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
type StageFn = for<'a> fn(&'a mut ShareRun) -> BoxFuture<'a, Result<()>>;

const STAGES: &[(&str, StageFn)] = &[
    ("resolve-deployment", resolve_deployment),
    ("fetch-template", fetch_template),
    ("elaborate-template", elaborate_template),
    ("publish-template", publish_template),
    ("copy-code", copy_code),
    ("build-link", build_link),
];

/// State threaded through the pipeline stages
pub struct ShareRun {
    config: ShareConfig,
    store: Arc<dyn ObjectStore>,
    version_prefix: Option<String>,
    template: Option<Value>,
    share_link: Option<String>,
}

impl ShareRun {
    fn new(config: ShareConfig, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            config,
            store,
            version_prefix: None,
            template: None,
            share_link: None,
        }
    }

    fn version_key(&self, file_name: &str) -> Result<String> {
        let prefix = self
            .version_prefix
            .as_deref()
            .ok_or_else(|| anyhow!("deployment version not resolved yet"))?;
        Ok(format!("{}/{}", prefix, file_name))
    }
}

/// Run all pipeline stages in order and return the share link
pub async fn run(config: ShareConfig, store: Arc<dyn ObjectStore>) -> Result<String> {
    let mut run = ShareRun::new(config, store);

    for (name, stage) in STAGES {
        stage(&mut run)
            .await
            .with_context(|| format!("share stage '{}' failed", name))?;
    }

    run.share_link
        .ok_or_else(|| anyhow!("pipeline finished without producing a share link"))
}

/// Find the most recent version folder under the deployment prefix
fn resolve_deployment(run: &mut ShareRun) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let source = &run.config.source;
        let prefix = format!("{}/", source.artifact_prefix().trim_end_matches('/'));

        let keys = run.store.list(&source.bucket, &prefix).await?;

        // Version folders sort lexicographically; newest deployment wins
        let mut versions: Vec<&str> = keys
            .iter()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter_map(|rest| rest.split('/').next())
            .filter(|segment| !segment.is_empty())
            .collect();
        versions.sort_unstable_by(|a, b| b.cmp(a));
        versions.dedup();

        let latest = versions
            .first()
            .ok_or_else(|| ShareError::no_deployment_found(&source.bucket, &prefix))?;

        info!(
            "Sharing deployment version {} from s3://{}/{}",
            latest, source.bucket, prefix
        );
        run.version_prefix = Some(format!("{}{}", prefix, latest));
        Ok(())
    })
}

/// Fetch and parse the compiled template of the resolved version
fn fetch_template(run: &mut ShareRun) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let key = run.version_key(&run.config.source.template_name)?;
        let bytes = run.store.get(&run.config.source.bucket, &key).await?;

        let document: Value = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing template s3://{}/{}", run.config.source.bucket, key))?;

        info!("Fetched template {} ({} bytes)", key, bytes.len());
        run.template = Some(document);
        Ok(())
    })
}

/// Rewrite the template so it no longer depends on the deployment bucket
fn elaborate_template(run: &mut ShareRun) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let document = run
            .template
            .take()
            .ok_or_else(|| anyhow!("template not fetched yet"))?;

        let opts = ElaborateOptions {
            rules: run.config.share.parameters.clone(),
            deployment_bucket_resource: run.config.source.deployment_bucket_resource.clone(),
            destination_bucket: run.config.share.bucket.clone(),
            destination_code_key: run.config.code_key(),
        };
        let outcome = template::elaborate(&document, &opts)?;

        info!(
            "Elaborated template: {} function(s) repointed, deployment bucket resource {}",
            outcome.functions_rewritten,
            if outcome.removed_deployment_bucket {
                "removed"
            } else {
                "already absent"
            }
        );
        run.template = Some(outcome.template);
        Ok(())
    })
}

/// Publish the elaborated template to the destination bucket
fn publish_template(run: &mut ShareRun) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let template = run
            .template
            .as_ref()
            .ok_or_else(|| anyhow!("template not elaborated yet"))?;
        let body = serde_json::to_vec_pretty(template).context("serializing template")?;

        let bucket = &run.config.share.bucket;
        let key = run.config.template_key();
        run.store.put(bucket, &key, body).await?;

        info!("Published template to s3://{}/{}", bucket, key);
        Ok(())
    })
}

/// Copy the code archive through a scoped temporary file
fn copy_code(run: &mut ShareRun) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let source_key = run.version_key(&run.config.source.artifact_name())?;
        let dest_bucket = &run.config.share.bucket;
        let dest_key = run.config.code_key();

        // NamedTempFile is removed on drop, on failure paths included
        let archive = tempfile::NamedTempFile::new()
            .context("creating temporary file for code archive")?;

        let size = run
            .store
            .get_to_file(&run.config.source.bucket, &source_key, archive.path())
            .await?;
        run.store
            .put_file(dest_bucket, &dest_key, archive.path())
            .await?;

        info!(
            "Copied code archive ({} bytes) to s3://{}/{}",
            size, dest_bucket, dest_key
        );
        Ok(())
    })
}

/// Build the console quick-create link from the destination bucket's region
fn build_link(run: &mut ShareRun) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let bucket = &run.config.share.bucket;
        let region = run.store.bucket_region(bucket).await?;

        let template_url = link::template_object_url(&region, bucket, &run.config.template_key());
        let share_link = link::console_url(&run.config.stack_name(), &template_url);

        info!("Stack can be launched from {}", template_url);
        run.share_link = Some(share_link);
        Ok(())
    })
}
