//! Error types for the share pipeline

use thiserror::Error;

/// Errors that can occur while preparing a deployment for sharing
#[derive(Debug, Error)]
pub enum ShareError {
    /// The compiled template has no `Resources` section
    #[error("template has no Resources section; is this a compiled CloudFormation template?")]
    MissingResources,

    /// No deployment version exists under the expected prefix
    #[error("no deployment found under s3://{bucket}/{prefix} - deploy the service before sharing it")]
    NoDeploymentFound {
        /// The private deployment bucket
        bucket: String,
        /// The artifact prefix that was searched
        prefix: String,
    },
}

impl ShareError {
    /// Create a no-deployment-found error
    pub fn no_deployment_found(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::NoDeploymentFound {
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }
}
