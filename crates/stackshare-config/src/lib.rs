// stackshare-config - Share configuration for the republish pipeline
//
// Supports configuration from multiple sources:
// 1. CLI flags (applied by the binary, highest priority)
// 2. Environment variables (STACKSHARE_* prefix)
// 3. Config file path from STACKSHARE_CONFIG env var
// 4. Config file contents from STACKSHARE_CONFIG_CONTENT env var
// 5. Default config file locations (./stackshare.toml, ./.stackshare.toml)
//
// The resolved ShareConfig is built once per invocation and treated as
// immutable by every pipeline stage.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use stackshare_core::ParameterRule;
use std::collections::BTreeMap;
use std::path::Path;

mod sources;
mod validation;

pub use sources::{EnvSource, StdEnvSource, ENV_PREFIX};

/// Main share configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    pub source: SourceConfig,

    pub share: DestinationConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Where the deployed artifacts live (the private side)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Private deployment bucket written by the deployment tool
    pub bucket: String,

    /// Service name the artifacts were deployed under
    pub service: String,

    #[serde(default = "default_stage")]
    pub stage: String,

    /// Artifact prefix override; defaults to serverless/<service>/<stage>
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Code archive file name override; defaults to <service>.zip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,

    #[serde(default = "default_template_name")]
    pub template_name: String,

    /// Logical id of the deployment bucket resource in the compiled template
    #[serde(default = "default_deployment_bucket_resource")]
    pub deployment_bucket_resource: String,
}

fn default_stage() -> String {
    "dev".to_string()
}

fn default_template_name() -> String {
    "compiled-cloudformation-template.json".to_string()
}

fn default_deployment_bucket_resource() -> String {
    "ServerlessDeploymentBucket".to_string()
}

impl SourceConfig {
    /// Prefix the deployment tool writes version folders under
    pub fn artifact_prefix(&self) -> String {
        self.prefix
            .clone()
            .unwrap_or_else(|| format!("serverless/{}/{}", self.service, self.stage))
    }

    /// File name of the packaged code archive inside a version folder
    pub fn artifact_name(&self) -> String {
        self.artifact
            .clone()
            .unwrap_or_else(|| format!("{}.zip", self.service))
    }
}

/// Where the shared artifacts are republished to (the public side)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Public destination bucket
    pub bucket: String,

    /// Stack name offered by the share link; defaults to the service name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_key: Option<String>,

    /// Parameter-name -> required|optional policy for the shared template
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterRule>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

impl ShareConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Load configuration from a specific file path (for CLI --config flag)
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Parse configuration from TOML content (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        sources::parse(content)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Stack name offered by the share link
    pub fn stack_name(&self) -> String {
        self.share
            .stack
            .clone()
            .unwrap_or_else(|| self.source.service.clone())
    }

    /// Destination object key for the code archive
    pub fn code_key(&self) -> String {
        self.share.code_key.clone().unwrap_or_else(|| {
            format!("{}/{}/code.zip", self.source.service, self.source.stage)
        })
    }

    /// Destination object key for the template
    pub fn template_key(&self) -> String {
        self.share.template_key.clone().unwrap_or_else(|| {
            format!("{}/{}/template.json", self.source.service, self.source.stage)
        })
    }
}
