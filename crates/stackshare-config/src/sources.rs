// Configuration source loading.
//
// Priority order:
// 1. Environment variables (STACKSHARE_* prefix)
// 2. Config file path from STACKSHARE_CONFIG
// 3. Inline config content from STACKSHARE_CONFIG_CONTENT
// 4. Default config files (./stackshare.toml, ./.stackshare.toml)

use crate::*;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

/// Prefix for all field-override environment variables
pub const ENV_PREFIX: &str = "STACKSHARE_";

/// Environment lookup seam so override logic is testable without
/// touching the process environment.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads STACKSHARE_<key> from the process environment
pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }
}

/// Load configuration from file sources plus environment overrides.
pub fn load_config() -> Result<ShareConfig> {
    let mut config = load_from_file()?.context(
        "no configuration found: pass --config <FILE>, set STACKSHARE_CONFIG, \
         or create ./stackshare.toml",
    )?;
    apply_env_overrides(&mut config, &StdEnvSource)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns an error if the file doesn't exist or can't be parsed.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<ShareConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let mut config = parse(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    apply_env_overrides(&mut config, &StdEnvSource)?;
    config.validate()?;
    Ok(config)
}

/// Parse a ShareConfig from TOML content
pub fn parse(content: &str) -> Result<ShareConfig> {
    toml::from_str(content).context("Failed to parse share configuration")
}

fn load_from_file() -> Result<Option<ShareConfig>> {
    if let Ok(path) = env::var("STACKSHARE_CONFIG") {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config = parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        return Ok(Some(config));
    }

    if let Ok(content) = env::var("STACKSHARE_CONFIG_CONTENT") {
        let config = parse(&content)
            .context("Failed to parse inline config from STACKSHARE_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    for path in &["./stackshare.toml", "./.stackshare.toml"] {
        if Path::new(path).exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            let config = parse(&content)
                .with_context(|| format!("Failed to parse config file: {}", path))?;
            return Ok(Some(config));
        }
    }

    Ok(None)
}

/// Apply STACKSHARE_* field overrides on top of file-derived values.
pub fn apply_env_overrides(config: &mut ShareConfig, env: &dyn EnvSource) -> Result<()> {
    if let Some(bucket) = env.get("SOURCE_BUCKET") {
        config.source.bucket = bucket;
    }
    if let Some(service) = env.get("SERVICE") {
        config.source.service = service;
    }
    if let Some(stage) = env.get("STAGE") {
        config.source.stage = stage;
    }
    if let Some(prefix) = env.get("PREFIX") {
        config.source.prefix = Some(prefix);
    }
    if let Some(artifact) = env.get("ARTIFACT") {
        config.source.artifact = Some(artifact);
    }

    if let Some(bucket) = env.get("BUCKET") {
        config.share.bucket = bucket;
    }
    if let Some(stack) = env.get("STACK") {
        config.share.stack = Some(stack);
    }
    if let Some(key) = env.get("CODE_KEY") {
        config.share.code_key = Some(key);
    }
    if let Some(key) = env.get("TEMPLATE_KEY") {
        config.share.template_key = Some(key);
    }

    if let Some(level) = env.get("LOG_LEVEL") {
        config.log.level = level;
    }
    if let Some(format) = env.get("LOG_FORMAT") {
        config.log.format = format
            .parse()
            .context("Invalid STACKSHARE_LOG_FORMAT value")?;
    }

    Ok(())
}
