// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Result};

pub fn validate_config(config: &ShareConfig) -> Result<()> {
    validate_source_config(&config.source)?;
    validate_destination_config(config)?;

    if config.log.level.is_empty() {
        bail!("log.level must not be empty");
    }

    Ok(())
}

fn validate_source_config(config: &SourceConfig) -> Result<()> {
    if config.bucket.is_empty() {
        bail!("source.bucket must not be empty");
    }

    if config.service.is_empty() {
        bail!("source.service must not be empty");
    }

    if config.stage.is_empty() {
        bail!("source.stage must not be empty");
    }

    if config.template_name.is_empty() {
        bail!("source.template_name must not be empty");
    }

    if config.deployment_bucket_resource.is_empty() {
        bail!("source.deployment_bucket_resource must not be empty");
    }

    if config.artifact_prefix().is_empty() {
        bail!("source.prefix must not be empty");
    }

    Ok(())
}

fn validate_destination_config(config: &ShareConfig) -> Result<()> {
    if config.share.bucket.is_empty() {
        bail!("share.bucket must not be empty");
    }

    if config.share.bucket == config.source.bucket {
        bail!("share.bucket must differ from source.bucket; sharing republishes out of the private deployment bucket");
    }

    if config.stack_name().is_empty() {
        bail!("share.stack must not be empty");
    }

    if config.code_key().is_empty() {
        bail!("share.code_key must not be empty");
    }

    if config.template_key().is_empty() {
        bail!("share.template_key must not be empty");
    }

    if config.code_key() == config.template_key() {
        bail!("share.code_key and share.template_key must differ");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ShareConfig {
        ShareConfig::from_toml_str(
            r#"
            [source]
            bucket = "deploy-bucket"
            service = "app"

            [share]
            bucket = "pub-bucket"
        "#,
        )
        .unwrap()
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn empty_source_bucket_fails() {
        let mut config = valid_config();
        config.source.bucket = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn empty_destination_bucket_fails() {
        let mut config = valid_config();
        config.share.bucket = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn same_source_and_destination_bucket_fails() {
        let mut config = valid_config();
        config.share.bucket = config.source.bucket.clone();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn colliding_destination_keys_fail() {
        let mut config = valid_config();
        config.share.code_key = Some("shared/object".to_string());
        config.share.template_key = Some("shared/object".to_string());
        assert!(validate_config(&config).is_err());
    }
}
