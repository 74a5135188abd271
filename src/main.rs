use anyhow::{Context, Result};
use clap::Parser;
use stackshare_config::{LogFormat, ShareConfig};
use std::path::PathBuf;

/// Republish a deployed stack's template and code archive for public sharing
#[derive(Parser)]
#[command(name = "stackshare")]
#[command(version)]
#[command(about = "Republish a deployed stack for public sharing", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Destination bucket (overrides config file)
    #[arg(short, long, value_name = "BUCKET")]
    bucket: Option<String>,

    /// Destination object key for the code archive
    #[arg(long, value_name = "KEY")]
    code_key: Option<String>,

    /// Destination object key for the template
    #[arg(long, value_name = "KEY")]
    template_key: Option<String>,

    /// Stack name offered by the share link
    #[arg(long, value_name = "NAME")]
    stack_name: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build tokio runtime and run the async pipeline
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Step 1: Load base configuration
    let mut config = if let Some(config_path) = &cli.config {
        ShareConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        ShareConfig::load().context("Failed to load configuration")?
    };

    // Step 2: Apply CLI overrides (highest priority)
    apply_cli_overrides(&mut config, &cli);

    // Step 3: Re-validate with overrides in place
    config.validate()?;

    init_tracing(&config);

    // Step 4: Run the pipeline; the link is the one product on stdout
    let share_link = stackshare::run_with_config(config).await?;
    println!("{}", share_link);
    Ok(())
}

fn apply_cli_overrides(config: &mut ShareConfig, cli: &Cli) {
    if let Some(bucket) = &cli.bucket {
        config.share.bucket = bucket.clone();
    }

    // --code-key and --template-key are independent overrides
    if let Some(key) = &cli.code_key {
        config.share.code_key = Some(key.clone());
    }
    if let Some(key) = &cli.template_key {
        config.share.template_key = Some(key.clone());
    }

    if let Some(stack) = &cli.stack_name {
        config.share.stack = Some(stack.clone());
    }

    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
}

/// Initialize tracing/logging from the resolved config
fn init_tracing(config: &ShareConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_new(&config.log.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Progress goes to stderr; stdout carries only the share link
    match config.log.format {
        LogFormat::Json => {
            registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            registry.with(fmt::layer().with_writer(std::io::stderr)).init();
        }
    }
}
