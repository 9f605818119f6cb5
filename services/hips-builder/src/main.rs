//! HiPS builder.
//!
//! Publishes HEALPix sky maps as colorized HiPS tile trees:
//! - Sigma-clipped normalization (optionally restricted to a mask)
//! - Tiling through Aladin `hipsgen`
//! - PNG colorization of every tile
//! - Viewer index pages and a run summary
//!
//! Exit codes: 0 when every map was published, 1 when some maps failed,
//! 2 when the run could not proceed.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use config::{load_run_config, Overrides};
use hips_common::{Logger, TracingLogger};
use hips_pipeline::JobRunner;
use hipsgen::HipsgenCli;

#[derive(Parser, Debug)]
#[command(name = "hips-builder")]
#[command(about = "Publish HEALPix sky maps as colorized HiPS tile trees")]
struct Args {
    /// Run configuration file
    #[arg(short, long, env = "HIPS_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Verbosity: 0 = errors, 1 = warnings, 2 = info, 3 = debug
    #[arg(short, long, default_value = "2", value_parser = clap::value_parser!(u8).range(0..=3))]
    verbosity: u8,

    /// Explicit log level (overrides --verbosity)
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format: text or json
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    log_format: String,

    /// Only process the maps with these tags (repeatable)
    #[arg(long)]
    only: Vec<String>,

    /// Aladin jar providing -hipsgen
    #[arg(long, env = "HIPSGEN_JAR")]
    hipsgen_jar: Option<PathBuf>,

    /// Java launcher
    #[arg(long, env = "HIPSGEN_JAVA")]
    java: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    if let Err(e) = init_tracing(&args) {
        eprintln!("failed to initialize logging: {:#}", e);
        return ExitCode::from(2);
    }

    match run(args).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(error = %format!("{:#}", e), "Run failed");
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> Result<u8> {
    info!(config = %args.config.display(), "Starting HiPS builder");

    let mut config = load_run_config(&args.config)?;
    Overrides {
        java: args.java,
        jar: args.hipsgen_jar,
        only: args.only,
    }
    .apply(&mut config)?;

    info!(
        maps = config.jobs.len(),
        output = %config.output_dir.display(),
        policy = ?config.on_job_error,
        "Loaded configuration"
    );

    let logger: Arc<dyn Logger> = Arc::new(TracingLogger::new());
    let generator = Arc::new(HipsgenCli::new(config.hipsgen.clone(), Arc::clone(&logger)));
    let runner = JobRunner::new(generator, logger);

    let summary = runner.run(&config).await.context("Run aborted")?;

    for failure in &summary.failed {
        error!(
            tag = %failure.tag,
            source = %failure.source.display(),
            kind = %failure.kind,
            "{}",
            failure.message
        );
    }
    info!(
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        "Finished"
    );

    Ok(summary.exit_code() as u8)
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = match &args.log_level {
        Some(level) => level.to_lowercase(),
        None => match args.verbosity {
            0 => "error",
            1 => "warn",
            2 => "info",
            _ => "debug",
        }
        .to_string(),
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .with_context(|| format!("Invalid log level '{}'", level))?;

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true);

    match args.log_format.as_str() {
        "json" => tracing::subscriber::set_global_default(builder.json().finish())?,
        "text" => tracing::subscriber::set_global_default(builder.compact().finish())?,
        other => anyhow::bail!("Unknown log format '{}' (expected text or json)", other),
    }
    Ok(())
}
