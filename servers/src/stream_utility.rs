//! # Stream Utility
//!
//! Reads a file of entity references, resolves each one and publishes an
//! "affected entity" notification per resolved line to a message queue.
//!
//! Exit status: `0` when the whole file was processed, `1` on any fatal
//! pipeline error, `2` on invalid command line usage.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use lib_common::configs::{load_resolver_config, CliArgs, PipelineConfig};
use lib_common::connections::connect_sink;
use lib_common::core::{run_pipeline, PipelineError};
use lib_common::loggers::setup_logging;
use lib_common::resolvers::HttpResolver;

const APP_NAME: &str = "stream_utility";
const USAGE_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    let config = match PipelineConfig::try_from(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(USAGE_ERROR);
        }
    };

    if let Err(e) = setup_logging(APP_NAME, &config.log_level, config.log_dir.as_deref()) {
        eprintln!("error: failed to set up logging: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &PipelineConfig) -> anyhow::Result<()> {
    log::info!("Loading {} into queue {}", config.data_file.display(), config.broker.queue);

    let resolver_config =
        load_resolver_config(&config.ini_file).map_err(|e| PipelineError::Setup(e.to_string()))?;
    let sink = connect_sink(&config.broker).await.map_err(|e| PipelineError::Setup(e.to_string()))?;

    let summary = run_pipeline(&config.data_file, HttpResolver::new(), &resolver_config, sink, &config.settings)
        .await
        .with_context(|| format!("Failed to process {}", config.data_file.display()))?;

    log::info!(
        "Finished: {} lines read, {} messages published, {} references not found",
        summary.lines_read,
        summary.published,
        summary.not_found
    );
    Ok(())
}
