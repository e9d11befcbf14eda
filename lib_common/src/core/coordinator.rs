//! # Pipeline Coordinator
//!
//! Runs one input file through the pipeline:
//!
//! 1. open the producer (file check + resolver init),
//! 2. spawn it as its own task against a fresh bounded channel,
//! 3. relay on the current task until end of stream or a publish failure,
//! 4. always join the producer task, so its failure is observed even when it
//!    happened after the sentinel went out,
//! 5. always close the broker sink, exactly once.
//!
//! The first fatal cause wins: a publish failure is reported ahead of the
//! `RelayClosed` it provokes in the producer.

use std::path::Path;

use crate::core::channel::{self, DEFAULT_CAPACITY};
use crate::core::error::PipelineError;
use crate::core::producer::LineProducer;
use crate::core::relay::{QueueRelay, DEFAULT_PROGRESS_INTERVAL};
use crate::core::resolver::{Resolver, ResolverConfig};
use crate::core::sink::BrokerSink;

/// Tunables of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Channel slots between producer and relay.
    pub channel_capacity: usize,
    /// Published messages between progress lines.
    pub progress_interval: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self { channel_capacity: DEFAULT_CAPACITY, progress_interval: DEFAULT_PROGRESS_INTERVAL }
    }
}

/// What a clean run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Lines read from the input, blank ones included.
    pub lines_read: u64,
    /// Messages published to the broker.
    pub published: u64,
    /// References the resolver did not know.
    pub not_found: u64,
}

/// # Run Pipeline
///
/// Processes `input_path` to completion, publishing to `sink`. The sink is
/// closed before this returns, whatever the outcome.
///
/// # Errors
/// Returns the first fatal `PipelineError` of the run.
pub async fn run_pipeline<R, S>(
    input_path: &Path,
    resolver: R,
    resolver_config: &ResolverConfig,
    mut sink: S,
    settings: &PipelineSettings,
) -> Result<RunSummary, PipelineError>
where
    R: Resolver + 'static,
    S: BrokerSink,
{
    let result = drive(input_path, resolver, resolver_config, &mut sink, settings).await;

    if let Err(e) = sink.close().await {
        log::warn!("{}", e);
    }

    result
}

async fn drive<R, S>(
    input_path: &Path,
    resolver: R,
    resolver_config: &ResolverConfig,
    sink: &mut S,
    settings: &PipelineSettings,
) -> Result<RunSummary, PipelineError>
where
    R: Resolver + 'static,
    S: BrokerSink,
{
    let producer = LineProducer::open(input_path, resolver, resolver_config).await?;

    let (tx, rx) = channel::bounded(settings.channel_capacity);
    let producer_handle = tokio::spawn(producer.run(tx));

    let relayed = QueueRelay::new(settings.progress_interval).run(rx, sink).await;

    let produced = match producer_handle.await {
        Ok(result) => result,
        Err(e) => Err(PipelineError::ProducerTask(e.to_string())),
    };

    match (relayed, produced) {
        (Ok(published), Ok(report)) => Ok(RunSummary {
            lines_read: report.lines_read,
            published,
            not_found: report.not_found,
        }),
        (Err(relay_err), producer_result) => {
            if let Err(producer_err) = producer_result {
                log::debug!("Producer stopped after relay failure: {}", producer_err);
            }
            Err(relay_err)
        }
        (Ok(_), Err(producer_err)) => Err(producer_err),
    }
}
