//! # Line Producer
//!
//! Reads the input file top to bottom, turns every non-blank line into a
//! notification and pushes it onto the bounded channel.
//!
//! ## Per-line flow
//! 1. **Parse** the line into a `Reference`. A bad entity id aborts the run.
//! 2. **Resolve** it through the `Resolver`.
//!    - A found document becomes a `NotificationMessage`.
//!    - A not-found answer is recovered locally: a warning is logged, record
//!      lookups produce nothing, entity lookups produce a degraded message
//!      carrying only the requested id.
//!    - Anything else aborts the run.
//! 3. **Enqueue** the rendered message, waiting while the channel is full.
//!
//! ## Shutdown
//! Whatever happens, the resolver is cleaned up and the file handle dropped
//! exactly once, and `Envelope::EndOfStream` is pushed so the relay never
//! waits forever. The sentinel is sent after the release.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

use crate::core::channel::{Envelope, EnvelopeSender};
use crate::core::document::ResolvedEntity;
use crate::core::error::PipelineError;
use crate::core::message::NotificationMessage;
use crate::core::reference::{parse_line, Reference};
use crate::core::resolver::{Lookup, Resolver, ResolverConfig};

/// # Line Outcome
///
/// What a single resolved line contributes to the stream. Fatal conditions
/// are not represented here; they are `Err(PipelineError)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Publish this message.
    Publish(NotificationMessage),
    /// A recoverable condition. The diagnostic is logged and the optional
    /// fallback message is still published.
    Recovered { diagnostic: String, fallback: Option<NotificationMessage> },
}

/// Counters reported by a finished producer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerReport {
    /// Lines read from the file, blank ones included.
    pub lines_read: u64,
    /// Messages handed to the channel.
    pub messages_enqueued: u64,
    /// References the resolver did not know.
    pub not_found: u64,
}

/// # Line Producer
///
/// Owns the input file and the resolver session for one run.
pub struct LineProducer<R: Resolver> {
    input_path: PathBuf,
    lines: Lines<BufReader<File>>,
    resolver: R,
}

impl<R: Resolver> LineProducer<R> {
    /// # Open
    ///
    /// Checks the input file, opens it and initializes the resolver.
    ///
    /// # Errors
    /// Returns `PipelineError::Setup` when the path is not an existing regular
    /// file, cannot be opened, or the resolver refuses to initialize. In the
    /// last case the resolver is cleaned up before returning.
    pub async fn open(
        input_path: impl AsRef<Path>,
        mut resolver: R,
        config: &ResolverConfig,
    ) -> Result<Self, PipelineError> {
        let input_path = input_path.as_ref().to_path_buf();

        let metadata = tokio::fs::metadata(&input_path)
            .await
            .map_err(|_| PipelineError::Setup(format!("File not found: {}", input_path.display())))?;
        if !metadata.is_file() {
            return Err(PipelineError::Setup(format!("Not a regular file: {}", input_path.display())));
        }

        let file = File::open(&input_path).await.map_err(|e| {
            PipelineError::Setup(format!("Cannot open {}: {}", input_path.display(), e))
        })?;

        if let Err(e) = resolver.init(config).await {
            resolver.cleanup().await;
            return Err(PipelineError::Setup(e.to_string()));
        }

        Ok(Self { input_path, lines: BufReader::new(file).lines(), resolver })
    }

    /// # Run
    ///
    /// Consumes the file and feeds the channel. Meant to be spawned as its
    /// own task; the relay reads the other end.
    ///
    /// # Errors
    /// Returns the first fatal condition: a bad line, a resolver failure, a
    /// read error, or `RelayClosed` as soon as the consumer went away, even
    /// when the remaining lines would not enqueue anything.
    pub async fn run(self, tx: EnvelopeSender) -> Result<ProducerReport, PipelineError> {
        let LineProducer { input_path, lines, mut resolver } = self;
        log::info!("Reading references from {}", input_path.display());

        let mut report = ProducerReport::default();
        let outcome = Self::consume(lines, &mut resolver, &tx, &mut report).await;

        // The file handle was dropped when `consume` returned.
        resolver.cleanup().await;

        if tx.send(Envelope::EndOfStream).await.is_err() {
            log::debug!("Relay already gone; end-of-stream not delivered");
        }

        match outcome {
            Ok(()) => {
                log::info!(
                    "Finished {}: {} lines read, {} messages queued, {} not found",
                    input_path.display(),
                    report.lines_read,
                    report.messages_enqueued,
                    report.not_found
                );
                Ok(report)
            }
            Err(e) => {
                log::error!("Aborted reading {} after {} lines: {}", input_path.display(), report.lines_read, e);
                Err(e)
            }
        }
    }

    async fn consume(
        mut lines: Lines<BufReader<File>>,
        resolver: &mut R,
        tx: &EnvelopeSender,
        report: &mut ProducerReport,
    ) -> Result<(), PipelineError> {
        while let Some(line) = lines.next_line().await? {
            // Blank lines and unknown records never touch the channel.
            if tx.is_closed() {
                return Err(PipelineError::RelayClosed);
            }
            report.lines_read += 1;
            let line_number = report.lines_read;

            let reference = match parse_line(&line) {
                Ok(Some(reference)) => reference,
                Ok(None) => continue,
                Err(e) => {
                    return Err(PipelineError::Parse { line_number, reason: e.to_string() });
                }
            };

            let message = match resolve_line(resolver, line_number, &reference).await? {
                LineOutcome::Publish(message) => Some(message),
                LineOutcome::Recovered { diagnostic, fallback } => {
                    log::warn!("{}", diagnostic);
                    report.not_found += 1;
                    fallback
                }
            };

            if let Some(message) = message {
                let text = message.render()?;
                if text.is_empty() {
                    continue;
                }
                tx.send(Envelope::Message(text)).await.map_err(|_| PipelineError::RelayClosed)?;
                report.messages_enqueued += 1;
            }
        }
        Ok(())
    }
}

/// # Resolve Line
///
/// Resolves one reference and classifies the answer.
///
/// # Errors
/// Returns `PipelineError::Resolution` for resolver errors and for found
/// payloads that are not a usable resolved-entity document.
pub async fn resolve_line<R: Resolver + ?Sized>(
    resolver: &mut R,
    line_number: u64,
    reference: &Reference,
) -> Result<LineOutcome, PipelineError> {
    let lookup = match reference {
        Reference::Record { data_source_code, record_id } => {
            resolver.resolve_by_record(data_source_code, record_id).await
        }
        Reference::Entity { entity_id } => resolver.resolve_by_entity_id(*entity_id).await,
    };

    let fatal = |reason: String| PipelineError::Resolution {
        line_number,
        reference: reference.describe(),
        reason,
    };

    match lookup.map_err(|e| fatal(e.to_string()))? {
        Lookup::Found(raw) => {
            let entity = ResolvedEntity::from_document(&raw).map_err(|e| fatal(e.to_string()))?;
            Ok(LineOutcome::Publish(NotificationMessage::resolved(&entity)))
        }
        Lookup::NotFound(detail) => {
            let diagnostic = format!("Entity not found for {} ({})", reference.describe(), detail);
            let fallback = match reference {
                Reference::Record { .. } => None,
                Reference::Entity { entity_id } => Some(NotificationMessage::unresolved(*entity_id)),
            };
            Ok(LineOutcome::Recovered { diagnostic, fallback })
        }
    }
}
