//! # Queue Relay
//!
//! The consumer side of the pipeline. It runs on the coordinating task,
//! drains the channel in order and publishes each message to the broker sink
//! until it sees `Envelope::EndOfStream`.
//!
//! Publish failures are not swallowed: the relay returns at once, dropping its
//! receiver, which makes the producer's next enqueue fail with `RelayClosed`.

use crate::core::channel::{Envelope, EnvelopeReceiver};
use crate::core::error::PipelineError;
use crate::core::sink::BrokerSink;

/// Published messages between two progress lines, by default.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

/// # Queue Relay
#[derive(Debug, Clone, Copy)]
pub struct QueueRelay {
    progress_interval: u64,
}

impl Default for QueueRelay {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_INTERVAL)
    }
}

impl QueueRelay {
    /// Creates a relay that logs progress every `progress_interval`
    /// messages. Zero disables progress lines.
    pub fn new(progress_interval: u64) -> Self {
        Self { progress_interval }
    }

    /// Whether a progress line is due after `count` published messages.
    fn is_progress_point(&self, count: u64) -> bool {
        self.progress_interval > 0 && count > 0 && count % self.progress_interval == 0
    }

    /// # Run
    ///
    /// Publishes until end of stream and returns the number of messages
    /// published. A channel closed without a sentinel also ends the loop;
    /// the producer's own result then tells the coordinator what happened.
    ///
    /// # Errors
    /// Returns `PipelineError::Publish` on the first rejected publish.
    pub async fn run<S: BrokerSink + ?Sized>(
        &self,
        mut rx: EnvelopeReceiver,
        sink: &mut S,
    ) -> Result<u64, PipelineError> {
        let mut count: u64 = 0;

        loop {
            match rx.recv().await {
                Some(Envelope::Message(message)) => {
                    sink.publish(&message).await.map_err(PipelineError::Publish)?;
                    count += 1;
                    if self.is_progress_point(count) {
                        log::info!("Messages processed: {}", count);
                    }
                }
                Some(Envelope::EndOfStream) => break,
                None => {
                    log::warn!("Channel closed without end-of-stream after {} messages", count);
                    break;
                }
            }
        }

        log::info!("Total messages processed: {}", count);
        Ok(count)
    }
}
