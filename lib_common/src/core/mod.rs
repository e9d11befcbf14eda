//! # Core Pipeline Module
//!
//! This module forms the heart of the loader. It aggregates everything needed
//! to turn an input file into an ordered stream of published notifications.
//!
//! ## Core Components:
//!
//! - **`reference`**: parses one input line into a record or entity reference.
//! - **`document`**: extracts a `ResolvedEntity` from the resolver's JSON document.
//! - **`message`**: the pure builder for the canonical notification text.
//! - **`channel`**: the bounded FIFO and its `Envelope` element type.
//! - **`producer`**: the file-reading task that resolves and enqueues.
//! - **`relay`**: the consumer that drains the channel into a broker sink.
//! - **`coordinator`**: wires the two sides together and owns shutdown.
//! - **`resolver`** / **`sink`**: the interfaces of the external collaborators.

#![forbid(unsafe_code)]

/// Bounded channel and its element type.
pub mod channel;
/// Runs one file through the producer and relay.
pub mod coordinator;
/// Resolver document parsing.
pub mod document;
/// Pipeline error taxonomy.
pub mod error;
/// Canonical notification builder.
pub mod message;
/// File-reading producer.
pub mod producer;
/// Input line parsing.
pub mod reference;
/// Channel consumer publishing to the broker.
pub mod relay;
/// Entity-resolution interface.
pub mod resolver;
/// Broker sink interface.
pub mod sink;

// --- Public API Re-exports ---
pub use channel::{Envelope, EnvelopeReceiver, EnvelopeSender};
pub use coordinator::{run_pipeline, PipelineSettings, RunSummary};
pub use document::{DocumentError, ResolvedEntity};
pub use error::PipelineError;
pub use message::NotificationMessage;
pub use producer::{LineOutcome, LineProducer, ProducerReport};
pub use reference::{parse_line, Reference, ReferenceError};
pub use relay::QueueRelay;
pub use resolver::{Lookup, Resolver, ResolverConfig, ResolverError};
pub use sink::{BrokerConfig, BrokerKind, BrokerSink, Credentials, SinkError};
