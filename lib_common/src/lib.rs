//! # lib_common
//!
//! Shared library behind the `stream_utility` loader. It reads a file of
//! entity references, resolves each one against an entity-resolution service
//! and relays one "affected entity" notification per line onto a message
//! queue.
//!
//! The `core` pipeline is always compiled. The adapters around it are gated
//! by folder-level features so that test crates can pull the core alone:
//!
//! - **`configs`**: CLI/env parsing and INI resolver settings.
//! - **`connections`**: RabbitMQ and Redis broker sinks.
//! - **`loggers`**: console/file logging setup.
//! - **`retrieve`**: the retrying HTTP client.
//! - **`resolvers`**: the HTTP entity-resolution adapter.

#![doc(html_logo_url = "https://example.com/logo.png")] // Placeholder
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// The producer/relay pipeline and the interfaces it drives.
pub mod core;

/// Immutable run configuration built from CLI flags and the INI file.
#[cfg(feature = "configs")]
pub mod configs;

/// Broker sink adapters.
#[cfg(feature = "connections")]
pub mod connections;

/// Logging setup.
#[cfg(feature = "loggers")]
pub mod loggers;

/// Retrying HTTP client.
#[cfg(feature = "retrieve")]
pub mod retrieve;

/// Entity-resolution adapters.
#[cfg(feature = "resolvers")]
pub mod resolvers;
