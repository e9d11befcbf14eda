//! # Configuration Modules
//!
//! - **`config_pipeline`**: CLI/env flags parsed with `clap` into one
//!   immutable `PipelineConfig`, built once and passed by reference.
//! - **`config_resolver`**: the INI file that tells the resolver where the
//!   entity-resolution service lives.

#![forbid(unsafe_code)]

/// CLI flags and the immutable run configuration.
pub mod config_pipeline;
/// INI-backed resolver settings.
pub mod config_resolver;

pub use config_pipeline::{CliArgs, ConfigError, MqKind, PipelineConfig};
pub use config_resolver::{load_resolver_config, ResolverConfigError};
