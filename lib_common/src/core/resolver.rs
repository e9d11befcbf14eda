//! # Resolver Interface
//!
//! The entity-resolution service is an external collaborator. The pipeline
//! only needs four operations from it, captured by the `Resolver` trait.
//! A lookup has three possible results:
//!
//! - `Ok(Lookup::Found(raw))`: the raw resolver document, parsed later by
//!   `ResolvedEntity::from_document`,
//! - `Ok(Lookup::NotFound(diagnostic))`: a normal, non-fatal outcome,
//! - `Err(ResolverError)`: anything else, fatal to the run.

use async_trait::async_trait;
use thiserror::Error;

/// Default number of retries for transient resolver failures.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// # Resolver Configuration
///
/// Settings handed to `Resolver::init`, normally loaded from the INI file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Base URL of the entity-resolution service.
    pub url: String,
    /// Optional bearer token.
    pub auth_token: Option<String>,
    /// Retries for transient transport failures.
    pub max_retries: u32,
}

impl ResolverConfig {
    /// Configuration with default retry settings and no token.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), auth_token: None, max_retries: DEFAULT_MAX_RETRIES }
    }
}

/// Result of a lookup that the pipeline can handle without aborting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Raw resolver document.
    Found(String),
    /// The resolver does not know the reference; carries its message.
    NotFound(String),
}

/// Fatal resolver failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolverError {
    /// A lookup before `init` or after `cleanup`.
    #[error("Resolver is not initialized")]
    NotInitialized,

    /// `init` could not open a session.
    #[error("Resolver initialization failed: {0}")]
    Init(String),

    /// The service could not be reached.
    #[error("Resolver request failed: {0}")]
    Transport(String),

    /// Any other failed answer.
    #[error("Resolver rejected the request (status {status}): {body}")]
    Rejected {
        /// HTTP status.
        status: u16,
        /// Response body.
        body: String,
    },
}

/// # Resolver
///
/// A session with the entity-resolution service. The producer owns exactly
/// one for the duration of a run and calls `cleanup` once on every exit path.
/// `cleanup` must be safe to call again.
#[async_trait]
pub trait Resolver: Send {
    /// Opens the session.
    async fn init(&mut self, config: &ResolverConfig) -> Result<(), ResolverError>;

    /// Looks up the entity that owns a data source record.
    async fn resolve_by_record(
        &mut self,
        data_source_code: &str,
        record_id: &str,
    ) -> Result<Lookup, ResolverError>;

    /// Looks up an entity by id.
    async fn resolve_by_entity_id(&mut self, entity_id: i64) -> Result<Lookup, ResolverError>;

    /// Releases the session.
    async fn cleanup(&mut self);
}
