//! # HTTP Resolver
//!
//! Resolves references against an entity-resolution service exposing:
//!
//! - `GET {base}/entities/by-record/{data_source}/{record_id}`
//! - `GET {base}/entities/{entity_id}`
//!
//! A 2xx answer carries the resolver document. The service reports unknown
//! references either with a 404 or with an error body containing one of the
//! "unknown" markers below; both become `Lookup::NotFound`. Every other
//! answer is fatal.

use async_trait::async_trait;

use crate::core::resolver::{Lookup, Resolver, ResolverConfig, ResolverError};
use crate::retrieve::ky_http::{ApiClient, ApiResponse};

/// Error text the service uses for an unknown data source record.
pub const UNKNOWN_RECORD_MARKER: &str = "Unknown record";
/// Error text the service uses for an unknown entity id.
pub const UNKNOWN_ENTITY_MARKER: &str = "Unknown resolved entity value";

const NOT_FOUND_STATUS: u16 = 404;

/// # HTTP Resolver
///
/// Holds an `ApiClient` between `init` and `cleanup`.
#[derive(Debug, Default)]
pub struct HttpResolver {
    client: Option<ApiClient>,
}

impl HttpResolver {
    /// An uninitialized resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `init` succeeded and `cleanup` has not run since.
    pub fn is_initialized(&self) -> bool {
        self.client.is_some()
    }

    async fn lookup(&self, segments: &[&str], marker: &str) -> Result<Lookup, ResolverError> {
        let client = self.client.as_ref().ok_or(ResolverError::NotInitialized)?;
        let response = client
            .get_text(segments)
            .await
            .map_err(|e| ResolverError::Transport(format!("{:#}", e)))?;
        classify(response, marker)
    }
}

/// Maps a service answer onto the lookup outcome.
fn classify(response: ApiResponse<String>, marker: &str) -> Result<Lookup, ResolverError> {
    if response.success {
        return Ok(Lookup::Found(response.data.unwrap_or_default()));
    }

    let body = response.error_body.unwrap_or_default();
    if response.status == NOT_FOUND_STATUS || body.contains(marker) {
        let detail = if body.trim().is_empty() {
            format!("status {}", response.status)
        } else {
            body.trim().to_string()
        };
        return Ok(Lookup::NotFound(detail));
    }

    Err(ResolverError::Rejected { status: response.status, body })
}

#[async_trait]
impl Resolver for HttpResolver {
    async fn init(&mut self, config: &ResolverConfig) -> Result<(), ResolverError> {
        let client = ApiClient::new(&config.url, config.auth_token.clone(), config.max_retries)
            .map_err(|e| ResolverError::Init(format!("{:#}", e)))?;
        log::info!("Resolver session opened on {}", client.base_url());
        self.client = Some(client);
        Ok(())
    }

    async fn resolve_by_record(
        &mut self,
        data_source_code: &str,
        record_id: &str,
    ) -> Result<Lookup, ResolverError> {
        self.lookup(&["entities", "by-record", data_source_code, record_id], UNKNOWN_RECORD_MARKER)
            .await
    }

    async fn resolve_by_entity_id(&mut self, entity_id: i64) -> Result<Lookup, ResolverError> {
        let id = entity_id.to_string();
        self.lookup(&["entities", id.as_str()], UNKNOWN_ENTITY_MARKER).await
    }

    async fn cleanup(&mut self) {
        if self.client.take().is_some() {
            log::debug!("Resolver session closed");
        }
    }
}
