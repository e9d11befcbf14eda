//! # Resolver Adapters
//!
//! Implementations of `core::resolver::Resolver` for real services.
//!
//! - **`http_resolver`**: talks to an entity-resolution service over HTTP
//!   through the retrying `retrieve::ky_http::ApiClient`.

#![forbid(unsafe_code)]

/// HTTP entity-resolution adapter.
pub mod http_resolver;

pub use http_resolver::HttpResolver;
