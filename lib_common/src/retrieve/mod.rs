//! # Data Retrieval Module
//!
//! Generic HTTP plumbing shared by the resolver adapters.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: an `ApiClient` built on `reqwest` and
//!   `reqwest-middleware`, with exponential-backoff retries for transient
//!   failures. Callers hand it path segments and get the raw body back
//!   together with the status, so they can decide what a non-2xx answer
//!   means for them.

#![forbid(unsafe_code)]

/// Generic HTTP API client with retry middleware.
pub mod ky_http;

pub use ky_http::{ApiClient, ApiResponse};
