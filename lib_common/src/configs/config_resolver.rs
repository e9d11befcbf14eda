//! # Resolver INI Configuration
//!
//! The `--ini-file` points at an INI document whose `[RESOLVER]` section
//! describes the entity-resolution service:
//!
//! ```ini
//! [RESOLVER]
//! URL = http://resolver.internal:8250/
//! AUTH_TOKEN = optional-bearer-token
//! MAX_RETRIES = 3
//! ```
//!
//! The file is read through `more-config` and flattened into a
//! `section:key` map (lower-cased) before the known keys are picked out, so
//! other sections of a shared INI file are ignored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{ext::*, *};
use thiserror::Error;

use crate::core::resolver::{ResolverConfig, DEFAULT_MAX_RETRIES};

const KEY_URL: &str = "resolver:url";
const KEY_AUTH_TOKEN: &str = "resolver:auth_token";
const KEY_MAX_RETRIES: &str = "resolver:max_retries";

/// Problems with the resolver INI file.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolverConfigError {
    /// The path is not a file.
    #[error("INI file not found: {0}")]
    NotFound(PathBuf),

    /// The file is not valid INI.
    #[error("Failed to read INI file {path}: {reason}")]
    Unreadable {
        /// INI path.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// No usable `URL` key.
    #[error("Missing [RESOLVER] URL in INI file")]
    MissingUrl,

    /// `MAX_RETRIES` is not a number.
    #[error("Invalid [RESOLVER] MAX_RETRIES value: {0:?}")]
    InvalidRetries(String),
}

/// # Load Resolver Config
///
/// Reads `ini_path` and extracts the resolver settings.
///
/// # Errors
/// Returns `ResolverConfigError` when the file is missing, cannot be parsed,
/// or lacks a usable `[RESOLVER]` section.
pub fn load_resolver_config(ini_path: &Path) -> Result<ResolverConfig, ResolverConfigError> {
    if !ini_path.is_file() {
        return Err(ResolverConfigError::NotFound(ini_path.to_path_buf()));
    }

    let ini_file: String = ini_path.to_string_lossy().to_string();
    let config_data: Box<dyn ConfigurationRoot> = DefaultConfigurationBuilder::new()
        .add_ini_file(&ini_file.is())
        .build()
        .map_err(|e| ResolverConfigError::Unreadable {
            path: ini_path.to_path_buf(),
            reason: format!("{:?}", e),
        })?;

    let mut entries: BTreeMap<String, String> = BTreeMap::new();
    for (key, value) in config_data.iter(None) {
        entries.insert(key.to_string().to_lowercase(), value.to_string());
    }

    resolver_config_from_entries(&entries)
}

/// Picks the resolver settings out of a flattened `section:key` map.
/// Keys are expected in lower case.
///
/// # Errors
/// Returns `MissingUrl` when no non-empty URL is present and
/// `InvalidRetries` when `MAX_RETRIES` is not a number.
pub fn resolver_config_from_entries(
    entries: &BTreeMap<String, String>,
) -> Result<ResolverConfig, ResolverConfigError> {
    let url = entries
        .get(KEY_URL)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ResolverConfigError::MissingUrl)?;

    let auth_token = entries
        .get(KEY_AUTH_TOKEN)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let max_retries = match entries.get(KEY_MAX_RETRIES) {
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ResolverConfigError::InvalidRetries(raw.clone()))?,
        None => DEFAULT_MAX_RETRIES,
    };

    Ok(ResolverConfig { url, auth_token, max_retries })
}
