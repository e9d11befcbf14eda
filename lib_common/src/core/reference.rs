//! # Input Line Parsing
//!
//! Every non-blank line of the input file names one thing to resolve:
//!
//! - `DSRC_CODE,RECORD_ID` (fields optionally wrapped in double quotes, any
//!   fields after the second are ignored), or
//! - a bare decimal entity id.
//!
//! Parsing is strict about entity ids: a single field that is not an integer
//! is an error, and the producer treats it as fatal for the whole run.

use thiserror::Error;

const SEPARATOR: char = ',';
const DOUBLE_QUOTE: char = '"';

/// # Reference
///
/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// Lookup by data source code and record id.
    Record {
        /// The data source code (first field).
        data_source_code: String,
        /// The record id within that data source (second field).
        record_id: String,
    },
    /// Lookup by resolved entity id.
    Entity {
        /// The requested entity id.
        entity_id: i64,
    },
}

/// Why a line could not be turned into a `Reference`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// A single-field line that is not an integer.
    #[error("Not a valid entity id: {0:?}")]
    InvalidEntityId(String),

    /// A record line with an empty data source or record id.
    #[error("Missing data source code or record id in {0:?}")]
    IncompleteRecord(String),
}

impl Reference {
    /// Short human-readable form used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Reference::Record { data_source_code, record_id } => {
                format!("DSRC_CODE {} and RECORD_ID {}", data_source_code, record_id)
            }
            Reference::Entity { entity_id } => format!("entity ID {}", entity_id),
        }
    }
}

/// # Parse Line
///
/// Turns one input line into a `Reference`.
///
/// # Returns
/// - `Ok(None)` for a blank line, which the producer skips without touching
///   the resolver.
/// - `Ok(Some(..))` for a record or entity reference.
///
/// # Errors
/// Returns `ReferenceError::InvalidEntityId` for a single field that is not
/// an integer, and `ReferenceError::IncompleteRecord` when a comma-separated
/// line has an empty first or second field.
pub fn parse_line(line: &str) -> Result<Option<Reference>, ReferenceError> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    if line.contains(SEPARATOR) {
        // Only the first two fields are meaningful.
        let mut fields = line.split(SEPARATOR);
        let data_source_code = fields.next().map(strip_quotes).unwrap_or_default();
        let record_id = fields.next().map(strip_quotes).unwrap_or_default();

        if data_source_code.is_empty() || record_id.is_empty() {
            return Err(ReferenceError::IncompleteRecord(line.to_string()));
        }
        return Ok(Some(Reference::Record { data_source_code, record_id }));
    }

    line.trim()
        .parse::<i64>()
        .map(|entity_id| Some(Reference::Entity { entity_id }))
        .map_err(|_| ReferenceError::InvalidEntityId(line.to_string()))
}

/// Trims the field and drops one double quote from each end, if present.
fn strip_quotes(field: &str) -> String {
    let trimmed = field.trim();
    let trimmed = trimmed.strip_prefix(DOUBLE_QUOTE).unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(DOUBLE_QUOTE).unwrap_or(trimmed);
    trimmed.to_string()
}
