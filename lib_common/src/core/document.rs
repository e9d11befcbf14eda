//! # Resolver Document Parsing
//!
//! The resolver answers a successful lookup with a JSON document of the form
//!
//! ```text
//! {"RESOLVED_ENTITY":{"ENTITY_ID":1,"LENS_CODE":"DEFAULT",
//!   "RECORDS":[{"DATA_SOURCE":"TEST","RECORD_ID":"RECORD1"}, ...]}}
//! ```
//!
//! Only the entity id, lens code and the first record are used.

use serde::Deserialize;
use thiserror::Error;

/// Reasons a resolver payload cannot be used to build a notification.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The payload does not start with `{`.
    #[error("payload is not a JSON object: {0:?}")]
    NotAnObject(String),

    /// The payload is not a `RESOLVED_ENTITY` document.
    #[error("payload is not a resolved entity document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The entity carries no records.
    #[error("resolved entity {0} has no records")]
    NoRecords(i64),
}

/// # Resolved Entity
///
/// The fields of a resolver document that end up in a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntity {
    /// Resolved entity id.
    pub entity_id: i64,
    /// Lens the entity was resolved under.
    pub lens_code: String,
    /// Data source of the entity's first record.
    pub record_source: String,
    /// Record id of the entity's first record.
    pub record_id: String,
}

#[derive(Deserialize)]
struct Document {
    #[serde(rename = "RESOLVED_ENTITY")]
    resolved_entity: EntityBody,
}

#[derive(Deserialize)]
struct EntityBody {
    #[serde(rename = "ENTITY_ID")]
    entity_id: i64,
    #[serde(rename = "LENS_CODE")]
    lens_code: String,
    #[serde(rename = "RECORDS")]
    records: Vec<RecordBody>,
}

#[derive(Deserialize)]
struct RecordBody {
    #[serde(rename = "DATA_SOURCE")]
    data_source: String,
    #[serde(rename = "RECORD_ID")]
    record_id: String,
}

impl ResolvedEntity {
    /// # From Document
    ///
    /// Parses the raw text returned by the resolver. Leading and trailing
    /// whitespace is ignored; anything that does not start with `{` is
    /// rejected before JSON parsing is attempted.
    ///
    /// # Errors
    /// Returns a `DocumentError` when the payload is not an object, does not
    /// match the expected shape, or carries no records.
    pub fn from_document(raw: &str) -> Result<Self, DocumentError> {
        let trimmed = raw.trim();
        if !trimmed.starts_with('{') {
            return Err(DocumentError::NotAnObject(trimmed.to_string()));
        }

        let document: Document = serde_json::from_str(trimmed)?;
        let entity = document.resolved_entity;
        let first = entity
            .records
            .into_iter()
            .next()
            .ok_or(DocumentError::NoRecords(entity.entity_id))?;

        Ok(Self {
            entity_id: entity.entity_id,
            lens_code: entity.lens_code,
            record_source: first.data_source,
            record_id: first.record_id,
        })
    }
}
