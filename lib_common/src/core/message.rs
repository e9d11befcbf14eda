//! # Notification Message Builder
//!
//! Builds the canonical "affected entity" notification:
//!
//! ```text
//! {"DATA_SOURCE":"TEST","RECORD_ID":"RECORD1","AFFECTED_ENTITIES":[{"ENTITY_ID":1,"LENS_CODE":"DEFAULT"}]}
//! ```
//!
//! The key order is fixed by field declaration order, `ENTITY_ID` is a bare
//! number and every other value is a JSON string (empty when unknown).
//! Nothing in here performs I/O.

use serde::Serialize;

use crate::core::document::ResolvedEntity;

/// # Notification Message
///
/// One downstream notification, ready to be rendered to text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationMessage {
    #[serde(rename = "DATA_SOURCE")]
    data_source: String,
    #[serde(rename = "RECORD_ID")]
    record_id: String,
    #[serde(rename = "AFFECTED_ENTITIES")]
    affected_entities: Vec<AffectedEntity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct AffectedEntity {
    #[serde(rename = "ENTITY_ID")]
    entity_id: i64,
    #[serde(rename = "LENS_CODE")]
    lens_code: String,
}

impl NotificationMessage {
    /// Notification for a successfully resolved entity.
    pub fn resolved(entity: &ResolvedEntity) -> Self {
        Self {
            data_source: entity.record_source.clone(),
            record_id: entity.record_id.clone(),
            affected_entities: vec![AffectedEntity {
                entity_id: entity.entity_id,
                lens_code: entity.lens_code.clone(),
            }],
        }
    }

    /// Degraded notification for an entity id the resolver does not know.
    /// Only the requested id is carried; all string fields are empty.
    pub fn unresolved(entity_id: i64) -> Self {
        Self {
            data_source: String::new(),
            record_id: String::new(),
            affected_entities: vec![AffectedEntity { entity_id, lens_code: String::new() }],
        }
    }

    /// Renders the compact JSON text that is published to the broker.
    ///
    /// # Errors
    /// Propagates the serializer error; with these plain field types it does
    /// not occur in practice.
    pub fn render(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
