//! Knowledge-layer error types
//!
//! Errors raised while reading or mutating observables, relationships and
//! their attached artefacts (works, files, connectors).

use thiserror::Error;

use super::core_error::{CoreError, CoreErrorKind};

#[derive(Error, Debug)]
pub enum KnowledgeError {
    /// Entity not found by internal id
    #[error("{entity_type} {id} not found")]
    NotFound { entity_type: String, id: String },

    /// Field is not editable through a patch
    #[error("Field '{0}' cannot be patched")]
    ReadOnlyField(String),

    /// Patch value does not fit the field
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// Unknown aggregation field
    #[error("Cannot aggregate on field '{0}'")]
    UnsupportedField(String),

    /// Malformed pagination cursor
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// Connector cannot handle this entity or format
    #[error("Connector {connector} does not support {target}")]
    UnsupportedConnector { connector: String, target: String },

    /// Relationship already present
    #[error("Relationship {relationship_type} {from} -> {to} already exists")]
    DuplicateRelationship {
        relationship_type: String,
        from: String,
        to: String,
    },

    /// Underlying store failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl KnowledgeError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        KnowledgeError::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            KnowledgeError::NotFound { .. } | KnowledgeError::Database(_)
        )
    }
}

impl From<KnowledgeError> for CoreError {
    fn from(err: KnowledgeError) -> Self {
        match err {
            KnowledgeError::NotFound { entity_type, id } => CoreError::not_found(entity_type, id),
            KnowledgeError::DuplicateRelationship { .. } => {
                CoreError::new(CoreErrorKind::Conflict, err.to_string())
            }
            KnowledgeError::Database(db) => CoreError::from(db),
            other => CoreError::validation(other.to_string()),
        }
    }
}
