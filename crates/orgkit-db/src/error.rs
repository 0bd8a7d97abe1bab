//! Database-specific error types and conversions.

use orgkit_core::error::OrgError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// An in-transaction invariant check threw (e.g. "root exists").
    #[error("Conflict: {reason}")]
    Conflict { reason: String },
}

impl From<DbError> for OrgError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => OrgError::NotFound { entity, id },
            DbError::Conflict { reason } => OrgError::Conflict {
                reason,
                details: None,
            },
            other => OrgError::Database(other.to_string()),
        }
    }
}
