//! Error types for the orgkit system.

use thiserror::Error;

/// Counts reported alongside a "unit not empty" conflict so the caller can
/// decide whether to retry with `force`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictDetails {
    pub children_count: u64,
    pub member_count: u64,
}

#[derive(Debug, Error)]
pub enum OrgError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Conflict: {reason}")]
    Conflict {
        reason: String,
        details: Option<ConflictDetails>,
    },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Terminal for the request. Must not leak whether the resource exists
    /// beyond what the route already implies.
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type OrgResult<T> = Result<T, OrgError>;
