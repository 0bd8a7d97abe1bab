//! Engine error types.

use orgkit_core::error::{ConflictDetails, OrgError};
use orgkit_core::models::org_unit::UnitType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("root unit already exists for this organisation")]
    RootExists,

    #[error("the root unit cannot be moved or deleted")]
    RootImmutable,

    #[error("unit not empty: {children_count} children, {member_count} memberships")]
    UnitNotEmpty {
        children_count: u64,
        member_count: u64,
    },

    #[error("cannot move a unit under its own descendant")]
    CycleDetected,

    #[error("unit type {child:?} is not allowed under parent type {parent:?}")]
    TypeNotAllowed {
        parent: Option<UnitType>,
        child: UnitType,
    },

    #[error("parent unit does not belong to this organisation")]
    ParentOutsideOrganisation,

    #[error("ancestor walk exceeded the organisation's unit count; the stored tree may be corrupt")]
    DepthGuardExceeded,

    #[error("caller is not a member of this organisation")]
    NotAMember,

    #[error("force delete requires the '{0}' permission")]
    MissingForcePermission(&'static str),
}

impl From<EngineError> for OrgError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::RootExists => OrgError::Conflict {
                reason: "root exists".into(),
                details: None,
            },
            EngineError::UnitNotEmpty {
                children_count,
                member_count,
            } => OrgError::Conflict {
                reason: "unit not empty".into(),
                details: Some(ConflictDetails {
                    children_count,
                    member_count,
                }),
            },
            EngineError::RootImmutable
            | EngineError::CycleDetected
            | EngineError::TypeNotAllowed { .. }
            | EngineError::ParentOutsideOrganisation
            | EngineError::DepthGuardExceeded => OrgError::Validation {
                message: err.to_string(),
            },
            EngineError::NotAMember | EngineError::MissingForcePermission(_) => {
                OrgError::Forbidden {
                    reason: err.to_string(),
                }
            }
        }
    }
}
