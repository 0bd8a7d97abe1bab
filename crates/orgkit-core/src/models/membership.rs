//! Membership domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The base role a membership carries when no custom role is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseRole {
    Admin,
    Staff,
    Student,
    Parent,
}

impl BaseRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseRole::Admin => "Admin",
            BaseRole::Staff => "Staff",
            BaseRole::Student => "Student",
            BaseRole::Parent => "Parent",
        }
    }
}

/// A user's membership in an organisation.
///
/// A user may hold several memberships in the same organisation, e.g. one
/// organisation-wide row plus rows scoped to individual units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub user_id: Uuid,
    pub base_role: BaseRole,
    /// Custom role attached to this membership, if any. A dangling
    /// reference (role since deleted) resolves to empty permissions.
    pub role_id: Option<Uuid>,
    /// Unit/audience this membership is scoped to. `None` means
    /// organisation-wide.
    pub unit_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    pub organisation_id: Uuid,
    pub user_id: Uuid,
    pub base_role: BaseRole,
    pub role_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
}
