//! Custom role domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a custom role applies organisation-wide or per unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleScope {
    Org,
    Unit,
}

impl RoleScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleScope::Org => "Org",
            RoleScope::Unit => "Unit",
        }
    }
}

/// An organisation-scoped custom role carrying an explicit permission-code
/// set. Deleting a role nulls `role_id` on memberships that reference it;
/// the memberships themselves are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub name: String,
    pub scope: RoleScope,
    /// Codes from the global permission catalog.
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub organisation_id: Uuid,
    pub name: String,
    pub scope: RoleScope,
    pub permissions: Vec<String>,
}

/// Fields that can be updated on an existing role.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub scope: Option<RoleScope>,
    pub permissions: Option<Vec<String>>,
}
