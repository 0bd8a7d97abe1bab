//! Organisational unit domain model.
//!
//! Units form a tree per organisation. Exactly one unit per organisation
//! has `parent_id == None`, and that unit is typed [`UnitType::Root`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The structural kind of a unit within the organisation tree.
///
/// `Root` is the single tree sentinel (the only unit with no parent);
/// `Organisation` is the institution-level unit directly under it. All
/// other types are interior or leaf nodes whose nesting is governed by the
/// rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    Root,
    Organisation,
    Department,
    Class,
    Section,
    Subject,
    Batch,
    Group,
    Other,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Root => "Root",
            UnitType::Organisation => "Organisation",
            UnitType::Department => "Department",
            UnitType::Class => "Class",
            UnitType::Section => "Section",
            UnitType::Subject => "Subject",
            UnitType::Batch => "Batch",
            UnitType::Group => "Group",
            UnitType::Other => "Other",
        }
    }
}

/// A node in an organisation's unit tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgUnit {
    pub id: Uuid,
    pub organisation_id: Uuid,
    /// `None` only for the tree root.
    pub parent_id: Option<Uuid>,
    pub unit_type: UnitType,
    pub name: String,
    /// Arbitrary key-value metadata.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrgUnit {
    pub organisation_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub unit_type: UnitType,
    pub name: String,
    pub metadata: Option<serde_json::Value>,
}

/// Fields that can be updated in place on an existing unit.
///
/// Structural fields (`parent_id`, `unit_type`) are mutated only through
/// the tree service, never directly.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateOrgUnit {
    pub name: Option<String>,
    pub metadata: Option<serde_json::Value>,
}
