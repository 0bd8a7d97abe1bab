//! Organisation domain model.
//!
//! Organisations are the top-level tenancy entity. Every unit, membership
//! and custom role is scoped to exactly one organisation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of institution an organisation represents.
///
/// Fixed at creation time: the hierarchy and feature rule tables are keyed
/// by it, so changing it after units exist would invalidate the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OrganisationType {
    School,
    College,
    CoachingCenter,
    Ngo,
}

impl OrganisationType {
    /// All declared organisation types, for exhaustiveness checks.
    pub const ALL: [OrganisationType; 4] = [
        OrganisationType::School,
        OrganisationType::College,
        OrganisationType::CoachingCenter,
        OrganisationType::Ngo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrganisationType::School => "School",
            OrganisationType::College => "College",
            OrganisationType::CoachingCenter => "CoachingCenter",
            OrganisationType::Ngo => "Ngo",
        }
    }
}

/// An organisation: a school, college, coaching center or NGO.
///
/// The `metadata` blob may carry a `features` object of booleans; the
/// dashboard capability layer renders those into `<name>.enabled`
/// capability strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organisation {
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// URL-safe unique identifier (e.g., `north-hill-school`).
    pub slug: String,
    pub org_type: OrganisationType,
    /// Arbitrary key-value metadata.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new organisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganisation {
    pub name: String,
    pub slug: String,
    pub org_type: OrganisationType,
    pub metadata: Option<serde_json::Value>,
}

/// Fields that can be updated on an existing organisation.
///
/// `org_type` is deliberately absent: the type is immutable.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateOrganisation {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub metadata: Option<serde_json::Value>,
}
