//! Dashboard capability composition.
//!
//! Merges resolved permissions with the organisation's feature toggles
//! into one capability answer, then filters the static widget/table
//! registries against it. Feature toggles become `"<name>.enabled"`
//! capability strings; organisation-type suppression runs after the union
//! and before any registry filtering.

use std::collections::BTreeSet;

use orgkit_core::error::OrgResult;
use orgkit_core::models::organisation::OrganisationType;
use orgkit_core::models::permission::{PermissionSet, codes};
use orgkit_core::repository::{MembershipRepository, OrganisationRepository, RoleRepository};
use serde::Serialize;
use uuid::Uuid;

use crate::permissions::PermissionResolverService;

/// The combined capability answer for one caller in one organisation.
#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    pub permissions: PermissionSet,
    /// `"<feature>.enabled"` strings from the organisation's toggles.
    pub feature_caps: BTreeSet<String>,
    /// Capability strings this organisation type never sees. Checked
    /// before anything else, so suppression also masks the admin wildcard.
    pub suppressed: BTreeSet<String>,
}

impl Capabilities {
    /// Whether one required capability string is satisfied.
    ///
    /// `*.enabled` strings are answered only by the feature toggles; all
    /// other strings are permission codes (where the admin wildcard
    /// satisfies any code, but never a feature toggle).
    pub fn satisfies(&self, requirement: &str) -> bool {
        if self.suppressed.contains(requirement) {
            return false;
        }
        if requirement.ends_with(".enabled") {
            self.feature_caps.contains(requirement)
        } else {
            self.permissions.contains(requirement)
        }
    }
}

/// One entry of a widget or table registry.
#[derive(Debug, Clone, Copy)]
pub struct RegistryEntry {
    pub name: &'static str,
    /// Every listed capability must be satisfied (logical AND).
    pub required: &'static [&'static str],
}

/// The built-in dashboard widget registry.
pub fn default_widget_registry() -> &'static [RegistryEntry] {
    &[
        RegistryEntry {
            name: "attendance-summary",
            required: &["attendance.enabled", codes::ATTENDANCE_READ],
        },
        RegistryEntry {
            name: "timetable-today",
            required: &["timetable.enabled", codes::ACADEMICS_READ],
        },
        RegistryEntry {
            name: "fee-collection",
            required: &["fees.enabled", codes::FINANCE_READ],
        },
        RegistryEntry {
            name: "announcements",
            required: &["announcements.enabled", codes::ANNOUNCE_READ],
        },
        RegistryEntry {
            name: "results-overview",
            required: &["results.enabled", codes::ACADEMICS_READ],
        },
        RegistryEntry {
            name: "people-overview",
            required: &[codes::PEOPLE_READ],
        },
        RegistryEntry {
            name: "live-class-now",
            required: &["live_class.enabled", codes::ACADEMICS_READ],
        },
    ]
}

/// The built-in admin table registry.
pub fn default_table_registry() -> &'static [RegistryEntry] {
    &[
        RegistryEntry {
            name: "students",
            required: &[codes::PEOPLE_READ],
        },
        RegistryEntry {
            name: "staff",
            required: &[codes::PEOPLE_MANAGE],
        },
        RegistryEntry {
            name: "roles",
            required: &[codes::ROLES_READ],
        },
        RegistryEntry {
            name: "invoices",
            required: &["fees.enabled", codes::FINANCE_INVOICES_MANAGE],
        },
        RegistryEntry {
            name: "payments",
            required: &["fees.enabled", codes::FINANCE_READ],
        },
        RegistryEntry {
            name: "attendance-register",
            required: &["attendance.enabled", codes::TEACHING_ATTENDANCE_MANAGE],
        },
        RegistryEntry {
            name: "announcement-log",
            required: &["announcements.enabled", codes::ANNOUNCE_READ],
        },
    ]
}

/// Registry entries whose every requirement the capabilities satisfy.
pub fn visible_entries<'a>(
    registry: &'a [RegistryEntry],
    capabilities: &Capabilities,
) -> Vec<&'a str> {
    registry
        .iter()
        .filter(|entry| entry.required.iter().all(|req| capabilities.satisfies(req)))
        .map(|entry| entry.name)
        .collect()
}

pub fn visible_widgets(capabilities: &Capabilities) -> Vec<&'static str> {
    visible_entries(default_widget_registry(), capabilities)
}

pub fn visible_tables(capabilities: &Capabilities) -> Vec<&'static str> {
    visible_entries(default_table_registry(), capabilities)
}

/// Builds [`Capabilities`] for a caller.
pub struct DashboardCapabilityService<O, M, R> {
    org_repo: O,
    resolver: PermissionResolverService<M, R>,
}

impl<O, M, R> DashboardCapabilityService<O, M, R>
where
    O: OrganisationRepository,
    M: MembershipRepository,
    R: RoleRepository,
{
    pub fn new(org_repo: O, resolver: PermissionResolverService<M, R>) -> Self {
        Self { org_repo, resolver }
    }

    pub async fn build_capabilities(
        &self,
        organisation_id: Uuid,
        user_id: Uuid,
    ) -> OrgResult<Capabilities> {
        let org = self.org_repo.get_by_id(organisation_id).await?;
        let permissions = self
            .resolver
            .resolve_permissions(organisation_id, user_id)
            .await?;

        Ok(Capabilities {
            permissions,
            feature_caps: feature_caps_from_metadata(&org.metadata),
            suppressed: suppressed_for(org.org_type),
        })
    }
}

/// Renders the `features` boolean map of an organisation's metadata into
/// capability strings. Missing or malformed maps yield no capabilities.
fn feature_caps_from_metadata(metadata: &serde_json::Value) -> BTreeSet<String> {
    let mut caps = BTreeSet::new();
    if let Some(features) = metadata.get("features").and_then(|f| f.as_object()) {
        for (name, value) in features {
            if value.as_bool() == Some(true) {
                caps.insert(format!("{name}.enabled"));
            }
        }
    }
    caps
}

fn suppressed_for(org_type: OrganisationType) -> BTreeSet<String> {
    match org_type {
        // NGOs never see finance, whatever the toggles or roles say.
        OrganisationType::Ngo => [
            "fees.enabled",
            codes::FINANCE_READ,
            codes::FINANCE_INVOICES_MANAGE,
            codes::FINANCE_PAYMENTS_MANAGE,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        _ => BTreeSet::new(),
    }
}
