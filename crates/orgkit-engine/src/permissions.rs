//! Effective permission resolution.
//!
//! Three tiers, in order: admin wildcard, custom role code set, static
//! base-role table. The result always passes through [`expand_implied`].

use std::collections::BTreeSet;

use orgkit_core::error::{OrgError, OrgResult};
use orgkit_core::models::membership::BaseRole;
use orgkit_core::models::permission::{PermissionSet, codes};
use orgkit_core::repository::{MembershipRepository, RoleRepository};
use tracing::warn;
use uuid::Uuid;

use crate::error::EngineError;

/// Manage-code to implied read-code pairs.
static IMPLICATIONS: &[(&str, &str)] = &[
    (codes::PEOPLE_MANAGE, codes::PEOPLE_READ),
    (codes::ROLES_MANAGE, codes::ROLES_READ),
    (codes::FINANCE_INVOICES_MANAGE, codes::FINANCE_READ),
    (codes::FINANCE_PAYMENTS_MANAGE, codes::FINANCE_READ),
    (codes::TEACHING_CONTENT_MANAGE, codes::ACADEMICS_READ),
    (codes::TEACHING_ATTENDANCE_MANAGE, codes::ATTENDANCE_READ),
    (codes::COMMS_ANNOUNCE_MANAGE, codes::ANNOUNCE_READ),
];

/// The static permission table for memberships without a custom role.
///
/// Admin never reaches this table (the wildcard short-circuits first).
pub fn base_role_permissions(base_role: BaseRole) -> &'static [&'static str] {
    match base_role {
        BaseRole::Admin => &[],
        BaseRole::Staff => &[
            codes::PEOPLE_READ,
            codes::ACADEMICS_READ,
            codes::ATTENDANCE_READ,
            codes::ANNOUNCE_READ,
            codes::TEACHING_CONTENT_MANAGE,
            codes::TEACHING_ATTENDANCE_MANAGE,
            codes::COMMS_ANNOUNCE_MANAGE,
        ],
        BaseRole::Student | BaseRole::Parent => &[
            codes::ACADEMICS_READ,
            codes::ATTENDANCE_READ,
            codes::ANNOUNCE_READ,
        ],
    }
}

/// Adds the read codes implied by manage codes. Pure and idempotent:
/// read-only UI affordances become visible to anyone who could also manage
/// the resource, without duplicating codes in the static tables.
pub fn expand_implied(permission_codes: &BTreeSet<String>) -> BTreeSet<String> {
    let mut expanded = permission_codes.clone();
    for (manage, read) in IMPLICATIONS {
        if expanded.contains(*manage) {
            expanded.insert((*read).to_string());
        }
    }
    expanded
}

/// Resolves a caller's effective permission set within an organisation.
pub struct PermissionResolverService<M, R> {
    membership_repo: M,
    role_repo: R,
}

impl<M, R> PermissionResolverService<M, R>
where
    M: MembershipRepository,
    R: RoleRepository,
{
    pub fn new(membership_repo: M, role_repo: R) -> Self {
        Self {
            membership_repo,
            role_repo,
        }
    }

    /// Effective permissions for `(organisation_id, user_id)`.
    ///
    /// Fails closed: a caller with no membership gets `Forbidden`, never an
    /// empty set that downstream code might treat as "member with nothing".
    /// A dangling `role_id` contributes no codes (and is logged) — it must
    /// not silently fall back to the base-role table.
    pub async fn resolve_permissions(
        &self,
        organisation_id: Uuid,
        user_id: Uuid,
    ) -> OrgResult<PermissionSet> {
        let memberships = self
            .membership_repo
            .list_by_user(organisation_id, user_id)
            .await?;

        // 1. Not a member.
        if memberships.is_empty() {
            return Err(EngineError::NotAMember.into());
        }

        // 2. Admin wildcard beats everything, including any role_id also
        //    set on the same row.
        if memberships
            .iter()
            .any(|m| m.base_role == BaseRole::Admin)
        {
            return Ok(PermissionSet::All);
        }

        // 3./4. Union over the caller's memberships: custom role codes
        //    where a role is attached, base-role table otherwise.
        let mut resolved = BTreeSet::new();
        for membership in &memberships {
            match membership.role_id {
                Some(role_id) => {
                    match self.role_repo.get_by_id(organisation_id, role_id).await {
                        Ok(role) => resolved.extend(role.permissions.iter().cloned()),
                        Err(OrgError::NotFound { .. }) => {
                            warn!(
                                %organisation_id,
                                membership_id = %membership.id,
                                %role_id,
                                "membership references a missing role; resolving to no codes"
                            );
                        }
                        Err(e) => return Err(e),
                    }
                }
                None => resolved.extend(
                    base_role_permissions(membership.base_role)
                        .iter()
                        .map(|code| (*code).to_string()),
                ),
            }
        }

        Ok(PermissionSet::Codes(expand_implied(&resolved)))
    }
}
