//! Audience access scoping.

use orgkit_core::error::OrgResult;
use orgkit_core::models::membership::BaseRole;
use orgkit_core::repository::MembershipRepository;
use uuid::Uuid;

/// Decides whether a caller's memberships grant access to one unit.
pub struct AccessScopeService<M> {
    membership_repo: M,
}

impl<M: MembershipRepository> AccessScopeService<M> {
    pub fn new(membership_repo: M) -> Self {
        Self { membership_repo }
    }

    /// Whether the user may address the given unit/audience.
    ///
    /// Only an organisation-wide *admin* membership bypasses unit scoping;
    /// an organisation-wide staff/student/parent membership does not.
    /// Otherwise an exact-match row on `unit_id` is required — a
    /// membership on a parent unit grants nothing on its children.
    pub async fn has_audience_access(
        &self,
        organisation_id: Uuid,
        unit_id: Uuid,
        user_id: Uuid,
    ) -> OrgResult<bool> {
        let memberships = self
            .membership_repo
            .list_by_user(organisation_id, user_id)
            .await?;

        if memberships
            .iter()
            .any(|m| m.base_role == BaseRole::Admin && m.unit_id.is_none())
        {
            return Ok(true);
        }

        Ok(memberships.iter().any(|m| m.unit_id == Some(unit_id)))
    }
}
