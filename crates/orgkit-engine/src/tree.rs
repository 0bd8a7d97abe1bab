//! Organisation unit tree — structural mutations and listings.
//!
//! The service performs precondition reads so callers get precise errors,
//! but every mutation is re-checked inside the repository's store
//! transaction; that transaction is the actual enforcement point for the
//! single-root and lift-atomicity invariants.

use std::collections::HashMap;

use orgkit_core::error::{OrgError, OrgResult};
use orgkit_core::models::org_unit::{CreateOrgUnit, OrgUnit, UnitType};
use orgkit_core::models::permission::{PermissionSet, codes};
use orgkit_core::repository::{MembershipRepository, OrgUnitRepository, OrganisationRepository};
use orgkit_core::rules::TypeRuleTable;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::EngineError;

/// A unit together with its resolved children.
#[derive(Debug, Clone, Serialize)]
pub struct UnitNode {
    pub unit: OrgUnit,
    pub children: Vec<UnitNode>,
}

/// Tree operations over an organisation's units.
pub struct OrgUnitTreeService<O, U, M> {
    org_repo: O,
    unit_repo: U,
    membership_repo: M,
    rules: &'static TypeRuleTable,
}

impl<O, U, M> OrgUnitTreeService<O, U, M>
where
    O: OrganisationRepository,
    U: OrgUnitRepository,
    M: MembershipRepository,
{
    pub fn new(org_repo: O, unit_repo: U, membership_repo: M) -> Self {
        Self {
            org_repo,
            unit_repo,
            membership_repo,
            rules: TypeRuleTable::global(),
        }
    }

    /// Creates a unit under `input.parent_id`.
    ///
    /// The unit type must be allowed under the parent's type for the
    /// organisation's type. A `None` parent is only valid while the
    /// organisation has no root yet.
    pub async fn create_unit(&self, input: CreateOrgUnit) -> OrgResult<OrgUnit> {
        let org = self.org_repo.get_by_id(input.organisation_id).await?;

        // 1. Resolve the parent's type; a parent id outside this
        //    organisation is a validation error, not a 404.
        let parent_type = match input.parent_id {
            None => None,
            Some(parent_id) => {
                let parent = self.fetch_parent(input.organisation_id, parent_id).await?;
                Some(parent.unit_type)
            }
        };

        // 2. Rule table check.
        let allowed = self.rules.allowed_children(org.org_type, parent_type);
        if !allowed.contains(&input.unit_type) {
            return Err(EngineError::TypeNotAllowed {
                parent: parent_type,
                child: input.unit_type,
            }
            .into());
        }

        // 3. Single-root precondition read. The repository re-checks this
        //    inside its insert transaction.
        if input.parent_id.is_none()
            && self
                .unit_repo
                .find_root(input.organisation_id)
                .await?
                .is_some()
        {
            return Err(EngineError::RootExists.into());
        }

        self.unit_repo.create_unit(input).await
    }

    /// Reparents a unit. The root never moves; no unit may move under its
    /// own descendant; no second null-parent unit may appear.
    pub async fn move_unit(
        &self,
        organisation_id: Uuid,
        unit_id: Uuid,
        new_parent_id: Option<Uuid>,
    ) -> OrgResult<OrgUnit> {
        let org = self.org_repo.get_by_id(organisation_id).await?;
        let unit = self.unit_repo.get(organisation_id, unit_id).await?;

        if unit.parent_id.is_none() {
            return Err(EngineError::RootImmutable.into());
        }

        match new_parent_id {
            None => {
                if self.unit_repo.find_root(organisation_id).await?.is_some() {
                    return Err(EngineError::RootExists.into());
                }
            }
            Some(parent_id) => {
                if parent_id == unit_id {
                    return Err(EngineError::CycleDetected.into());
                }
                let parent = self.fetch_parent(organisation_id, parent_id).await?;

                let allowed = self
                    .rules
                    .allowed_children(org.org_type, Some(parent.unit_type));
                if !allowed.contains(&unit.unit_type) {
                    return Err(EngineError::TypeNotAllowed {
                        parent: Some(parent.unit_type),
                        child: unit.unit_type,
                    }
                    .into());
                }

                if self
                    .is_descendant(organisation_id, unit_id, parent_id)
                    .await?
                {
                    return Err(EngineError::CycleDetected.into());
                }
            }
        }

        self.unit_repo
            .reparent(organisation_id, unit_id, new_parent_id)
            .await
    }

    /// Deletes a unit. The root is undeletable. A unit with children or
    /// scoped memberships requires `force`, which in turn requires the
    /// caller to hold `units.force_delete`; the forced path atomically
    /// lifts children to the root and widens scoped memberships to
    /// organisation scope.
    pub async fn delete_unit(
        &self,
        organisation_id: Uuid,
        unit_id: Uuid,
        force: bool,
        caller: &PermissionSet,
    ) -> OrgResult<()> {
        let unit = self.unit_repo.get(organisation_id, unit_id).await?;
        if unit.parent_id.is_none() {
            return Err(EngineError::RootImmutable.into());
        }

        let children_count = self
            .unit_repo
            .count_children(organisation_id, unit_id)
            .await?;
        let member_count = self
            .membership_repo
            .count_by_unit(organisation_id, unit_id)
            .await?;

        if children_count == 0 && member_count == 0 {
            return self.unit_repo.delete(organisation_id, unit_id).await;
        }

        if !force {
            return Err(EngineError::UnitNotEmpty {
                children_count,
                member_count,
            }
            .into());
        }
        if !caller.contains(codes::UNITS_FORCE_DELETE) {
            return Err(EngineError::MissingForcePermission(codes::UNITS_FORCE_DELETE).into());
        }

        let root = self
            .unit_repo
            .find_root(organisation_id)
            .await?
            .ok_or_else(|| OrgError::Internal("organisation has no root unit".into()))?;

        self.unit_repo
            .delete_forced(organisation_id, unit_id, root.id)
            .await
    }

    /// All units of the organisation, unordered.
    pub async fn list_flat(&self, organisation_id: Uuid) -> OrgResult<Vec<OrgUnit>> {
        self.unit_repo.list_by_organisation(organisation_id).await
    }

    /// The organisation's unit forest, built from one flat fetch and an
    /// in-memory parent index. Units whose parent row is missing are
    /// excluded and reported as a consistency warning.
    pub async fn list_tree(&self, organisation_id: Uuid) -> OrgResult<Vec<UnitNode>> {
        let units = self.unit_repo.list_by_organisation(organisation_id).await?;
        let known: std::collections::HashSet<Uuid> = units.iter().map(|u| u.id).collect();

        let mut roots = Vec::new();
        let mut children_of: HashMap<Uuid, Vec<OrgUnit>> = HashMap::new();
        for unit in units {
            match unit.parent_id {
                None => roots.push(unit),
                Some(parent_id) if known.contains(&parent_id) => {
                    children_of.entry(parent_id).or_default().push(unit);
                }
                Some(parent_id) => {
                    warn!(
                        %organisation_id,
                        unit_id = %unit.id,
                        %parent_id,
                        "unit parent is missing; excluding unit from tree"
                    );
                }
            }
        }

        Ok(roots
            .into_iter()
            .map(|root| build_node(root, &mut children_of))
            .collect())
    }

    /// Whether `candidate_id` sits below `ancestor_id` in the tree.
    ///
    /// Walks `candidate_id`'s parent chain upward. The walk is bounded by
    /// the organisation's unit count so a corrupt (cyclic) stored tree
    /// cannot loop the request.
    pub async fn is_descendant(
        &self,
        organisation_id: Uuid,
        ancestor_id: Uuid,
        candidate_id: Uuid,
    ) -> OrgResult<bool> {
        let max_depth = self
            .unit_repo
            .count_by_organisation(organisation_id)
            .await?;

        let mut current = candidate_id;
        for _ in 0..=max_depth {
            let unit = self.unit_repo.get(organisation_id, current).await?;
            match unit.parent_id {
                None => return Ok(false),
                Some(parent_id) if parent_id == ancestor_id => return Ok(true),
                Some(parent_id) => current = parent_id,
            }
        }
        Err(EngineError::DepthGuardExceeded.into())
    }

    async fn fetch_parent(&self, organisation_id: Uuid, parent_id: Uuid) -> OrgResult<OrgUnit> {
        match self.unit_repo.get(organisation_id, parent_id).await {
            Ok(parent) => Ok(parent),
            Err(OrgError::NotFound { .. }) => Err(EngineError::ParentOutsideOrganisation.into()),
            Err(e) => Err(e),
        }
    }
}

fn build_node(unit: OrgUnit, children_of: &mut HashMap<Uuid, Vec<OrgUnit>>) -> UnitNode {
    let children = children_of
        .remove(&unit.id)
        .map(|kids| {
            kids.into_iter()
                .map(|kid| build_node(kid, children_of))
                .collect()
        })
        .unwrap_or_default();
    UnitNode { unit, children }
}
