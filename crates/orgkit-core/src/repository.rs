//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Organisation-scoped repositories
//! require an `organisation_id` parameter to enforce tenant isolation.
//!
//! Tree-mutating operations (`create_unit`, `reparent`, `delete_forced`,
//! role `delete`) must be atomic at the store: the service layer performs
//! precondition reads for friendly errors, but the repository transaction
//! is the actual enforcement point for the structural invariants.

use uuid::Uuid;

use crate::error::OrgResult;
use crate::models::{
    membership::{CreateMembership, Membership},
    org_unit::{CreateOrgUnit, OrgUnit, UpdateOrgUnit},
    organisation::{CreateOrganisation, Organisation, UpdateOrganisation},
    role::{CreateRole, Role, UpdateRole},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

pub trait OrganisationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateOrganisation,
    ) -> impl Future<Output = OrgResult<Organisation>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = OrgResult<Organisation>> + Send;
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = OrgResult<Organisation>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateOrganisation,
    ) -> impl Future<Output = OrgResult<Organisation>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = OrgResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = OrgResult<PaginatedResult<Organisation>>> + Send;
}

pub trait OrgUnitRepository: Send + Sync {
    /// Inserts a unit row. When `parent_id` is `None`, the implementation
    /// must re-check root uniqueness inside the same transaction as the
    /// insert and fail with a conflict if a root already exists.
    fn create_unit(&self, input: CreateOrgUnit) -> impl Future<Output = OrgResult<OrgUnit>> + Send;
    fn get(
        &self,
        organisation_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = OrgResult<OrgUnit>> + Send;
    fn list_by_organisation(
        &self,
        organisation_id: Uuid,
    ) -> impl Future<Output = OrgResult<Vec<OrgUnit>>> + Send;
    fn update(
        &self,
        organisation_id: Uuid,
        id: Uuid,
        input: UpdateOrgUnit,
    ) -> impl Future<Output = OrgResult<OrgUnit>> + Send;
    /// Rewrites `parent_id` only. Re-checks root uniqueness in-transaction
    /// when `new_parent_id` is `None`.
    fn reparent(
        &self,
        organisation_id: Uuid,
        id: Uuid,
        new_parent_id: Option<Uuid>,
    ) -> impl Future<Output = OrgResult<OrgUnit>> + Send;
    fn delete(&self, organisation_id: Uuid, id: Uuid) -> impl Future<Output = OrgResult<()>> + Send;
    /// Atomically nulls memberships scoped to the unit, reparents its
    /// children to `lift_to`, and deletes the unit.
    fn delete_forced(
        &self,
        organisation_id: Uuid,
        id: Uuid,
        lift_to: Uuid,
    ) -> impl Future<Output = OrgResult<()>> + Send;
    fn count_children(
        &self,
        organisation_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = OrgResult<u64>> + Send;
    /// Total units in the organisation; bounds defensive ancestor walks.
    fn count_by_organisation(
        &self,
        organisation_id: Uuid,
    ) -> impl Future<Output = OrgResult<u64>> + Send;
    /// The organisation's single null-parent unit, if one exists.
    fn find_root(
        &self,
        organisation_id: Uuid,
    ) -> impl Future<Output = OrgResult<Option<OrgUnit>>> + Send;
}

pub trait MembershipRepository: Send + Sync {
    fn create(
        &self,
        input: CreateMembership,
    ) -> impl Future<Output = OrgResult<Membership>> + Send;
    fn get(
        &self,
        organisation_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = OrgResult<Membership>> + Send;
    fn list_by_user(
        &self,
        organisation_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = OrgResult<Vec<Membership>>> + Send;
    fn list_by_unit(
        &self,
        organisation_id: Uuid,
        unit_id: Uuid,
    ) -> impl Future<Output = OrgResult<Vec<Membership>>> + Send;
    fn count_by_unit(
        &self,
        organisation_id: Uuid,
        unit_id: Uuid,
    ) -> impl Future<Output = OrgResult<u64>> + Send;
    /// Sets `unit_id = None` on every membership scoped to the unit.
    fn clear_unit(
        &self,
        organisation_id: Uuid,
        unit_id: Uuid,
    ) -> impl Future<Output = OrgResult<()>> + Send;
    /// Sets `role_id = None` on every membership referencing the role.
    fn clear_role(
        &self,
        organisation_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = OrgResult<()>> + Send;
    fn delete(&self, organisation_id: Uuid, id: Uuid) -> impl Future<Output = OrgResult<()>> + Send;
}

pub trait RoleRepository: Send + Sync {
    fn create(&self, input: CreateRole) -> impl Future<Output = OrgResult<Role>> + Send;
    fn get_by_id(
        &self,
        organisation_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = OrgResult<Role>> + Send;
    fn update(
        &self,
        organisation_id: Uuid,
        id: Uuid,
        input: UpdateRole,
    ) -> impl Future<Output = OrgResult<Role>> + Send;
    /// Deletes the role and nulls `role_id` on referencing memberships in
    /// the same transaction.
    fn delete(&self, organisation_id: Uuid, id: Uuid) -> impl Future<Output = OrgResult<()>> + Send;
    fn list(
        &self,
        organisation_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = OrgResult<PaginatedResult<Role>>> + Send;
}
