//! SurrealDB repository implementations.

mod membership;
mod org_unit;
mod organisation;
mod role;

pub use membership::SurrealMembershipRepository;
pub use org_unit::SurrealOrgUnitRepository;
pub use organisation::SurrealOrganisationRepository;
pub use role::SurrealRoleRepository;
