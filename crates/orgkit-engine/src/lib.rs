//! ORGKIT Engine — organisation hierarchy & authorization services.
//!
//! Every service is generic over the repository traits defined in
//! `orgkit-core`, so this crate has no dependency on the database crate
//! and can be exercised against any conforming store.

pub mod access;
pub mod dashboard;
pub mod error;
pub mod permissions;
pub mod tree;

pub use access::AccessScopeService;
pub use dashboard::{
    Capabilities, DashboardCapabilityService, RegistryEntry, default_table_registry,
    default_widget_registry, visible_entries, visible_tables, visible_widgets,
};
pub use error::EngineError;
pub use permissions::{PermissionResolverService, base_role_permissions, expand_implied};
pub use tree::{OrgUnitTreeService, UnitNode};
