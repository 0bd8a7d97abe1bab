//! Domain models for orgkit.
//!
//! These are the core types shared across all crates.

pub mod membership;
pub mod org_unit;
pub mod organisation;
pub mod permission;
pub mod role;
