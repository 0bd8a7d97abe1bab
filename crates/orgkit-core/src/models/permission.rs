//! Permission catalog and effective permission sets.
//!
//! Permission codes are flat strings, global across all organisations.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The global permission-code catalog.
pub mod codes {
    pub const PEOPLE_MANAGE: &str = "people.manage";
    pub const PEOPLE_READ: &str = "people.read";
    pub const ROLES_MANAGE: &str = "roles.manage";
    pub const ROLES_READ: &str = "roles.read";
    pub const FINANCE_INVOICES_MANAGE: &str = "finance.invoices.manage";
    pub const FINANCE_PAYMENTS_MANAGE: &str = "finance.payments.manage";
    pub const FINANCE_READ: &str = "finance.read";
    pub const TEACHING_CONTENT_MANAGE: &str = "teaching.content.manage";
    pub const ACADEMICS_READ: &str = "academics.read";
    pub const TEACHING_ATTENDANCE_MANAGE: &str = "teaching.attendance.manage";
    pub const ATTENDANCE_READ: &str = "attendance.read";
    pub const COMMS_ANNOUNCE_MANAGE: &str = "comms.announce.manage";
    pub const ANNOUNCE_READ: &str = "announce.read";
    pub const UNITS_MANAGE: &str = "units.manage";
    /// Elevated permission gating `delete_unit(force = true)`.
    pub const UNITS_FORCE_DELETE: &str = "units.force_delete";
}

/// Every code in the catalog.
pub fn catalog() -> &'static [&'static str] {
    use codes::*;
    &[
        PEOPLE_MANAGE,
        PEOPLE_READ,
        ROLES_MANAGE,
        ROLES_READ,
        FINANCE_INVOICES_MANAGE,
        FINANCE_PAYMENTS_MANAGE,
        FINANCE_READ,
        TEACHING_CONTENT_MANAGE,
        ACADEMICS_READ,
        TEACHING_ATTENDANCE_MANAGE,
        ATTENDANCE_READ,
        COMMS_ANNOUNCE_MANAGE,
        ANNOUNCE_READ,
        UNITS_MANAGE,
        UNITS_FORCE_DELETE,
    ]
}

/// The effective permissions of a caller.
///
/// The admin wildcard is a dedicated variant rather than a magic `'*'`
/// code, so callers cannot mistake it for a literal entry in a code set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionSet {
    /// Grants every permission check unconditionally (admin shortcut).
    All,
    /// An explicit set of permission codes.
    Codes(BTreeSet<String>),
}

impl PermissionSet {
    pub fn empty() -> Self {
        PermissionSet::Codes(BTreeSet::new())
    }

    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PermissionSet::Codes(codes.into_iter().map(Into::into).collect())
    }

    /// Whether this set grants the given permission code.
    pub fn contains(&self, code: &str) -> bool {
        match self {
            PermissionSet::All => true,
            PermissionSet::Codes(set) => set.contains(code),
        }
    }

    /// True for an empty explicit code set; the wildcard is never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            PermissionSet::All => false,
            PermissionSet::Codes(set) => set.is_empty(),
        }
    }
}
