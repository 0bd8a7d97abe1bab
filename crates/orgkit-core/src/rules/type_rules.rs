//! The per-organisation-type hierarchy and feature rule table.
//!
//! Keyed by `(OrganisationType, UnitType)`. Each entry declares which unit
//! types may nest under the keyed parent type, and the default feature
//! flags a unit of the keyed type starts with. Two structural rules sit
//! outside the table and are organisation-type independent: an organisation
//! with no units may only create a `Root`, and the only child of `Root` is
//! `Organisation`.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use crate::error::{OrgError, OrgResult};
use crate::models::org_unit::UnitType;
use crate::models::organisation::OrganisationType;
use crate::rules::features::FeatureFlags;

#[derive(Debug, Clone)]
struct RuleEntry {
    children: &'static [UnitType],
    defaults: FeatureFlags,
}

/// Compiled hierarchy/feature rules. Built once, read-only afterwards.
pub struct TypeRuleTable {
    entries: HashMap<(OrganisationType, UnitType), RuleEntry>,
}

impl TypeRuleTable {
    /// Returns the process-wide table, building and validating it on first
    /// use. A validation failure here means the compiled-in data is wrong,
    /// so startup aborts.
    pub fn global() -> &'static TypeRuleTable {
        static TABLE: OnceLock<TypeRuleTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            let table = TypeRuleTable::compiled();
            table
                .validate()
                .expect("compiled type rule table failed validation");
            table
        })
    }

    /// Every declared organisation type must have an `Organisation` entry,
    /// i.e. a rule reachable from the implicit Root -> Organisation edge.
    pub fn validate(&self) -> OrgResult<()> {
        for org_type in OrganisationType::ALL {
            if !self
                .entries
                .contains_key(&(org_type, UnitType::Organisation))
            {
                return Err(OrgError::Validation {
                    message: format!(
                        "rule table has no Organisation entry for {}",
                        org_type.as_str()
                    ),
                });
            }
        }
        Ok(())
    }

    /// Unit types that may be created under a parent of `parent_type`.
    ///
    /// `None` parent means the organisation has no units yet: only a root
    /// may be created. An empty result means "no children allowed here",
    /// not an error.
    pub fn allowed_children(
        &self,
        org_type: OrganisationType,
        parent_type: Option<UnitType>,
    ) -> BTreeSet<UnitType> {
        match parent_type {
            None => BTreeSet::from([UnitType::Root]),
            Some(UnitType::Root) => BTreeSet::from([UnitType::Organisation]),
            Some(parent) => self
                .entries
                .get(&(org_type, parent))
                .map(|e| e.children.iter().copied().collect())
                .unwrap_or_default(),
        }
    }

    /// Table default flags for a unit type; all-off when no entry exists.
    pub fn feature_defaults(
        &self,
        org_type: OrganisationType,
        unit_type: UnitType,
    ) -> FeatureFlags {
        self.entries
            .get(&(org_type, unit_type))
            .map(|e| e.defaults)
            .unwrap_or_default()
    }

    /// Effective flags: table defaults plus the unconditional overrides.
    ///
    /// Overrides are additive and applied in a fixed order so later rules
    /// can re-assert flags the defaults left off.
    pub fn compute_unit_features(
        &self,
        org_type: OrganisationType,
        unit_type: UnitType,
    ) -> FeatureFlags {
        let mut flags = self.feature_defaults(org_type, unit_type);

        // Delivery-level unit types always track attendance and results.
        if matches!(
            unit_type,
            UnitType::Class | UnitType::Section | UnitType::Subject | UnitType::Batch
        ) {
            flags = flags.merge(FeatureFlags {
                attendance: true,
                results: true,
                ..FeatureFlags::none()
            });
        }

        if matches!(
            unit_type,
            UnitType::Class | UnitType::Section | UnitType::Batch
        ) {
            flags = flags.merge(FeatureFlags {
                timetable: true,
                ..FeatureFlags::none()
            });
        }

        if unit_type == UnitType::Class {
            flags = flags.merge(FeatureFlags {
                achievements: true,
                ..FeatureFlags::none()
            });
        }

        flags
    }

    fn compiled() -> TypeRuleTable {
        use OrganisationType::*;
        use UnitType::*;

        let mut entries = HashMap::new();
        let mut rule = |org: OrganisationType,
                        unit: UnitType,
                        children: &'static [UnitType],
                        defaults: FeatureFlags| {
            entries.insert((org, unit), RuleEntry { children, defaults });
        };

        // ---------------- School ----------------
        rule(
            School,
            Organisation,
            &[Department, Class, Group, Other],
            FeatureFlags {
                fees: true,
                announcements: true,
                interactions: true,
                ..FeatureFlags::none()
            },
        );
        rule(
            School,
            Department,
            &[Class, Group, Other],
            FeatureFlags {
                announcements: true,
                content: true,
                ..FeatureFlags::none()
            },
        );
        rule(
            School,
            Class,
            &[Section, Subject, Group, Batch, Other],
            FeatureFlags {
                assignments: true,
                tests: true,
                notes: true,
                content: true,
                live_class: true,
                interactions: true,
                ..FeatureFlags::none()
            },
        );
        rule(
            School,
            Section,
            &[Subject, Group, Other],
            FeatureFlags {
                assignments: true,
                notes: true,
                content: true,
                ..FeatureFlags::none()
            },
        );
        rule(
            School,
            Batch,
            &[Subject, Group, Other],
            FeatureFlags {
                assignments: true,
                tests: true,
                notes: true,
                content: true,
                live_class: true,
                ..FeatureFlags::none()
            },
        );
        rule(
            School,
            Subject,
            &[Group, Other],
            FeatureFlags {
                notes: true,
                content: true,
                ..FeatureFlags::none()
            },
        );
        rule(
            School,
            Group,
            &[Other],
            FeatureFlags {
                announcements: true,
                interactions: true,
                ..FeatureFlags::none()
            },
        );

        // ---------------- College ----------------
        rule(
            College,
            Organisation,
            &[Department, Group, Other],
            FeatureFlags {
                fees: true,
                announcements: true,
                interactions: true,
                ..FeatureFlags::none()
            },
        );
        rule(
            College,
            Department,
            &[Class, Batch, Group, Other],
            FeatureFlags {
                announcements: true,
                content: true,
                ..FeatureFlags::none()
            },
        );
        rule(
            College,
            Class,
            &[Section, Subject, Group, Batch, Other],
            FeatureFlags {
                assignments: true,
                tests: true,
                notes: true,
                content: true,
                live_class: true,
                ..FeatureFlags::none()
            },
        );
        rule(
            College,
            Section,
            &[Subject, Group, Other],
            FeatureFlags {
                notes: true,
                content: true,
                ..FeatureFlags::none()
            },
        );
        rule(
            College,
            Batch,
            &[Subject, Group, Other],
            FeatureFlags {
                assignments: true,
                tests: true,
                content: true,
                live_class: true,
                ..FeatureFlags::none()
            },
        );
        rule(
            College,
            Subject,
            &[Group, Other],
            FeatureFlags {
                notes: true,
                content: true,
                ..FeatureFlags::none()
            },
        );
        rule(
            College,
            Group,
            &[Other],
            FeatureFlags {
                interactions: true,
                ..FeatureFlags::none()
            },
        );

        // ------------- Coaching center -------------
        rule(
            CoachingCenter,
            Organisation,
            &[Department, Batch, Group, Other],
            FeatureFlags {
                fees: true,
                announcements: true,
                interactions: true,
                ..FeatureFlags::none()
            },
        );
        rule(
            CoachingCenter,
            Department,
            &[Batch, Group, Other],
            FeatureFlags {
                announcements: true,
                ..FeatureFlags::none()
            },
        );
        rule(
            CoachingCenter,
            Batch,
            &[Subject, Group, Other],
            FeatureFlags {
                assignments: true,
                tests: true,
                notes: true,
                content: true,
                live_class: true,
                ..FeatureFlags::none()
            },
        );
        rule(
            CoachingCenter,
            Subject,
            &[Group, Other],
            FeatureFlags {
                notes: true,
                content: true,
                ..FeatureFlags::none()
            },
        );
        rule(
            CoachingCenter,
            Group,
            &[Other],
            FeatureFlags {
                interactions: true,
                ..FeatureFlags::none()
            },
        );

        // ---------------- NGO ----------------
        // No fee collection at any level.
        rule(
            Ngo,
            Organisation,
            &[Department, Group, Other],
            FeatureFlags {
                announcements: true,
                interactions: true,
                ..FeatureFlags::none()
            },
        );
        rule(
            Ngo,
            Department,
            &[Group, Other],
            FeatureFlags {
                announcements: true,
                content: true,
                ..FeatureFlags::none()
            },
        );
        rule(
            Ngo,
            Group,
            &[Other],
            FeatureFlags {
                interactions: true,
                ..FeatureFlags::none()
            },
        );

        TypeRuleTable { entries }
    }
}
