//! Per-unit-type feature flags.

use serde::{Deserialize, Serialize};

/// Boolean feature switches derived for a `(organisation type, unit type)`
/// pair.
///
/// Values are immutable; combination happens through [`FeatureFlags::merge`],
/// where an enabled flag always wins. This makes the additive-override
/// ordering of the rule table structural: no later rule can turn a flag
/// back off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub attendance: bool,
    pub assignments: bool,
    pub tests: bool,
    pub notes: bool,
    pub fees: bool,
    pub announcements: bool,
    pub content: bool,
    pub live_class: bool,
    pub interactions: bool,
    pub timetable: bool,
    pub results: bool,
    pub achievements: bool,
}

impl FeatureFlags {
    /// All flags off.
    pub const fn none() -> Self {
        FeatureFlags {
            attendance: false,
            assignments: false,
            tests: false,
            notes: false,
            fees: false,
            announcements: false,
            content: false,
            live_class: false,
            interactions: false,
            timetable: false,
            results: false,
            achievements: false,
        }
    }

    /// Combines two flag sets; a flag enabled on either side stays enabled.
    #[must_use]
    pub const fn merge(self, other: FeatureFlags) -> FeatureFlags {
        FeatureFlags {
            attendance: self.attendance || other.attendance,
            assignments: self.assignments || other.assignments,
            tests: self.tests || other.tests,
            notes: self.notes || other.notes,
            fees: self.fees || other.fees,
            announcements: self.announcements || other.announcements,
            content: self.content || other.content,
            live_class: self.live_class || other.live_class,
            interactions: self.interactions || other.interactions,
            timetable: self.timetable || other.timetable,
            results: self.results || other.results,
            achievements: self.achievements || other.achievements,
        }
    }
}
