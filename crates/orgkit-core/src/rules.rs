//! The hierarchy & feature rules: pure data and pure lookups.
//!
//! Everything here is compiled into the binary, built once at process
//! start, and never mutated. Unlimited concurrent readers are safe.

pub mod features;
pub mod type_rules;

pub use features::FeatureFlags;
pub use type_rules::TypeRuleTable;
