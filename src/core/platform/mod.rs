pub mod descriptor;
pub mod rules;

pub use descriptor::{OsFamily, PlatformDescriptor};
pub use rules::{evaluate, OsPredicate, PlatformRule, RuleAction};
