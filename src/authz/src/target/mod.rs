//! Repository targets: path pattern matching scoped by content class
//!
//! A target's patterns are compiled once. Frequent shapes (`prefix.*`,
//! `.*needle.*`, `(?!.*needle.*).*`) become string operations and the rest
//! become anchored regexes. A `.*` pattern makes every other pattern
//! irrelevant.

mod matcher;
mod registry;
mod types;

pub use matcher::{PathMatcher, PatternError, MATCH_ALL};
pub use registry::TargetRegistry;
pub use types::{ContentClass, StaticContentClass, Target};
