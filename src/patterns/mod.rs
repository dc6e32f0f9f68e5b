//! Sensitive-content pattern matching for repokit.
//!
//! A single [`PatternMatcher`] holds every pattern the guard and the sanitizer
//! consult, each tagged with the catalog ([`PatternSet`]) it came from:
//!
//! - `private_path`: private directories and files (`private/`, `CLAUDE.md`, ...)
//! - `credential`: credential-looking file names and secret material in content
//! - `backup`: editor and scratch leftovers (`*.bak`, `*~`, `*.log`, ...)
//! - `reserved_name`: Windows reserved device names (warnings only)
//! - `custom`: patterns from configuration
//!
//! Globs are compiled with `globset`, regexes with `regex`, once, when the
//! matcher is built. Invalid patterns are configuration errors (exit 1).

mod defaults;
mod matcher;
mod types;

#[cfg(test)]
mod tests;

pub use defaults::{builtin_patterns, reserved_name_pattern};
pub use matcher::PatternMatcher;
pub use types::{PatternKind, PatternMatch, PatternScope, PatternSet, SensitivePattern};
