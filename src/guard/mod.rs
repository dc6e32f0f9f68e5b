//! Private-content guard.
//!
//! Decides, per branch, whether a set of staged files may be committed, and
//! checks whole branch histories for paths that should never have reached a
//! public branch. On public branches every path matching a sensitive pattern
//! (private directories and files, credential names, backup leftovers,
//! configured patterns) or whose content matches a secret pattern is a
//! violation. Oversized files are rejected everywhere; Windows reserved names
//! only produce warnings.
//!
//! Violations are always blocked, never silently filtered out of a commit.

mod classify;
mod excludes;
mod history;
mod staged;
mod types;

#[cfg(test)]
mod tests;

pub use classify::PrivateContentGuard;
pub use excludes::{EXCLUDE_FILE_NAME, exclude_file_contents, install_excludes};
pub use staged::read_staged_changes;
pub use types::{CommitClassification, StagedChange, Violation};
