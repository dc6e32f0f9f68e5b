//! Error types for repokit.
//!
//! Uses thiserror for derive macros. Every rejection names the offending paths,
//! branches or identifiers so a human can decide whether to adjust patterns or
//! strategy.

use crate::exit_codes;
use thiserror::Error;

/// A historical commit that would carry private content into a public branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsafeCommit {
    /// Full commit SHA.
    pub sha: String,
    /// First line of the commit message.
    pub summary: String,
    /// Paths touched by the commit that match a sensitive pattern.
    pub paths: Vec<String>,
}

/// Main error type for repokit operations.
#[derive(Error, Debug)]
pub enum RepokitError {
    /// Strategy name unknown or custom spec malformed.
    #[error("invalid branch strategy: {0}")]
    InvalidStrategy(String),

    /// Directory profile name not found in the catalog.
    #[error("unknown directory profile '{0}'")]
    UnknownProfile(String),

    /// Directory group name not found in the catalog.
    #[error("unknown directory group '{0}'")]
    UnknownGroup(String),

    /// Staged paths match sensitive patterns on a public branch.
    #[error(
        "private content staged on public branch '{branch}':\n{}\n\nFix: unstage these paths or commit them on the private branch.",
        bullet_list(.paths)
    )]
    PrivateContentDetected { branch: String, paths: Vec<String> },

    /// Staged files exceed the configured size threshold.
    #[error(
        "files exceed the {limit}-byte limit:\n{}",
        .files.iter().map(|(p, s)| format!("  x {} ({} bytes)", p, s)).collect::<Vec<_>>().join("\n")
    )]
    OversizedFile { limit: u64, files: Vec<(String, u64)> },

    /// The branch working copy is checked out elsewhere or locked by another process.
    #[error("branch '{branch}' is locked: {reason}")]
    BranchLocked { branch: String, reason: String },

    /// A preserved commit range would introduce private content into a public branch.
    #[error(
        "unsafe history: preserving '{source_branch}' into '{target_branch}' would publish private content\n{}",
        .commits.iter().map(|c| format!("  {} {}\n{}", short_sha(&c.sha), c.summary, bullet_list(&c.paths))).collect::<Vec<_>>().join("\n")
    )]
    UnsafeHistory {
        source_branch: String,
        target_branch: String,
        commits: Vec<UnsafeCommit>,
    },

    /// Materialization failed; the repository was restored from its snapshot.
    #[error("adoption failed: {cause}{}", rollback_notes(.rollback_problems))]
    AdoptionFailed {
        cause: String,
        rollback_problems: Vec<String>,
    },

    /// Repository state contradicts the recorded marker file.
    #[error("repository state is inconsistent with its marker: {0}\n\nRe-run with --force to proceed anyway.")]
    CorruptedState(String),

    /// The merge rules classify the branch as interactive and no choice was given.
    #[error("merging '{branch}' needs an explicit choice: pass --squash or --preserve")]
    MergeModeRequired { branch: String },

    /// User provided invalid arguments or the system is in an invalid state.
    #[error("{0}")]
    UserError(String),

    /// Git operation failed.
    #[error("Git operation failed: {0}")]
    GitError(String),

    /// Repository operation lock could not be acquired.
    #[error("Lock acquisition failed: {0}")]
    LockError(String),
}

impl RepokitError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            RepokitError::InvalidStrategy(_)
            | RepokitError::UnknownProfile(_)
            | RepokitError::UnknownGroup(_)
            | RepokitError::CorruptedState(_)
            | RepokitError::MergeModeRequired { .. }
            | RepokitError::UserError(_) => exit_codes::USER_ERROR,
            RepokitError::PrivateContentDetected { .. }
            | RepokitError::OversizedFile { .. }
            | RepokitError::UnsafeHistory { .. } => exit_codes::POLICY_VIOLATION,
            RepokitError::GitError(_) => exit_codes::GIT_FAILURE,
            RepokitError::BranchLocked { .. } | RepokitError::LockError(_) => {
                exit_codes::LOCK_FAILURE
            }
            RepokitError::AdoptionFailed { .. } => exit_codes::ROLLED_BACK,
        }
    }
}

/// Result type alias for repokit operations.
pub type Result<T> = std::result::Result<T, RepokitError>;

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|p| format!("  x {}", p))
        .collect::<Vec<_>>()
        .join("\n")
}

fn short_sha(sha: &str) -> &str {
    sha.get(..10).unwrap_or(sha)
}

fn rollback_notes(problems: &[String]) -> String {
    if problems.is_empty() {
        "\nThe repository was restored to its state before the operation.".to_string()
    } else {
        format!(
            "\nRollback was incomplete:\n{}",
            problems
                .iter()
                .map(|p| format!("  ! {}", p))
                .collect::<Vec<_>>()
                .join("\n")
        )
    }
}
