//! Implementation of the `repokit check` command.

use super::ManagedRepo;
use crate::cli::CheckArgs;
use crate::error::Result;
use crate::guard::PrivateContentGuard;
use std::path::Path;

/// Validate the index of a working copy for the branch checked out there.
///
/// Meant to run before committing (for example from a pre-commit hook).
/// Violations fail with `PrivateContentDetected` or `OversizedFile`;
/// warnings are printed and do not fail.
pub fn cmd_check(cwd: &Path, args: CheckArgs) -> Result<()> {
    let worktree = match args.worktree {
        Some(path) if path.is_absolute() => path,
        Some(path) => cwd.join(path),
        None => cwd.to_path_buf(),
    };

    let repo = ManagedRepo::open(&worktree)?;
    let guard = PrivateContentGuard::new(
        &repo.plan.graph,
        &repo.plan.matcher,
        &repo.config.sensitive,
    );

    let classification = guard.validate_staged(&worktree)?;
    for warning in &classification.warnings {
        println!("warning: {}", warning);
    }
    println!(
        "Staged changes on '{}' are safe to commit.",
        classification.branch
    );
    Ok(())
}
