//! Exit code constants for the repokit CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, unknown strategy/profile, invalid state)
//! - 2: Policy violation (private content, oversized file, unsafe history)
//! - 3: Git operation failure
//! - 4: Lock acquisition failure (including locked branches)
//! - 5: Operation failed and was rolled back

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, unknown catalog entries, or invalid state.
pub const USER_ERROR: i32 = 1;

/// Policy violation: private content, oversized files, or unsafe history.
pub const POLICY_VIOLATION: i32 = 2;

/// Git operation failure: branch creation, worktree, merge-tree, ref updates.
pub const GIT_FAILURE: i32 = 3;

/// Lock acquisition failure: repository or branch working copy already in use.
pub const LOCK_FAILURE: i32 = 4;

/// Materialization failed and the repository was restored from its snapshot.
pub const ROLLED_BACK: i32 = 5;
