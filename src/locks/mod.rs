//! Locking subsystem for repokit.
//!
//! Two kinds of locks guard repository mutations:
//! - Repository operation lock (`repository.lock`), held by adopt, promote,
//!   cascade and publish
//! - Per-branch working-copy lock (`branch-<name>.lock`), held while a branch's
//!   worktree is created or its ref is moved
//!
//! # Lock Files
//!
//! Lock files live in `<git-common-dir>/repokit/locks/`, outside every working
//! copy. They are created with **create_new** semantics (exclusive create) so
//! only one process can hold a given lock. Contention fails immediately; there
//! is no queueing.
//!
//! # Lock Metadata
//!
//! Each lock file contains JSON metadata:
//! - `owner`: The owner of the lock (e.g., `user@HOST`)
//! - `pid`: The process ID (optional)
//! - `created_at`: RFC3339 timestamp
//! - `action`: The action being performed (adopt/promote/cascade/etc.)
//!
//! # RAII Guards
//!
//! Locks are released when their guard is dropped. A failed release is logged
//! as a warning and never panics.

mod guard;
mod metadata;
mod operations;
mod types;

#[cfg(test)]
mod tests;

pub use guard::LockGuard;
pub use metadata::LockMetadata;
pub use operations::{acquire_branch_lock, acquire_repository_lock, clear_lock, list_locks};
pub use types::{LockInfo, LockType};
