//! Filesystem utilities for repokit.
//!
//! Atomic writes for state files under the git directory, and the small
//! directory helpers adoption uses to scaffold (and roll back) the resolved
//! directory layout.

pub mod atomic;
mod scaffold;

pub use atomic::{atomic_write, atomic_write_file};
pub use scaffold::{GITKEEP, ensure_dir_with_gitkeep, remove_if_empty};
