//! Repository orchestration.
//!
//! `adopt` turns a directory (empty, plain, or an existing git repository)
//! into a managed repository:
//!
//! 1. Plan: resolve the strategy, directories and patterns; refuse a managed
//!    repository whose marker disagrees unless forced
//! 2. Initialize git if needed, HEAD on the private branch
//! 3. Take the repository lock and one lock per working copy, then snapshot
//! 4. Mark the repository `adopting`
//! 5. Create and commit the directory structure on the private branch
//! 6. Create public branches with private paths left out of their trees
//! 7. Create worktrees and install guard excludes in them
//! 8. Verify every public branch's history
//! 9. Mark the repository `managed` and record an `adopt` event
//!
//! Failures in steps 4-8 restore the snapshot and return `AdoptionFailed`.

mod adopt;
mod plan;
mod snapshot;
mod status;


pub use adopt::{AdoptRequest, AdoptionReport, adopt};
pub use plan::AdoptionPlan;
pub use snapshot::RepositorySnapshot;
pub use status::{BranchStatus, RepositoryStatus};
