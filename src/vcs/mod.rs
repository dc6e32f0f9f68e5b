//! Discrete version-control operations for repokit.
//!
//! Every repository mutation repokit performs goes through one of these
//! helpers, each of which issues a single scoped git command:
//!
//! - Repository init and staging/committing in a working copy
//! - Branch creation, lookup and deletion
//! - Worktree listing, creation and removal
//! - History queries (rev-list ranges, touched paths, ancestry)
//! - Tree plumbing (ls-tree, filtered trees, merge-tree, commit-tree)
//! - Ref updates with compare-and-swap semantics
//!
//! All git failures are mapped to exit code 3 (RepokitError::GitError).

mod branch;
mod history;
mod refs;
mod repo;
mod tree;
mod worktree;

pub use branch::{branch_exists, branch_tip, create_branch, delete_branch, list_branches};
pub use history::{
    CommitInfo, CommitPaths, commit_info, commit_range, history_paths, is_ancestor, merge_base,
    touched_paths,
};
pub use refs::{RefEntry, advance_branch, delete_ref, list_refs, read_ref, update_ref};
pub use repo::{
    commit, commit_allow_empty, head_branch, init_repository, is_git_repository, rev_parse,
    set_head, stage_all, stage_paths, staged_paths, unstage_paths, untracked_paths,
};
pub use tree::{
    MergeTreeOutcome, Signature, TreeEntry, commit_tree, empty_tree, filtered_tree, ls_tree,
    merge_tree, tree_of,
};
pub use worktree::{
    ExistingWorktree, create_worktree, find_worktree_for_branch, list_worktrees, paths_equivalent,
    remove_worktree, sync_checkout,
};
