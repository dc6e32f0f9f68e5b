//! repokit: a multi-branch repository orchestrator that keeps a private line
//! of development out of public history.
//!
//! The private branch lives in the main working copy; public branches live in
//! worktrees and are derived from it through filtered trees and sanitized
//! merges. Nothing that matches a private pattern ever reaches a commit
//! reachable from a public branch.

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod directories;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod git;
pub mod guard;
pub mod locks;
pub mod logging;
pub mod orchestrator;
pub mod patterns;
pub mod remote;
pub mod sanitize;
pub mod state;
pub mod strategy;
pub mod templates;
pub mod vcs;

#[cfg(test)]
mod test_support;
