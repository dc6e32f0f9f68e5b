//! CLI argument parsing for repokit.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use crate::config::{ConfigOverrides, PrivateSetSelector};
use crate::error::{RepokitError, Result};
use crate::sanitize::MergeMode;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// repokit: keep a private line of development out of public history.
///
/// A managed repository has one private branch checked out in the main
/// working copy and public branches in worktrees under `.worktrees/`:
/// - Public branches never contain a commit touching a private path
/// - Promotion moves work forward along the strategy's branch graph
/// - Only public branches can be published
#[derive(Parser, Debug)]
#[command(name = "repokit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace). RUST_LOG wins.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Run as if repokit was started in DIR.
    #[arg(short = 'C', long = "directory", value_name = "DIR", global = true)]
    pub directory: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for repokit.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Adopt a directory or existing repository.
    ///
    /// Creates the private branch, public branches with private paths left
    /// out of their history, worktrees, and the directory structure.
    Adopt(AdoptArgs),

    /// Show branches, worktrees and pending promotions.
    Status,

    /// Check the staged changes of a working copy against the guard.
    Check(CheckArgs),

    /// Merge one branch into another through the history sanitizer.
    Promote(PromoteArgs),

    /// Promote the private branch along the forward path to a target.
    Cascade(CascadeArgs),

    /// Guard maintenance commands.
    Guard(GuardCommand),

    /// Inspect branch strategies.
    Strategy(StrategyCommand),

    /// Show the directory set a selection resolves to.
    Dirs(SelectionArgs),

    /// Print the effective configuration with every layer merged.
    Config(SelectionArgs),

    /// Lock management commands.
    ///
    /// List or clear repository and branch locks.
    Lock(LockCommand),

    /// Push a public branch to a remote after verifying its history.
    Publish(PublishArgs),

    /// Show the audit event log.
    Log(LogArgs),
}

/// Strategy and directory selection shared by `adopt` and `dirs`.
#[derive(Args, Debug, Default, Clone)]
pub struct SelectionArgs {
    /// Catalog strategy (simple, standard, gitflow, github-flow, minimal).
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Directory profile.
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Directory groups to add to the profile.
    #[arg(short, long = "group", value_delimiter = ',')]
    pub groups: Vec<String>,

    /// Explicit directories, added after the profile and groups.
    #[arg(long = "dir", value_delimiter = ',')]
    pub dirs: Vec<String>,

    /// Private directory set (standard, enhanced).
    #[arg(long)]
    pub private_set: Option<String>,
}

impl SelectionArgs {
    /// Configuration overrides for the flags that were given.
    pub fn to_overrides(&self) -> Result<ConfigOverrides> {
        let private_set = match &self.private_set {
            Some(s) => Some(PrivateSetSelector::from_str(s).ok_or_else(|| {
                RepokitError::UserError(format!(
                    "unknown private set '{}' (expected standard or enhanced)",
                    s
                ))
            })?),
            None => None,
        };

        Ok(ConfigOverrides {
            strategy: self.strategy.clone(),
            directory_profile: self.profile.clone(),
            directory_groups: (!self.groups.is_empty()).then(|| self.groups.clone()),
            directories: (!self.dirs.is_empty()).then(|| self.dirs.clone()),
            private_set,
            worktrees_dir: None,
        })
    }
}

/// Arguments for the `adopt` command.
#[derive(Parser, Debug)]
pub struct AdoptArgs {
    /// Directory to adopt; created if missing. Defaults to the current directory.
    pub path: Option<PathBuf>,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Adopt even when the state marker disagrees with the repository.
    #[arg(long)]
    pub force: bool,

    /// Project name used in generated files.
    #[arg(long)]
    pub name: Option<String>,

    /// Project description used in generated files.
    #[arg(long, default_value = "")]
    pub description: String,

    /// Do not generate README.md and .gitignore.
    #[arg(long)]
    pub no_templates: bool,

    /// Print the plan without touching anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `check` command.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Working copy to check. Defaults to the current directory.
    pub worktree: Option<PathBuf>,
}

/// Explicit merge mode for branches the rules leave interactive.
#[derive(Args, Debug, Default, Clone, Copy)]
#[group(multiple = false)]
pub struct ModeArgs {
    /// Collapse the range into one sanitized commit.
    #[arg(long)]
    pub squash: bool,

    /// Keep every commit of the range.
    #[arg(long)]
    pub preserve: bool,
}

impl ModeArgs {
    pub fn mode(&self) -> Option<MergeMode> {
        if self.squash {
            Some(MergeMode::Squash)
        } else if self.preserve {
            Some(MergeMode::Preserve)
        } else {
            None
        }
    }
}

/// Arguments for the `promote` command.
#[derive(Parser, Debug)]
pub struct PromoteArgs {
    /// Branch to merge from.
    pub source: String,

    /// Branch to merge into.
    pub target: String,

    #[command(flatten)]
    pub mode: ModeArgs,
}

/// Arguments for the `cascade` command.
#[derive(Parser, Debug)]
pub struct CascadeArgs {
    /// Last branch of the promotion path.
    pub target: String,

    #[command(flatten)]
    pub mode: ModeArgs,
}

/// Guard subcommands.
#[derive(Parser, Debug)]
pub struct GuardCommand {
    #[command(subcommand)]
    pub action: GuardAction,
}

#[derive(Subcommand, Debug)]
pub enum GuardAction {
    /// Regenerate the exclude files of every public worktree.
    Install,

    /// Verify the history of one public branch, or of all of them.
    Verify(VerifyArgs),
}

#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Branch to verify. Defaults to every public branch.
    pub branch: Option<String>,
}

/// Strategy subcommands.
#[derive(Parser, Debug)]
pub struct StrategyCommand {
    #[command(subcommand)]
    pub action: StrategyAction,
}

#[derive(Subcommand, Debug)]
pub enum StrategyAction {
    /// List the catalog strategies.
    List,

    /// Show the branch graph of a strategy (default: the configured one).
    Show(StrategyShowArgs),
}

#[derive(Parser, Debug)]
pub struct StrategyShowArgs {
    /// Catalog strategy name.
    pub name: Option<String>,
}

/// Lock subcommands.
#[derive(Parser, Debug)]
pub struct LockCommand {
    #[command(subcommand)]
    pub action: LockAction,
}

/// Available lock actions.
#[derive(Subcommand, Debug)]
pub enum LockAction {
    /// List all active locks.
    ///
    /// Shows the repository lock and branch locks with their age and owner.
    List,

    /// Clear a specific lock.
    ///
    /// Requires --force flag to prevent accidental clearing.
    Clear(LockClearArgs),
}

/// Arguments for the `lock clear` command.
#[derive(Parser, Debug)]
pub struct LockClearArgs {
    /// Branch whose lock should be cleared, or "repository".
    pub lock_id: String,

    /// Force clearing the lock (required for safety).
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `publish` command.
#[derive(Parser, Debug)]
pub struct PublishArgs {
    /// Public branch to push.
    pub branch: String,

    /// Create the remote repository NAME under --url first.
    #[arg(long, value_name = "NAME", requires = "url")]
    pub create: Option<String>,

    /// Base URL or local directory the repository is created under.
    #[arg(long)]
    pub url: Option<String>,

    /// Visibility of a created repository (private, public).
    #[arg(long, default_value = "private")]
    pub visibility: String,

    /// Organization owning a created repository.
    #[arg(long)]
    pub org: Option<String>,
}

/// Arguments for the `log` command.
#[derive(Parser, Debug)]
pub struct LogArgs {
    /// Show only the last N events.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
