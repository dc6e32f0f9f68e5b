//! Command implementations for repokit.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Every command receives the directory it runs in
//! explicitly; nothing below reads the process working directory.

mod adopt;
mod check;
mod dirs;
mod guard;
mod lock;
mod log;
mod promote;
mod publish;
mod status;
mod strategy;

#[cfg(test)]
mod tests;

use crate::cli::{Command, GuardAction, LockAction, StrategyAction};
use crate::config::{Config, ConfigOverrides};
use crate::context::RepoContext;
use crate::error::{RepokitError, Result};
use crate::orchestrator::AdoptionPlan;
use crate::state::StateMarker;
use crate::strategy::CATALOG_NAMES;
use std::path::Path;

pub use adopt::cmd_adopt;
pub use check::cmd_check;
pub use dirs::{cmd_config, cmd_dirs};
pub use guard::{cmd_guard_install, cmd_guard_verify};
pub use lock::{cmd_lock_clear, cmd_lock_list};
pub use log::cmd_log;
pub use promote::{cmd_cascade, cmd_promote};
pub use publish::cmd_publish;
pub use status::cmd_status;
pub use strategy::{cmd_strategy_list, cmd_strategy_show};

/// Dispatch a command to its implementation, running in `cwd`.
pub fn dispatch(command: Command, cwd: &Path) -> Result<()> {
    match command {
        Command::Adopt(args) => cmd_adopt(cwd, args),
        Command::Status => cmd_status(cwd),
        Command::Check(args) => cmd_check(cwd, args),
        Command::Promote(args) => cmd_promote(cwd, args),
        Command::Cascade(args) => cmd_cascade(cwd, args),
        Command::Guard(guard_cmd) => match guard_cmd.action {
            GuardAction::Install => cmd_guard_install(cwd),
            GuardAction::Verify(args) => cmd_guard_verify(cwd, args),
        },
        Command::Strategy(strategy_cmd) => match strategy_cmd.action {
            StrategyAction::List => cmd_strategy_list(),
            StrategyAction::Show(args) => cmd_strategy_show(cwd, args),
        },
        Command::Dirs(args) => cmd_dirs(cwd, args),
        Command::Config(args) => cmd_config(cwd, args),
        Command::Lock(lock_cmd) => match lock_cmd.action {
            LockAction::List => cmd_lock_list(cwd),
            LockAction::Clear(args) => cmd_lock_clear(cwd, args),
        },
        Command::Publish(args) => cmd_publish(cwd, args),
        Command::Log(args) => cmd_log(cwd, args),
    }
}

/// A repository `adopt` has finished with, as commands other than `adopt`
/// see it.
pub(crate) struct ManagedRepo {
    pub ctx: RepoContext,
    pub config: Config,
    pub plan: AdoptionPlan,
    pub marker: StateMarker,
}

impl ManagedRepo {
    /// Open the managed repository containing `cwd`.
    ///
    /// The configuration is re-read with the selection the marker recorded,
    /// so later edits to config files cannot silently change the strategy or
    /// directory layout of an adopted repository.
    pub fn open(cwd: &Path) -> Result<Self> {
        let ctx = RepoContext::resolve_from(cwd)?;
        let marker = StateMarker::load(&ctx)?.ok_or_else(|| {
            RepokitError::UserError(format!(
                "{} is not managed by repokit.\n\nRun `repokit adopt` first.",
                ctx.repo_root.display()
            ))
        })?;
        if !marker.is_managed() {
            return Err(RepokitError::CorruptedState(
                "a previous adoption did not finish; re-run `repokit adopt`".to_string(),
            ));
        }

        let overrides = ConfigOverrides {
            // A custom strategy lives in the config files, not in the marker.
            strategy: CATALOG_NAMES
                .contains(&marker.strategy.as_str())
                .then(|| marker.strategy.clone()),
            directory_profile: marker.directory_profile.clone(),
            directory_groups: Some(marker.directory_groups.clone()),
            private_set: Some(marker.private_set),
            ..Default::default()
        };
        let config = Config::load_layered(&ctx.repo_root, &overrides)?;
        let plan = AdoptionPlan::build(&ctx.repo_root, &config)?;
        marker.check_compatible(&plan.graph, &ctx.repo_root)?;

        Ok(Self {
            ctx,
            config,
            plan,
            marker,
        })
    }
}
