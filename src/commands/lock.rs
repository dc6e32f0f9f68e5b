//! Implementation of the `repokit lock` subcommands.

use crate::cli::LockClearArgs;
use crate::config::{Config, ConfigOverrides};
use crate::context::RepoContext;
use crate::error::{RepokitError, Result};
use crate::events::{Event, EventAction, append_event};
use crate::locks;
use serde_json::json;
use std::path::Path;

/// Lock commands work on any repository with a repokit state directory,
/// including one whose adoption was interrupted.
fn open(cwd: &Path) -> Result<(RepoContext, Config)> {
    let ctx = RepoContext::resolve_from(cwd)?;
    let config = Config::load_layered(&ctx.repo_root, &ConfigOverrides::default())?;
    Ok((ctx, config))
}

pub fn cmd_lock_list(cwd: &Path) -> Result<()> {
    let (ctx, config) = open(cwd)?;
    let locks = locks::list_locks(&ctx, config.lock_stale_minutes)?;

    if locks.is_empty() {
        println!("No active locks.");
        return Ok(());
    }

    println!("Active locks ({}):", locks.len());
    println!();

    for lock in &locks {
        println!("  {} ({}):", lock.name, lock.lock_type.as_str());
        println!("    Owner:      {}", lock.metadata.owner);
        if let Some(pid) = lock.metadata.pid {
            println!("    PID:        {}", pid);
        }
        println!(
            "    Created:    {}",
            lock.metadata.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!("    Age:        {}", lock.metadata.age_string());
        println!("    Action:     {}", lock.metadata.action);
        if lock.is_stale {
            println!(
                "    Status:     STALE (exceeds {} min threshold)",
                config.lock_stale_minutes
            );
        }
        println!("    Path:       {}", lock.path.display());
        println!();
    }

    let stale_count = locks.iter().filter(|l| l.is_stale).count();
    if stale_count > 0 {
        println!(
            "Note: {} lock(s) are stale. Use `repokit lock clear <lock-id> --force` to clear.",
            stale_count
        );
    }

    Ok(())
}

pub fn cmd_lock_clear(cwd: &Path, args: LockClearArgs) -> Result<()> {
    if !args.force {
        return Err(RepokitError::UserError(format!(
            "refusing to clear lock without --force flag.\n\n\
             Clearing locks can cause data corruption if the lock holder is still active.\n\
             Only clear locks if you are certain the lock holder has crashed.\n\n\
             To clear the lock, run:\n  repokit lock clear {} --force",
            args.lock_id
        )));
    }

    let (ctx, config) = open(cwd)?;
    let cleared = locks::clear_lock(&ctx, &args.lock_id, config.lock_stale_minutes)?;

    let event = Event::new(EventAction::LockClear).with_details(json!({
        "lock_id": cleared.name,
        "lock_type": cleared.lock_type.as_str(),
        "age_minutes": cleared.metadata.age().num_minutes(),
        "was_stale": cleared.is_stale,
        "owner": cleared.metadata.owner,
        "original_action": cleared.metadata.action,
    }));

    // Best effort: the lock is already gone.
    if let Err(e) = append_event(&ctx, &event) {
        eprintln!("Warning: failed to log lock_clear event: {}", e);
    }

    println!("Cleared lock: {}", cleared.name);
    println!();
    println!("Lock details:");
    println!("  Owner:      {}", cleared.metadata.owner);
    if let Some(pid) = cleared.metadata.pid {
        println!("  PID:        {}", pid);
    }
    println!(
        "  Created:    {}",
        cleared.metadata.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  Age:        {}", cleared.metadata.age_string());
    println!("  Action:     {}", cleared.metadata.action);
    if cleared.is_stale {
        println!("  Status:     was STALE");
    }
    println!("  Path:       {}", cleared.path.display());

    Ok(())
}
