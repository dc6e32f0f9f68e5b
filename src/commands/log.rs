//! Implementation of the `repokit log` command.

use crate::cli::LogArgs;
use crate::context::RepoContext;
use crate::error::Result;
use crate::events::read_events;
use std::path::Path;

pub fn cmd_log(cwd: &Path, args: LogArgs) -> Result<()> {
    let ctx = RepoContext::resolve_from(cwd)?;
    let events = read_events(&ctx)?;

    if events.is_empty() {
        println!("No events recorded.");
        return Ok(());
    }

    let skip = args
        .limit
        .map(|limit| events.len().saturating_sub(limit))
        .unwrap_or(0);
    for event in events.iter().skip(skip) {
        let branch = event
            .branch
            .as_deref()
            .map(|b| format!(" [{}]", b))
            .unwrap_or_default();
        println!(
            "{}  {:12} {}{}  {}",
            event.ts.format("%Y-%m-%d %H:%M:%S"),
            event.action.as_str(),
            event.actor,
            branch,
            event.details
        );
    }
    Ok(())
}
