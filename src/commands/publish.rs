//! Implementation of the `repokit publish` command.

use super::ManagedRepo;
use crate::cli::PublishArgs;
use crate::error::{RepokitError, Result};
use crate::events::{Event, EventAction, append_event};
use crate::guard::PrivateContentGuard;
use crate::locks;
use crate::remote::{self, GitRemote, NewRepository, Visibility};
use serde_json::json;
use std::path::Path;

/// Push a public branch to the configured remote.
///
/// With `--create NAME --url BASE` the remote repository is created (or, for
/// a hosted URL, registered) first. Without it the remote must already be
/// configured.
pub fn cmd_publish(cwd: &Path, args: PublishArgs) -> Result<()> {
    let repo = ManagedRepo::open(cwd)?;
    let root = &repo.ctx.repo_root;
    let remote_name = repo.config.remote.as_str();

    let visibility = Visibility::from_str(&args.visibility).ok_or_else(|| {
        RepokitError::UserError(format!(
            "unknown visibility '{}' (expected private or public)",
            args.visibility
        ))
    })?;
    let create = args.create.map(|name| NewRepository {
        name,
        visibility,
        org: args.org.clone(),
    });

    let host = GitRemote::new(root, remote_name, args.url.as_deref().unwrap_or_default());
    if create.is_none() && host.registered_url()?.is_none() {
        return Err(RepokitError::UserError(format!(
            "remote '{}' is not configured.\n\n\
             Create it with:\n  repokit publish {} --create <name> --url <base-url>",
            remote_name, args.branch
        )));
    }

    let _repo_lock = locks::acquire_repository_lock(&repo.ctx, "publish")?;
    let guard = PrivateContentGuard::new(
        &repo.plan.graph,
        &repo.plan.matcher,
        &repo.config.sensitive,
    );
    let created_url = remote::publish(root, &guard, &host, &args.branch, create.as_ref())?;

    let event = Event::new(EventAction::Publish)
        .with_branch(&args.branch)
        .with_details(json!({
            "remote": remote_name,
            "created": created_url,
        }));
    append_event(&repo.ctx, &event)?;

    if let Some(url) = &created_url {
        println!("Created {}", url);
    }
    println!("Published '{}' to '{}'.", args.branch, remote_name);
    Ok(())
}
