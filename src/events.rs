//! Audit event log for repokit.
//!
//! Every operation that changes repository state appends one event to an
//! append-only NDJSON file (one JSON object per line) at
//! `<git-common-dir>/repokit/events.ndjson`. The log lives inside the git
//! directory, so it is never committed to any branch.
//!
//! # Event Format
//!
//! - `ts`: RFC3339 timestamp
//! - `action`: what happened (adopt, promote, cascade, ...)
//! - `actor`: `user@HOST`
//! - `branch`: the branch the event is about, when there is one
//! - `details`: freeform action-specific object
//!
//! Events are appended while the repository lock is held so the log and the
//! refs move together.

use crate::context::RepoContext;
use crate::error::{RepokitError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;

/// Actions recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Repository materialized from a strategy.
    Adopt,
    /// A single merge step between two branches.
    Promote,
    /// Promotion along the forward path to a target branch.
    Cascade,
    /// Guard excludes written into a public working copy.
    GuardInstall,
    /// Lock cleared manually.
    LockClear,
    /// A public branch pushed to the remote.
    Publish,
    /// A failed operation was undone from its snapshot.
    Rollback,
}

impl EventAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventAction::Adopt => "adopt",
            EventAction::Promote => "promote",
            EventAction::Cascade => "cascade",
            EventAction::GuardInstall => "guard_install",
            EventAction::LockClear => "lock_clear",
            EventAction::Publish => "publish",
            EventAction::Rollback => "rollback",
        }
    }
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One audit log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub ts: DateTime<Utc>,

    pub action: EventAction,

    /// `user@HOST` of the process that performed the action.
    pub actor: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(default)]
    pub details: Value,
}

impl Event {
    /// New event stamped with the current time and actor.
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: actor_string(),
            branch: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            RepokitError::UserError(format!("failed to serialize event to JSON: {}", e))
        })
    }
}

fn actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append an event to the audit log, creating the file if needed.
///
/// A serialization or write failure is returned to the caller, which should
/// treat the operation as not recorded.
pub fn append_event(ctx: &RepoContext, event: &Event) -> Result<()> {
    let events_file = ctx.events_file();
    let json_line = event.to_ndjson_line()?;

    if !ctx.state_dir.exists() {
        fs::create_dir_all(&ctx.state_dir).map_err(|e| {
            RepokitError::UserError(format!(
                "failed to create state directory '{}': {}",
                ctx.state_dir.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&events_file)
        .map_err(|e| {
            RepokitError::UserError(format!(
                "failed to open events file '{}': {}",
                events_file.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        RepokitError::UserError(format!(
            "failed to write event to '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    file.sync_all().map_err(|e| {
        RepokitError::UserError(format!(
            "failed to sync events file '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    Ok(())
}

/// Read every event in the log, oldest first.
///
/// A missing log is empty. Lines that fail to parse (for instance a torn
/// final line after a crash) are skipped.
pub fn read_events(ctx: &RepoContext) -> Result<Vec<Event>> {
    let events_file = ctx.events_file();
    if !events_file.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&events_file).map_err(|e| {
        RepokitError::UserError(format!(
            "failed to read events file '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect())
}
