//! Git command runner for repokit.
//!
//! Provides a safe wrapper around git commands with captured stdout/stderr
//! and structured error handling. All git operations go through this module;
//! the `vcs` module builds the discrete repository operations on top of it.

use crate::error::{RepokitError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::OnceLock;
use tracing::debug;

/// Result of a successful git command execution.
#[derive(Debug, Clone)]
pub struct GitOutput {
    /// Standard output from the command (trimmed).
    pub stdout: String,
    /// Standard error from the command (trimmed).
    pub stderr: String,
}

impl GitOutput {
    fn from_output(output: &Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }

    /// Returns true if stdout is empty.
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty()
    }

    /// Returns stdout lines as a vector.
    pub fn lines(&self) -> Vec<&str> {
        if self.stdout.is_empty() {
            Vec::new()
        } else {
            self.stdout.lines().collect()
        }
    }
}

/// Extra process settings for a git invocation.
///
/// Used for plumbing commands that need a private index file, commit identity
/// overrides, or data on stdin.
#[derive(Debug, Default, Clone)]
pub struct GitInvocation<'a> {
    /// Environment variables set for this invocation only.
    pub env: Vec<(&'a str, String)>,
    /// Bytes written to the process's stdin.
    pub stdin: Option<&'a [u8]>,
}

/// Run a git command with the specified working directory.
///
/// # Returns
///
/// * `Ok(GitOutput)` - On successful execution (exit code 0)
/// * `Err(RepokitError::GitError)` - On non-zero exit code
///
/// # Examples
///
/// ```no_run
/// use repokit::git::run_git;
/// use std::path::Path;
///
/// let output = run_git(Path::new("."), &["status", "--porcelain"])?;
/// println!("Changes: {}", output.stdout);
/// # Ok::<(), repokit::error::RepokitError>(())
/// ```
pub fn run_git<P: AsRef<Path>>(cwd: P, args: &[&str]) -> Result<GitOutput> {
    run_git_with(cwd, args, &GitInvocation::default())
}

/// Run a git command with extra environment variables and optional stdin.
pub fn run_git_with<P: AsRef<Path>>(
    cwd: P,
    args: &[&str],
    invocation: &GitInvocation<'_>,
) -> Result<GitOutput> {
    let (output, git_output) = spawn_git(cwd.as_ref(), args, invocation)?;

    if output.status.success() {
        Ok(git_output)
    } else {
        let exit_code = output.status.code().unwrap_or(-1);
        let error_msg = if git_output.stderr.is_empty() {
            git_output.stdout.clone()
        } else {
            git_output.stderr.clone()
        };

        Err(RepokitError::GitError(format!(
            "git {} failed (exit code {}): {}",
            args.first().unwrap_or(&""),
            exit_code,
            error_msg
        )))
    }
}

/// Run a git command and return its output together with the exit code,
/// without treating a non-zero exit as an error.
///
/// Used for commands whose exit status carries meaning (e.g. `merge-tree`
/// exits 1 on conflicts, `merge-base --is-ancestor` exits 1 for "no").
pub fn run_git_status<P: AsRef<Path>>(
    cwd: P,
    args: &[&str],
    invocation: &GitInvocation<'_>,
) -> Result<(i32, GitOutput)> {
    let (output, git_output) = spawn_git(cwd.as_ref(), args, invocation)?;
    Ok((output.status.code().unwrap_or(-1), git_output))
}

fn spawn_git(
    cwd: &Path,
    args: &[&str],
    invocation: &GitInvocation<'_>,
) -> Result<(Output, GitOutput)> {
    debug!(cwd = %cwd.display(), "git {}", args.join(" "));

    let mut command = Command::new("git");
    command.current_dir(cwd).args(args);
    for (key, value) in &invocation.env {
        command.env(key, value);
    }

    let spawn_error = |e: std::io::Error| {
        RepokitError::GitError(format!(
            "failed to execute git {}: {}",
            args.first().unwrap_or(&""),
            e
        ))
    };

    let output = match invocation.stdin {
        None => command.output().map_err(spawn_error)?,
        Some(input) => {
            let mut child = command
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .map_err(spawn_error)?;
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input).map_err(spawn_error)?;
            }
            child.wait_with_output().map_err(spawn_error)?
        }
    };

    let git_output = GitOutput::from_output(&output);
    Ok((output, git_output))
}

/// A git release as `(major, minor)`.
pub type GitVersion = (u32, u32);

/// Parse `git --version` output such as `git version 2.39.5 (Apple Git-154)`.
pub fn parse_git_version(output: &str) -> Option<GitVersion> {
    let number = output.split_whitespace().nth(2)?;
    let mut parts = number.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}

/// Fail with an actionable `UserError` when `found` is older than `required`.
pub fn ensure_git_version(found: GitVersion, required: GitVersion, feature: &str) -> Result<()> {
    if found >= required {
        return Ok(());
    }
    Err(RepokitError::UserError(format!(
        "{} needs git {}.{} or newer, but git {}.{} is installed.\n\n\
         Upgrade git and run the command again.",
        feature, required.0, required.1, found.0, found.1
    )))
}

/// Check the installed git against `required`, asking git at most once per
/// process. An unparseable version is let through.
pub fn require_git_version(cwd: &Path, required: GitVersion, feature: &str) -> Result<()> {
    static INSTALLED: OnceLock<Option<GitVersion>> = OnceLock::new();
    let installed = match INSTALLED.get() {
        Some(version) => *version,
        None => {
            let output = run_git(cwd, &["--version"])?;
            let version = parse_git_version(&output.stdout);
            debug!(version = ?version, "detected git version");
            *INSTALLED.get_or_init(|| version)
        }
    };
    match installed {
        Some(found) => ensure_git_version(found, required, feature),
        None => Ok(()),
    }
}

/// Get the repository root directory using `git rev-parse --show-toplevel`.
///
/// # Returns
///
/// * `Ok(PathBuf)` - The absolute path to the repository root
/// * `Err(RepokitError::UserError)` - If not inside a git repository
pub fn get_repo_root<P: AsRef<Path>>(cwd: P) -> Result<PathBuf> {
    let output = run_git_for_repo_detection(cwd.as_ref(), &["rev-parse", "--show-toplevel"])?;
    Ok(PathBuf::from(&output.stdout))
}

/// Absolute path of the git directory shared by all worktrees.
pub fn git_common_dir<P: AsRef<Path>>(cwd: P) -> Result<PathBuf> {
    let cwd = cwd.as_ref();
    let output = run_git(cwd, &["rev-parse", "--git-common-dir"])?;
    Ok(absolutize(cwd, &output.stdout))
}

/// Absolute path of the private git directory of this working copy.
///
/// For a linked worktree this is `.git/worktrees/<name>`.
pub fn git_dir<P: AsRef<Path>>(cwd: P) -> Result<PathBuf> {
    let cwd = cwd.as_ref();
    let output = run_git(cwd, &["rev-parse", "--git-dir"])?;
    Ok(absolutize(cwd, &output.stdout))
}

fn absolutize(cwd: &Path, raw: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

/// Internal helper that returns a UserError instead of GitError for repo detection.
fn run_git_for_repo_detection<P: AsRef<Path>>(cwd: P, args: &[&str]) -> Result<GitOutput> {
    let cwd = cwd.as_ref();

    let output = Command::new("git")
        .current_dir(cwd)
        .args(args)
        .output()
        .map_err(|e| {
            RepokitError::UserError(format!("failed to execute git: {} (is git installed?)", e))
        })?;

    let git_output = GitOutput::from_output(&output);

    if output.status.success() {
        Ok(git_output)
    } else {
        let stderr = &git_output.stderr;
        if stderr.contains("not a git repository") || stderr.contains("fatal:") {
            Err(RepokitError::UserError(
                "not inside a git repository. Run this command from within a git repository."
                    .to_string(),
            ))
        } else {
            Err(RepokitError::UserError(format!(
                "git command failed: {}",
                if stderr.is_empty() {
                    &git_output.stdout
                } else {
                    stderr
                }
            )))
        }
    }
}

/// Check if the working directory has uncommitted tracked changes.
pub fn has_uncommitted_changes<P: AsRef<Path>>(cwd: P) -> Result<bool> {
    let output = run_git(cwd, &["status", "--porcelain", "--untracked-files=no"])?;
    Ok(!output.is_empty())
}
