//! Shared helpers for git-backed tests.

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Repository with one commit on `main`.
pub(crate) fn create_test_repo() -> TempDir {
    create_repo_on("main")
}

/// Repository with one commit on the `private` branch, the way `adopt` leaves HEAD.
pub(crate) fn create_private_repo() -> TempDir {
    create_repo_on("private")
}

fn create_repo_on(branch: &str) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path();

    init_empty(path, branch);

    std::fs::write(path.join("README.md"), "# Test\n").unwrap();
    git(path, &["add", "."]);
    git(path, &["commit", "-m", "Initial commit"]);

    temp_dir
}

/// Initialize an empty repository with an unborn `branch` and a test identity.
pub(crate) fn init_empty(path: &Path, branch: &str) {
    git(path, &["init"]);
    git(path, &["symbolic-ref", "HEAD", &format!("refs/heads/{}", branch)]);
    git(path, &["config", "user.email", "test@example.com"]);
    git(path, &["config", "user.name", "Test User"]);
}

/// Write `rel` with `content`, stage it and commit with `message`.
pub(crate) fn commit_file(repo: &Path, rel: &str, content: &str, message: &str) -> String {
    let file = repo.join(rel);
    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&file, content).unwrap();
    git(repo, &["add", "-f", rel]);
    git(repo, &["commit", "-m", message]);
    git_stdout(repo, &["rev-parse", "HEAD"])
}

/// Run git and return trimmed stdout, panicking on failure.
pub(crate) fn git_stdout(repo_dir: &Path, args: &[&str]) -> String {
    let output = git(repo_dir, args);
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

pub(crate) fn git(repo_dir: &Path, args: &[&str]) -> std::process::Output {
    let output = Command::new("git")
        .current_dir(repo_dir)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute git {}: {}", args.join(" "), e));

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "git {} failed (exit code {:?})\nstdout:\n{}\nstderr:\n{}",
            args.join(" "),
            output.status.code(),
            stdout,
            stderr
        );
    }
    output
}
