//! Command tests against real temporary repositories.
//!
//! Commands read `REPOKIT_*` variables from the process environment, so the
//! tests here run serially.

use super::*;
use crate::cli::{
    AdoptArgs, CascadeArgs, CheckArgs, LockClearArgs, LogArgs, ModeArgs, PromoteArgs,
    PublishArgs, SelectionArgs, StrategyShowArgs, VerifyArgs,
};
use crate::error::RepokitError;
use crate::events::{EventAction, read_events};
use crate::exit_codes;
use crate::locks;
use crate::test_support::{commit_file, create_private_repo, git, git_stdout};
use serial_test::serial;
use std::path::PathBuf;
use tempfile::TempDir;

fn adopt_args(path: Option<PathBuf>) -> AdoptArgs {
    AdoptArgs {
        path,
        selection: SelectionArgs::default(),
        force: false,
        name: Some("widget".to_string()),
        description: String::new(),
        no_templates: false,
        dry_run: false,
    }
}

/// A private repository adopted with the `simple` strategy; returns the
/// canonical root alongside the guard keeping it alive.
fn adopted_repo() -> (TempDir, PathBuf) {
    let temp_dir = create_private_repo();
    let root = temp_dir.path().canonicalize().unwrap();
    cmd_adopt(&root, adopt_args(None)).unwrap();
    (temp_dir, root)
}

fn main_worktree(root: &Path) -> PathBuf {
    root.join(".worktrees").join("github")
}

#[test]
#[serial]
fn dry_run_touches_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("project");

    let mut args = adopt_args(Some(PathBuf::from("project")));
    args.dry_run = true;
    cmd_adopt(temp_dir.path(), args).unwrap();

    assert!(!target.exists());
}

#[test]
#[serial]
fn adopt_then_status_and_verify() {
    let (_temp_dir, root) = adopted_repo();

    assert!(main_worktree(&root).join("README.md").exists());
    cmd_status(&root).unwrap();
    cmd_guard_verify(&root, VerifyArgs { branch: None }).unwrap();

    // Commands resolve the main working copy from inside a worktree too.
    cmd_status(&main_worktree(&root)).unwrap();
}

#[test]
#[serial]
fn commands_refuse_unmanaged_repository() {
    let temp_dir = create_private_repo();

    let err = cmd_status(temp_dir.path()).unwrap_err();
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    assert!(err.to_string().contains("repokit adopt"));

    let err = dispatch(Command::Status, temp_dir.path()).unwrap_err();
    assert!(err.to_string().contains("not managed"));
}

#[test]
#[serial]
fn cascade_promotes_public_work_and_updates_worktree() {
    let (_temp_dir, root) = adopted_repo();
    commit_file(&root, "src/lib.rs", "pub fn f() {}\n", "Add library");
    commit_file(&root, "private/notes.md", "plans\n", "Private notes");

    cmd_cascade(
        &root,
        CascadeArgs {
            target: "main".to_string(),
            mode: ModeArgs::default(),
        },
    )
    .unwrap();

    let main_files = git_stdout(&root, &["ls-tree", "-r", "--name-only", "main"]);
    assert!(main_files.contains("src/lib.rs"));
    assert!(!main_files.contains("private/notes.md"));
    assert_eq!(
        git_stdout(&root, &["rev-parse", "dev"]),
        git_stdout(&root, &["rev-parse", "main"])
    );

    let worktree = main_worktree(&root);
    assert!(worktree.join("src/lib.rs").exists());
    assert!(git_stdout(&worktree, &["status", "--porcelain", "--untracked-files=no"]).is_empty());

    let ctx = RepoContext::for_root(&root).unwrap();
    let events = read_events(&ctx).unwrap();
    assert_eq!(events.last().unwrap().action, EventAction::Cascade);
}

#[test]
#[serial]
fn promote_refuses_dirty_target_worktree() {
    let (_temp_dir, root) = adopted_repo();
    commit_file(&root, "src/lib.rs", "pub fn f() {}\n", "Add library");
    cmd_cascade(
        &root,
        CascadeArgs {
            target: "dev".to_string(),
            mode: ModeArgs::default(),
        },
    )
    .unwrap();

    let worktree = main_worktree(&root);
    std::fs::write(worktree.join("README.md"), "edited\n").unwrap();
    let main_before = git_stdout(&root, &["rev-parse", "main"]);

    let err = cmd_promote(
        &root,
        PromoteArgs {
            source: "dev".to_string(),
            target: "main".to_string(),
            mode: ModeArgs {
                squash: false,
                preserve: true,
            },
        },
    )
    .unwrap_err();
    assert!(matches!(err, RepokitError::UserError(_)));
    assert!(err.to_string().contains("uncommitted changes"));
    assert_eq!(git_stdout(&root, &["rev-parse", "main"]), main_before);

    // The locks were released.
    let ctx = RepoContext::for_root(&root).unwrap();
    assert!(locks::list_locks(&ctx, 120).unwrap().is_empty());
}

#[test]
#[serial]
fn check_blocks_staged_private_path_in_public_worktree() {
    let (_temp_dir, root) = adopted_repo();
    let worktree = main_worktree(&root);

    cmd_check(&root, CheckArgs { worktree: Some(worktree.clone()) }).unwrap();

    std::fs::write(worktree.join("private").join("secret.md"), "x\n").unwrap();
    git(&worktree, &["add", "-f", "private/secret.md"]);

    let err = cmd_check(&worktree, CheckArgs { worktree: None }).unwrap_err();
    assert!(matches!(err, RepokitError::PrivateContentDetected { .. }));
    assert_eq!(err.exit_code(), exit_codes::POLICY_VIOLATION);
    assert!(err.to_string().contains("private/secret.md"));
}

#[test]
#[serial]
fn guard_install_is_idempotent() {
    let (_temp_dir, root) = adopted_repo();

    cmd_guard_install(&root).unwrap();
    cmd_guard_install(&root).unwrap();

    // Excluded private files stay invisible to `git status`.
    let worktree = main_worktree(&root);
    std::fs::write(worktree.join("private").join("todo.md"), "x\n").unwrap();
    let status = git_stdout(&worktree, &["status", "--porcelain"]);
    assert!(!status.contains("private"), "unexpected status: {}", status);
}

#[test]
#[serial]
fn guard_verify_rejects_private_branch() {
    let (_temp_dir, root) = adopted_repo();

    let err = cmd_guard_verify(
        &root,
        VerifyArgs {
            branch: Some("private".to_string()),
        },
    )
    .unwrap_err();
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
}

#[test]
#[serial]
fn lock_clear_requires_force_and_removes_lock() {
    let (_temp_dir, root) = adopted_repo();
    let ctx = RepoContext::for_root(&root).unwrap();

    let held = locks::acquire_repository_lock(&ctx, "crashed").unwrap();
    std::mem::forget(held);

    let err = cmd_lock_clear(
        &root,
        LockClearArgs {
            lock_id: "repository".to_string(),
            force: false,
        },
    )
    .unwrap_err();
    assert!(err.to_string().contains("--force"));
    assert!(ctx.repository_lock_path().exists());

    cmd_lock_list(&root).unwrap();
    cmd_lock_clear(
        &root,
        LockClearArgs {
            lock_id: "repository".to_string(),
            force: true,
        },
    )
    .unwrap();
    assert!(!ctx.repository_lock_path().exists());

    let events = read_events(&ctx).unwrap();
    assert_eq!(events.last().unwrap().action, EventAction::LockClear);
}

#[test]
#[serial]
fn publish_creates_remote_and_refuses_private_branch() {
    let (_temp_dir, root) = adopted_repo();
    let remotes = TempDir::new().unwrap();

    let err = cmd_publish(
        &root,
        PublishArgs {
            branch: "main".to_string(),
            create: None,
            url: None,
            visibility: "private".to_string(),
            org: None,
        },
    )
    .unwrap_err();
    assert!(err.to_string().contains("not configured"));

    cmd_publish(
        &root,
        PublishArgs {
            branch: "main".to_string(),
            create: Some("widget".to_string()),
            url: Some(remotes.path().to_string_lossy().to_string()),
            visibility: "public".to_string(),
            org: None,
        },
    )
    .unwrap();
    let bare = remotes.path().join("widget.git");
    assert_eq!(
        git_stdout(&bare, &["for-each-ref", "--format=%(refname)"]),
        "refs/heads/main"
    );

    let err = cmd_publish(
        &root,
        PublishArgs {
            branch: "private".to_string(),
            create: None,
            url: None,
            visibility: "private".to_string(),
            org: None,
        },
    )
    .unwrap_err();
    assert!(err.to_string().contains("private branch"));
    assert!(!git_stdout(&bare, &["for-each-ref"]).contains("private"));
}

#[test]
#[serial]
fn strategy_and_dirs_are_read_only() {
    let temp_dir = TempDir::new().unwrap();

    cmd_strategy_list().unwrap();
    cmd_strategy_show(
        temp_dir.path(),
        StrategyShowArgs {
            name: Some("gitflow".to_string()),
        },
    )
    .unwrap();
    let err = cmd_strategy_show(
        temp_dir.path(),
        StrategyShowArgs {
            name: Some("trunk".to_string()),
        },
    )
    .unwrap_err();
    assert!(matches!(err, RepokitError::InvalidStrategy(_)));

    let err = cmd_dirs(
        temp_dir.path(),
        SelectionArgs {
            profile: Some("nonexistent".to_string()),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, RepokitError::UnknownProfile(_)));
    cmd_dirs(temp_dir.path(), SelectionArgs::default()).unwrap();
    cmd_config(
        temp_dir.path(),
        SelectionArgs {
            strategy: Some("gitflow".to_string()),
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[test]
#[serial]
fn environment_selects_strategy() {
    let temp_dir = create_private_repo();
    let root = temp_dir.path().canonicalize().unwrap();

    // SAFETY: tests touching the environment run serially.
    unsafe { std::env::set_var("REPOKIT_STRATEGY", "minimal") };
    let result = cmd_adopt(&root, adopt_args(None));
    unsafe { std::env::remove_var("REPOKIT_STRATEGY") };
    result.unwrap();

    let ctx = RepoContext::for_root(&root).unwrap();
    let marker = StateMarker::load(&ctx).unwrap().unwrap();
    assert_eq!(marker.strategy, "minimal");
    assert!(!main_worktree(&root).exists());

    cmd_log(&root, LogArgs { limit: Some(1) }).unwrap();
}
