//! Tests for the private-content guard.

use super::*;
use crate::config::{Config, SensitiveConfig};
use crate::error::RepokitError;
use crate::patterns::{PatternMatcher, PatternSet};
use crate::strategy::{BranchGraph, resolve_named};
use crate::test_support::{commit_file, create_private_repo, git, git_stdout};

fn fixtures() -> (BranchGraph, PatternMatcher, SensitiveConfig) {
    let config = Config::default();
    (
        resolve_named("simple").unwrap(),
        PatternMatcher::from_config(&config).unwrap(),
        config.sensitive,
    )
}

#[test]
fn test_api_key_blocked_on_public_branch_only() {
    let (graph, matcher, sensitive) = fixtures();
    let guard = PrivateContentGuard::new(&graph, &matcher, &sensitive);
    let staged = vec![StagedChange::new("api_key.txt", 12)];

    let err = guard.validate("dev", &staged).unwrap_err();
    match err {
        RepokitError::PrivateContentDetected { branch, paths } => {
            assert_eq!(branch, "dev");
            assert_eq!(paths, vec!["api_key.txt"]);
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let classification = guard.validate("private", &staged).unwrap();
    assert!(classification.violations.is_empty());
    assert!(classification.is_clean());
}

#[test]
fn test_classify_enumerates_every_violation() {
    let (graph, matcher, sensitive) = fixtures();
    let guard = PrivateContentGuard::new(&graph, &matcher, &sensitive);
    let staged = vec![
        StagedChange::new("src/main.rs", 10),
        StagedChange::new("private/notes.md", 10),
        StagedChange::new("notes.bak", 10),
        StagedChange::with_content("config.json", "{\"token\": \"abc\"}"),
    ];

    let classification = guard.classify("main", &staged);
    assert_eq!(
        classification.violation_paths(),
        vec!["private/notes.md", "notes.bak", "config.json"]
    );
    assert_eq!(classification.violations[0].set, PatternSet::PrivatePath);
    assert_eq!(classification.violations[1].set, PatternSet::Backup);
    assert!(classification.violations[2].in_content);
    assert!(!classification.is_clean());
}

#[test]
fn test_content_scanning_can_be_disabled() {
    let (graph, matcher, mut sensitive) = fixtures();
    sensitive.scan_content = false;
    let guard = PrivateContentGuard::new(&graph, &matcher, &sensitive);
    let staged = vec![StagedChange::with_content("config.json", "{\"token\": \"abc\"}")];
    assert!(guard.classify("main", &staged).is_clean());
}

#[test]
fn test_oversized_files_rejected_on_every_branch() {
    let (graph, matcher, mut sensitive) = fixtures();
    sensitive.max_file_bytes = 100;
    let guard = PrivateContentGuard::new(&graph, &matcher, &sensitive);
    let staged = vec![StagedChange::new("data.bin", 101), StagedChange::new("ok.txt", 100)];

    for branch in ["private", "main"] {
        match guard.validate(branch, &staged).unwrap_err() {
            RepokitError::OversizedFile { limit, files } => {
                assert_eq!(limit, 100);
                assert_eq!(files, vec![("data.bin".to_string(), 101)]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

#[test]
fn test_private_content_reported_before_oversized() {
    let (graph, matcher, mut sensitive) = fixtures();
    sensitive.max_file_bytes = 1;
    let guard = PrivateContentGuard::new(&graph, &matcher, &sensitive);
    let staged = vec![StagedChange::new("secret.env", 50)];
    assert!(matches!(
        guard.validate("main", &staged),
        Err(RepokitError::PrivateContentDetected { .. })
    ));
}

#[test]
fn test_reserved_names_are_warnings() {
    let (graph, matcher, sensitive) = fixtures();
    let guard = PrivateContentGuard::new(&graph, &matcher, &sensitive);
    let staged = vec![StagedChange::new("docs/con.txt", 1)];

    for branch in ["private", "main"] {
        let classification = guard.validate(branch, &staged).unwrap();
        assert_eq!(classification.warnings.len(), 1);
        assert!(classification.warnings[0].contains("docs/con.txt"));
    }
}

#[test]
fn test_validate_staged_reads_index() {
    let temp_dir = create_private_repo();
    let path = temp_dir.path();
    let (graph, matcher, sensitive) = fixtures();
    let guard = PrivateContentGuard::new(&graph, &matcher, &sensitive);

    git(path, &["checkout", "-q", "-b", "dev"]);
    std::fs::write(path.join("api_key.txt"), "k").unwrap();
    std::fs::write(path.join("lib.rs"), "pub fn f() {}\n").unwrap();
    git(path, &["add", "api_key.txt", "lib.rs"]);

    match guard.validate_staged(path).unwrap_err() {
        RepokitError::PrivateContentDetected { branch, paths } => {
            assert_eq!(branch, "dev");
            assert_eq!(paths, vec!["api_key.txt"]);
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // The same index is fine as a candidate commit on the private branch.
    assert!(guard.validate_staged_on(path, "private").unwrap().is_clean());
}

#[test]
fn test_validate_staged_scans_blob_content() {
    let temp_dir = create_private_repo();
    let path = temp_dir.path();
    let (graph, matcher, sensitive) = fixtures();
    let guard = PrivateContentGuard::new(&graph, &matcher, &sensitive);

    git(path, &["checkout", "-q", "-b", "main"]);
    std::fs::write(path.join("settings.py"), "PASSWORD = 'hunter2'\n").unwrap();
    git(path, &["add", "settings.py"]);

    let err = guard.validate_staged(path).unwrap_err();
    assert!(err.to_string().contains("settings.py"));

    let changes = read_staged_changes(path, true, 1024).unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].size, 21);
    assert!(changes[0].content.as_deref().unwrap().contains("hunter2"));
}

#[test]
fn test_verify_history_finds_past_commits() {
    let temp_dir = create_private_repo();
    let path = temp_dir.path();
    let (graph, matcher, sensitive) = fixtures();
    let guard = PrivateContentGuard::new(&graph, &matcher, &sensitive);

    git(path, &["checkout", "-q", "-b", "main"]);
    let bad = commit_file(path, "private/notes.md", "x", "add notes");
    git(path, &["rm", "-q", "private/notes.md"]);
    git(path, &["commit", "-q", "-m", "remove notes"]);
    commit_file(path, "src/lib.rs", "// ok\n", "add lib");

    let offending = guard.verify_history(path, "main").unwrap();
    // Both the commit adding and the one deleting the file name it.
    assert_eq!(offending.len(), 2);
    assert!(offending.iter().any(|c| c.sha == bad));
    assert!(offending.iter().all(|c| c.paths == vec!["private/notes.md"]));

    let err = guard.ensure_clean_history(path, "main").unwrap_err();
    assert!(err.to_string().contains("private/notes.md (commit"));

    assert!(guard.verify_history(path, "private").unwrap().is_empty());
    assert!(guard.verify_history(path, "missing").unwrap().is_empty());
}

#[test]
fn test_install_excludes_hides_private_files_in_public_worktree() {
    let temp_dir = create_private_repo();
    let path = temp_dir.path();
    let (graph, matcher, _) = fixtures();

    git(path, &["branch", "main"]);
    let worktree = path.join(".worktrees").join("github");
    git(
        path,
        &["worktree", "add", "-q", worktree.to_str().unwrap(), "main"],
    );

    assert!(install_excludes(&worktree, "main", &graph, &matcher).unwrap());
    // Idempotent.
    assert!(install_excludes(&worktree, "main", &graph, &matcher).unwrap());

    std::fs::create_dir_all(worktree.join("private")).unwrap();
    std::fs::write(worktree.join("private").join("plan.md"), "x").unwrap();
    std::fs::write(worktree.join("secret.env"), "x").unwrap();
    std::fs::write(worktree.join("app.rs"), "fn main() {}\n").unwrap();
    git(&worktree, &["add", "-A"]);

    let staged = git_stdout(&worktree, &["diff", "--cached", "--name-only"]);
    assert_eq!(staged, "app.rs");

    let git_dir = git_stdout(&worktree, &["rev-parse", "--absolute-git-dir"]);
    let contents =
        std::fs::read_to_string(std::path::Path::new(&git_dir).join(EXCLUDE_FILE_NAME)).unwrap();
    assert!(contents.contains("**/private/**"));
    assert!(!contents.contains("con|prn"));
}

#[test]
fn test_install_excludes_skips_private_branch() {
    let temp_dir = create_private_repo();
    let path = temp_dir.path();
    let (graph, matcher, _) = fixtures();

    assert!(!install_excludes(path, "private", &graph, &matcher).unwrap());
    assert!(!path.join(".git").join(EXCLUDE_FILE_NAME).exists());
}

#[test]
fn test_exclude_file_contents_lists_globs_once() {
    let (_, matcher, _) = fixtures();
    let contents = exclude_file_contents(&matcher, "main");
    assert!(contents.starts_with("# Generated by repokit for branch 'main'"));
    assert!(contents.lines().any(|l| l == "*secret*"));
    assert!(contents.lines().any(|l| l == "*.bak"));
    let count = contents.lines().filter(|l| *l == "**/CLAUDE.md").count();
    assert_eq!(count, 1);
}
