//! Tests for history sanitization.

use super::*;
use crate::config::{Config, MergeRuleConfig, SensitivePatternConfig};
use crate::error::RepokitError;
use crate::guard::PrivateContentGuard;
use crate::patterns::PatternMatcher;
use crate::strategy::{BranchGraph, resolve_named};
use crate::test_support::{commit_file, create_private_repo, git, git_stdout};
use crate::vcs::{CommitInfo, commit_tree, filtered_tree, update_ref};
use std::path::Path;

struct Fixture {
    config: Config,
    graph: BranchGraph,
    matcher: PatternMatcher,
}

impl Fixture {
    fn new(config: Config) -> Self {
        Self {
            graph: resolve_named("simple").unwrap(),
            matcher: PatternMatcher::from_config(&config).unwrap(),
            config,
        }
    }

    fn sanitizer<'a>(&'a self, repo: &'a Path) -> HistorySanitizer<'a> {
        let guard = PrivateContentGuard::new(&self.graph, &self.matcher, &self.config.sensitive);
        HistorySanitizer::new(
            repo,
            guard,
            MergeRules::for_graph(&self.config.merge_rules, &self.graph).unwrap(),
            Redactor::from_config(&self.config).unwrap(),
        )
    }
}

fn count(repo: &Path, rev: &str) -> usize {
    git_stdout(repo, &["rev-list", "--count", rev]).parse().unwrap()
}

fn info(summary: &str, author: &str) -> CommitInfo {
    CommitInfo {
        sha: format!("{:0>40}", summary.len()),
        parents: vec!["p".to_string()],
        author_name: author.to_string(),
        author_email: format!("{}@example.com", author),
        author_date: "2024-01-01T00:00:00+00:00".to_string(),
        message: summary.to_string(),
    }
}

/// `main` branched from `private`'s first commit, HEAD left on `private`.
fn repo_with_main() -> tempfile::TempDir {
    let temp_dir = create_private_repo();
    git(temp_dir.path(), &["branch", "main"]);
    temp_dir
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

#[test]
fn test_builtin_rules() {
    let rules = MergeRules::new(&[]).unwrap();
    assert_eq!(rules.mode_for("prototype/x"), MergeMode::Squash);
    assert_eq!(rules.mode_for("spike/auth/v2"), MergeMode::Squash);
    assert_eq!(rules.mode_for("hotfix/crash"), MergeMode::Preserve);
    assert_eq!(rules.mode_for("feature/login"), MergeMode::Interactive);
}

#[test]
fn test_configured_rules_win_and_sort_by_specificity() {
    let configured = vec![
        MergeRuleConfig {
            pattern: "fix/*".to_string(),
            mode: MergeMode::Squash,
        },
        MergeRuleConfig {
            pattern: "fix/keep-*".to_string(),
            mode: MergeMode::Preserve,
        },
        MergeRuleConfig {
            pattern: "fix/exact".to_string(),
            mode: MergeMode::Interactive,
        },
    ];
    let rules = MergeRules::new(&configured).unwrap();
    assert_eq!(rules.mode_for("fix/typo"), MergeMode::Squash);
    assert_eq!(rules.mode_for("fix/keep-this"), MergeMode::Preserve);
    assert_eq!(rules.mode_for("fix/exact"), MergeMode::Interactive);
    assert_eq!(rules.rules()[0].pattern, "fix/exact");
}

#[test]
fn test_graph_rules() {
    let graph = resolve_named("simple").unwrap();
    let rules = MergeRules::for_graph(&[], &graph).unwrap();
    assert_eq!(rules.mode_for("private"), MergeMode::Squash);
    assert_eq!(rules.mode_for("dev"), MergeMode::Preserve);
    assert_eq!(rules.mode_for("develop"), MergeMode::Interactive);
}

#[test]
fn test_resolve_requires_choice_for_interactive() {
    let rules = MergeRules::new(&[]).unwrap();
    let err = rules.resolve("feature/login", None).unwrap_err();
    assert!(matches!(err, RepokitError::MergeModeRequired { ref branch } if branch == "feature/login"));
    assert!(
        rules
            .resolve("feature/login", Some(MergeMode::Interactive))
            .is_err()
    );
    assert_eq!(
        rules.resolve("feature/login", Some(MergeMode::Squash)).unwrap(),
        MergeMode::Squash
    );
    assert_eq!(
        rules.resolve("prototype/x", Some(MergeMode::Preserve)).unwrap(),
        MergeMode::Preserve
    );
}

#[test]
fn test_invalid_rule_pattern() {
    let configured = vec![MergeRuleConfig {
        pattern: "fix/[".to_string(),
        mode: MergeMode::Squash,
    }];
    let err = MergeRules::new(&configured).unwrap_err();
    assert!(err.to_string().contains("fix/["));
}

// ---------------------------------------------------------------------------
// Redaction and summaries
// ---------------------------------------------------------------------------

#[test]
fn test_redact_replaces_sensitive_lines() {
    let redactor = Redactor::from_config(&Config::default()).unwrap();
    let message = "Add login\n\nrotate the API key for staging\nsee private/plan.md\nDO NOT COMMIT\nkeep this";
    assert_eq!(
        redactor.redact(message),
        "Add login\n\n[REDACTED]\n[REDACTED]\n[REDACTED]\nkeep this"
    );
    assert_eq!(
        redactor.redact_summary(message).unwrap(),
        "Add login\n\nkeep this"
    );
    assert!(redactor.redact_summary("password is hunter2\n@nocommit").is_none());
}

#[test]
fn test_redact_lines_naming_sensitive_paths() {
    let mut config = Config::default();
    config.sensitive.patterns = vec![SensitivePatternConfig::Glob("**/*.sqlite".to_string())];
    let redactor = Redactor::from_config(&config).unwrap();

    assert!(redactor.is_sensitive_line("Add id_rsa and backup.bak for deploy"));
    assert!(redactor.is_sensitive_line("Ship (data/cache.sqlite) too."));
    assert!(redactor.is_sensitive_line("Move notes to `CLAUDE.md`"));
    assert!(!redactor.is_sensitive_line("Promote private into dev"));
    assert!(!redactor.is_sensitive_line("Refactor src/lib.rs, add tests."));
    assert_eq!(
        redactor.redact("Deploy\nupload server.pem\ndone"),
        "Deploy\n[REDACTED]\ndone"
    );
}

#[test]
fn test_configured_phrases_and_placeholder() {
    let mut config = Config::default();
    config.redaction.phrases = vec!["project[- ]falcon".to_string()];
    config.redaction.placeholder = "<removed>".to_string();
    let redactor = Redactor::from_config(&config).unwrap();
    assert_eq!(redactor.redact("Project Falcon launch"), "<removed>");
    assert_eq!(redactor.placeholder(), "<removed>");

    config.redaction.phrases = vec!["(bad".to_string()];
    assert!(Redactor::from_config(&config).is_err());
}

#[test]
fn test_squash_summary_content() {
    let commits = vec![
        info("Add parser", "ann"),
        info("WIP parser", "bob"),
        info("Add parser", "ann"),
        info("Handle errors", "cat"),
        info("fix typo", "dan"),
        info("Add tests", "eve"),
        info("Document API", "ann"),
        info("Tune speed", "ann"),
        info("Extra change", "ann"),
    ];
    let summary = SquashSummary::build("prototype/fast-parser", "main", &commits, 7, false);
    assert_eq!(summary.title, "feat: fast parser");
    assert_eq!(
        summary.key_changes,
        vec!["Add parser", "Handle errors", "Add tests", "Document API", "Tune speed"]
    );
    assert_eq!(summary.authors, vec!["ann", "bob", "cat", "dan", "eve"]);

    let redactor = Redactor::from_config(&Config::default()).unwrap();
    let message = summary.render(&redactor);
    assert!(message.starts_with("feat: fast parser\n\nKey changes:\n- Add parser\n"));
    assert!(message.contains("Squashed 9 commits from prototype/fast-parser"));
    assert!(message.contains("Authors: ann, bob, cat and others"));
    assert!(message.contains("Files changed: 7"));
}

#[test]
fn test_squash_summary_redacts_and_falls_back() {
    let redactor = Redactor::from_config(&Config::default()).unwrap();

    let commits = vec![info("store token in private/keys.txt", "ann"), info("Add login", "ann")];
    let message = SquashSummary::build("spike/secret-login", "dev", &commits, 1, false).render(&redactor);
    // Both the derived title and the template name the branch.
    assert!(message.starts_with("Promote changes\n"));
    assert!(!message.contains("token"));
    assert!(message.contains("- Add login"));
    // The stats line names the source branch and is dropped with it.
    assert!(!message.contains("Squashed"));
    assert!(!message.to_lowercase().contains("secret"));

    let promotion = SquashSummary::build("private", "dev", &commits, 1, true).render(&redactor);
    assert!(promotion.starts_with("Promote private into dev\n"));

    let only_secrets = vec![info("rotate token", "ann")];
    let mut summary = SquashSummary::build("prototype/cache", "dev", &only_secrets, 0, false);
    summary.authors = vec!["secret agent".to_string()];
    summary.commit_count = 1;
    let message = summary.render(&redactor);
    assert!(!message.contains("token"));
    assert!(message.starts_with("feat: cache"));
}

// ---------------------------------------------------------------------------
// Git-backed merges
// ---------------------------------------------------------------------------

#[test]
fn test_squash_prototype_yields_one_commit() {
    let temp_dir = repo_with_main();
    let path = temp_dir.path();
    let fixture = Fixture::new(Config::default());

    git(path, &["checkout", "-q", "-b", "prototype/x", "main"]);
    for i in 0..12 {
        let message = if i == 3 {
            "wire up the api key loader".to_string()
        } else {
            format!("step {}", i)
        };
        commit_file(path, &format!("src/step{}.rs", i), "// step\n", &message);
    }
    git(path, &["checkout", "-q", "private"]);

    let before = count(path, "main");
    let sanitizer = fixture.sanitizer(path);
    let (op, outcome) = sanitizer.merge("prototype/x", "main", None).unwrap();

    assert_eq!(op.mode, MergeMode::Squash);
    assert_eq!(op.commits.len(), 12);
    assert_eq!(outcome.created_commits(), 1);
    assert_eq!(count(path, "main"), before + 1);

    let message = git_stdout(path, &["log", "-1", "--format=%B", "main"]);
    assert!(message.starts_with("feat: x"));
    assert!(!message.to_lowercase().contains("api key"));
    assert!(message.contains("Squashed 12 commits from prototype/x"));
    let files = git_stdout(path, &["ls-tree", "-r", "--name-only", "main"]);
    assert!(files.contains("src/step11.rs"));

    // Re-running has nothing left to merge.
    let (_, outcome) = sanitizer.merge("prototype/x", "main", None).unwrap();
    assert_eq!(outcome, MergeOutcome::UpToDate);
}

#[test]
fn test_squash_message_drops_lines_naming_sensitive_files() {
    let temp_dir = repo_with_main();
    let path = temp_dir.path();
    let fixture = Fixture::new(Config::default());

    git(path, &["checkout", "-q", "-b", "prototype/deploy", "main"]);
    commit_file(path, "src/deploy.rs", "// deploy\n", "Add deploy script");
    commit_file(path, "src/keys.rs", "// keys\n", "Copy id_rsa onto the build host");
    git(path, &["checkout", "-q", "private"]);

    fixture.sanitizer(path).merge("prototype/deploy", "main", None).unwrap();

    let message = git_stdout(path, &["log", "-1", "--format=%B", "main"]);
    assert!(message.contains("- Add deploy script"));
    assert!(!message.contains("id_rsa"), "{}", message);
}

#[test]
fn test_squash_drops_private_paths_from_public_target() {
    let temp_dir = repo_with_main();
    let path = temp_dir.path();
    let fixture = Fixture::new(Config::default());

    git(path, &["checkout", "-q", "-b", "spike/notes", "main"]);
    commit_file(path, "private/notes.md", "secret plans\n", "notes");
    commit_file(path, "src/lib.rs", "pub fn f() {}\n", "lib");
    git(path, &["checkout", "-q", "private"]);

    let (_, outcome) = fixture
        .sanitizer(path)
        .merge("spike/notes", "main", None)
        .unwrap();
    assert!(matches!(outcome, MergeOutcome::Squashed { squashed: 2, .. }));

    let files = git_stdout(path, &["ls-tree", "-r", "--name-only", "main"]);
    assert!(files.contains("src/lib.rs"));
    assert!(!files.contains("private/notes.md"));
    let history = git_stdout(path, &["log", "--name-only", "--format=", "main"]);
    assert!(!history.contains("private/"));
}

#[test]
fn test_preserve_with_private_content_fails_whole_step() {
    let temp_dir = repo_with_main();
    let path = temp_dir.path();
    let fixture = Fixture::new(Config::default());

    git(path, &["checkout", "-q", "-b", "fix/leak", "main"]);
    commit_file(path, "src/ok.rs", "// ok\n", "harmless");
    let bad = commit_file(path, "private/notes.md", "x\n", "oops");
    git(path, &["checkout", "-q", "private"]);

    let main_before = git_stdout(path, &["rev-parse", "main"]);
    let err = fixture
        .sanitizer(path)
        .merge("fix/leak", "main", None)
        .unwrap_err();
    match err {
        RepokitError::UnsafeHistory {
            source_branch,
            target_branch,
            commits,
        } => {
            assert_eq!(source_branch, "fix/leak");
            assert_eq!(target_branch, "main");
            assert_eq!(commits.len(), 1);
            assert_eq!(commits[0].sha, bad);
            assert_eq!(commits[0].paths, vec!["private/notes.md"]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(git_stdout(path, &["rev-parse", "main"]), main_before);
}

#[test]
fn test_preserve_fast_forwards() {
    let temp_dir = repo_with_main();
    let path = temp_dir.path();
    let fixture = Fixture::new(Config::default());

    git(path, &["checkout", "-q", "-b", "fix/bug", "main"]);
    commit_file(path, "src/a.rs", "// a\n", "first");
    let tip = commit_file(path, "src/b.rs", "// b\n", "second");
    git(path, &["checkout", "-q", "private"]);

    let (_, outcome) = fixture.sanitizer(path).merge("fix/bug", "main", None).unwrap();
    assert_eq!(outcome, MergeOutcome::FastForward { tip: tip.clone() });
    assert_eq!(git_stdout(path, &["rev-parse", "main"]), tip);
}

#[test]
fn test_preserve_replays_onto_diverged_target() {
    let temp_dir = repo_with_main();
    let path = temp_dir.path();
    let fixture = Fixture::new(Config::default());

    git(path, &["checkout", "-q", "-b", "fix/bug", "main"]);
    commit_file(path, "src/a.rs", "// a\n", "first fix");
    commit_file(path, "src/b.rs", "// b\n", "second fix");
    git(path, &["checkout", "-q", "main"]);
    let main_tip = commit_file(path, "docs/guide.md", "# Guide\n", "docs on main");
    git(path, &["checkout", "-q", "private"]);

    let (_, outcome) = fixture.sanitizer(path).merge("fix/bug", "main", None).unwrap();
    assert!(matches!(outcome, MergeOutcome::Replayed { commits: 2, .. }));

    let subjects = git_stdout(path, &["log", "--format=%s", "-3", "main"]);
    assert_eq!(subjects, "second fix\nfirst fix\ndocs on main");
    assert_eq!(git_stdout(path, &["rev-parse", "main~2"]), main_tip);
    assert_eq!(
        git_stdout(path, &["log", "-1", "--format=%an <%ae>", "main"]),
        "Test User <test@example.com>"
    );
    let files = git_stdout(path, &["ls-tree", "-r", "--name-only", "main"]);
    assert!(files.contains("src/a.rs") && files.contains("docs/guide.md"));
}

#[test]
fn test_conflict_applies_nothing() {
    let temp_dir = repo_with_main();
    let path = temp_dir.path();
    let fixture = Fixture::new(Config::default());

    git(path, &["checkout", "-q", "-b", "prototype/clash", "main"]);
    commit_file(path, "README.md", "# Prototype\n", "rewrite readme");
    git(path, &["checkout", "-q", "main"]);
    commit_file(path, "README.md", "# Main\n", "main readme");
    git(path, &["checkout", "-q", "private"]);

    let before = git_stdout(path, &["rev-parse", "main"]);
    let err = fixture
        .sanitizer(path)
        .merge("prototype/clash", "main", None)
        .unwrap_err();
    assert!(err.to_string().contains("README.md"));
    assert!(err.to_string().contains("nothing was applied"));
    assert_eq!(git_stdout(path, &["rev-parse", "main"]), before);
}

#[test]
fn test_interactive_branch_needs_choice() {
    let temp_dir = repo_with_main();
    let path = temp_dir.path();
    let fixture = Fixture::new(Config::default());

    git(path, &["checkout", "-q", "-b", "feature/login", "main"]);
    commit_file(path, "src/login.rs", "// login\n", "login");
    git(path, &["checkout", "-q", "private"]);

    let sanitizer = fixture.sanitizer(path);
    assert!(matches!(
        sanitizer.plan("feature/login", "main", None),
        Err(RepokitError::MergeModeRequired { .. })
    ));
    let op = sanitizer
        .plan("feature/login", "main", Some(MergeMode::Squash))
        .unwrap();
    assert_eq!(op.mode, MergeMode::Squash);
    assert!(op.sanitized_message.unwrap().starts_with("feat: login"));
}

#[test]
fn test_missing_branch_is_user_error() {
    let temp_dir = repo_with_main();
    let fixture = Fixture::new(Config::default());
    let err = fixture
        .sanitizer(temp_dir.path())
        .plan("prototype/none", "main", None)
        .unwrap_err();
    assert!(err.to_string().contains("'prototype/none' does not exist"));
}

/// `dev` and `main` as one filtered root commit derived from `private`.
fn managed_repo(fixture: &Fixture) -> tempfile::TempDir {
    let temp_dir = create_private_repo();
    let path = temp_dir.path();
    commit_file(path, "private/notes.md", "plans\n", "private notes");
    commit_file(path, "src/lib.rs", "pub fn a() {}\n", "lib");

    let private_tip = git_stdout(path, &["rev-parse", "private"]);
    let (tree, removed) = filtered_tree(path, &private_tip, |p| {
        !fixture.matcher.is_sensitive_path(p)
    })
    .unwrap();
    assert_eq!(removed, vec!["private/notes.md"]);
    let root = commit_tree(path, &tree, &[], "Initialize dev", None).unwrap();
    for branch in ["dev", "main"] {
        update_ref(path, &format!("refs/heads/{}", branch), &root, Some(""), "test").unwrap();
        update_ref(path, &promoted_ref(branch), &private_tip, None, "test").unwrap();
    }
    temp_dir
}

#[test]
fn test_cascade_promotes_private_to_main() {
    let fixture = Fixture::new(Config::default());
    let temp_dir = managed_repo(&fixture);
    let path = temp_dir.path();

    commit_file(path, "src/new.rs", "pub fn b() {}\n", "add b");
    commit_file(path, "private/more.md", "more plans\n", "more notes");
    commit_file(path, "src/other.rs", "pub fn c() {}\n", "add c with token refresh");
    let private_tip = git_stdout(path, &["rev-parse", "private"]);

    let report = fixture.sanitizer(path).cascade("main", None).unwrap();
    assert!(report.is_complete());
    assert_eq!(report.path.len(), 2);
    let applied = report.into_result().unwrap();
    assert_eq!(applied[0].op.mode, MergeMode::Squash);
    assert!(matches!(applied[0].outcome, MergeOutcome::Squashed { squashed: 3, .. }));
    assert_eq!(applied[1].op.mode, MergeMode::Preserve);
    assert!(matches!(applied[1].outcome, MergeOutcome::FastForward { .. }));

    assert_eq!(count(path, "dev"), 2);
    assert_eq!(
        git_stdout(path, &["rev-parse", "main"]),
        git_stdout(path, &["rev-parse", "dev"])
    );
    let files = git_stdout(path, &["ls-tree", "-r", "--name-only", "main"]);
    assert!(files.contains("src/new.rs") && files.contains("src/other.rs"));
    let history = git_stdout(path, &["log", "--name-only", "--format=%B", "main"]);
    assert!(!history.contains("private/"));
    assert!(!history.contains("token"));

    for branch in ["dev", "main"] {
        assert_eq!(
            git_stdout(path, &["rev-parse", &promoted_ref(branch)]),
            private_tip
        );
    }

    // A second cascade finds nothing to do.
    let report = fixture.sanitizer(path).cascade("main", None).unwrap();
    assert!(
        report
            .applied
            .iter()
            .all(|s| s.outcome == MergeOutcome::UpToDate)
    );
}

#[test]
fn test_cascade_stops_at_first_failure() {
    let config = Config {
        merge_rules: vec![MergeRuleConfig {
            pattern: "dev".to_string(),
            mode: MergeMode::Interactive,
        }],
        ..Config::default()
    };
    let fixture = Fixture::new(config);
    let temp_dir = managed_repo(&fixture);
    let path = temp_dir.path();
    commit_file(path, "src/new.rs", "pub fn b() {}\n", "add b");
    let main_before = git_stdout(path, &["rev-parse", "main"]);

    let report = fixture.sanitizer(path).cascade("main", None).unwrap();
    assert_eq!(report.applied.len(), 1);
    let failed = report.failed.as_ref().unwrap();
    assert_eq!(failed.edge.to_string(), "dev -> main");
    assert!(matches!(failed.error, RepokitError::MergeModeRequired { .. }));
    assert_eq!(git_stdout(path, &["rev-parse", "main"]), main_before);
    assert!(report.into_result().is_err());

    // The fallback choice resolves the interactive step.
    let report = fixture
        .sanitizer(path)
        .cascade("main", Some(MergeMode::Preserve))
        .unwrap();
    assert!(report.is_complete());
}
