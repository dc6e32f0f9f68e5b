//! Tree plumbing: listing, filtering, three-way merging and committing trees
//! without touching any working copy.

use crate::error::{RepokitError, Result};
use crate::git::{
    GitInvocation, GitVersion, git_dir, require_git_version, run_git, run_git_status, run_git_with,
};
use std::path::{Path, PathBuf};

/// One blob (or submodule) entry of a recursively listed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: String,
    pub kind: String,
    pub sha: String,
    pub path: String,
}

/// Author identity applied to a re-created commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    /// Any date format git accepts; `None` means "now".
    pub date: Option<String>,
}

/// Result of an in-memory three-way merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeTreeOutcome {
    /// The merge succeeded and produced this tree.
    Clean(String),
    /// The merge had conflicts in these paths; nothing was written anywhere.
    Conflicted(Vec<String>),
}

/// Recursively list every blob in `treeish`.
pub fn ls_tree<P: AsRef<Path>>(repo: P, treeish: &str) -> Result<Vec<TreeEntry>> {
    let output = run_git(repo, &["ls-tree", "-r", "-z", "--full-tree", treeish])?;

    let mut entries = Vec::new();
    for record in output.stdout.split('\0').filter(|r| !r.is_empty()) {
        let Some((meta, path)) = record.split_once('\t') else {
            continue;
        };
        let mut parts = meta.split_whitespace();
        if let (Some(mode), Some(kind), Some(sha)) = (parts.next(), parts.next(), parts.next()) {
            entries.push(TreeEntry {
                mode: mode.to_string(),
                kind: kind.to_string(),
                sha: sha.to_string(),
                path: path.to_string(),
            });
        }
    }
    Ok(entries)
}

/// Tree object of a commit.
pub fn tree_of<P: AsRef<Path>>(repo: P, commit: &str) -> Result<String> {
    let output = run_git(repo, &["rev-parse", &format!("{}^{{tree}}", commit)])?;
    Ok(output.stdout)
}

/// SHA of the empty tree, written into the object database.
pub fn empty_tree<P: AsRef<Path>>(repo: P) -> Result<String> {
    let output = run_git_with(
        repo,
        &["mktree"],
        &GitInvocation {
            env: vec![],
            stdin: Some(b"".as_slice()),
        },
    )?;
    Ok(output.stdout)
}

/// Temporary index file removed on drop.
struct ScratchIndex(PathBuf);

impl Drop for ScratchIndex {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

/// Build a new tree from `treeish` keeping only the entries for which `keep`
/// returns true.
///
/// Uses a scratch index (`GIT_INDEX_FILE`) so neither the real index nor any
/// working copy is touched. Returns the new tree SHA and the removed paths.
pub fn filtered_tree<P, F>(repo: P, treeish: &str, keep: F) -> Result<(String, Vec<String>)>
where
    P: AsRef<Path>,
    F: Fn(&str) -> bool,
{
    let repo = repo.as_ref();
    let entries = ls_tree(repo, treeish)?;

    let mut records = Vec::new();
    let mut removed = Vec::new();
    for entry in &entries {
        if keep(&entry.path) {
            records.extend_from_slice(
                format!("{} {} {}\t{}\0", entry.mode, entry.kind, entry.sha, entry.path).as_bytes(),
            );
        } else {
            removed.push(entry.path.clone());
        }
    }

    if removed.is_empty() {
        return Ok((tree_of_treeish(repo, treeish)?, removed));
    }

    let scratch = ScratchIndex(git_dir(repo)?.join(format!("repokit-index-{}", std::process::id())));
    let env = vec![("GIT_INDEX_FILE", scratch.0.to_string_lossy().to_string())];

    run_git_with(
        repo,
        &["read-tree", "--empty"],
        &GitInvocation {
            env: env.clone(),
            stdin: None,
        },
    )?;
    if !records.is_empty() {
        run_git_with(
            repo,
            &["update-index", "-z", "--index-info"],
            &GitInvocation {
                env: env.clone(),
                stdin: Some(records.as_slice()),
            },
        )?;
    }
    let output = run_git_with(
        repo,
        &["write-tree"],
        &GitInvocation { env, stdin: None },
    )?;

    Ok((output.stdout, removed))
}

fn tree_of_treeish(repo: &Path, treeish: &str) -> Result<String> {
    let output = run_git(repo, &["rev-parse", &format!("{}^{{tree}}", treeish)])?;
    Ok(output.stdout)
}

/// Create a commit object for `tree` with the given parents. No ref is moved.
pub fn commit_tree<P: AsRef<Path>>(
    repo: P,
    tree: &str,
    parents: &[&str],
    message: &str,
    author: Option<&Signature>,
) -> Result<String> {
    let mut args: Vec<&str> = vec!["commit-tree", tree];
    for parent in parents {
        args.push("-p");
        args.push(parent);
    }
    args.push("-F");
    args.push("-");

    let mut env = Vec::new();
    if let Some(author) = author {
        env.push(("GIT_AUTHOR_NAME", author.name.clone()));
        env.push(("GIT_AUTHOR_EMAIL", author.email.clone()));
        if let Some(date) = &author.date {
            env.push(("GIT_AUTHOR_DATE", date.clone()));
        }
    }

    let output = run_git_with(
        repo,
        &args,
        &GitInvocation {
            env,
            stdin: Some(message.as_bytes()),
        },
    )?;
    Ok(output.stdout)
}

/// Oldest git whose `merge-tree` takes `--write-tree` with `--merge-base`.
pub const MERGE_TREE_GIT_VERSION: GitVersion = (2, 40);

/// Three-way merge of `ours` and `theirs` computed entirely in the object
/// database (`git merge-tree --write-tree`, git 2.40 or newer).
///
/// With `base` set, that commit is used as the merge base instead of the one
/// git would compute.
pub fn merge_tree<P: AsRef<Path>>(
    repo: P,
    base: Option<&str>,
    ours: &str,
    theirs: &str,
) -> Result<MergeTreeOutcome> {
    require_git_version(repo.as_ref(), MERGE_TREE_GIT_VERSION, "git merge-tree --write-tree")?;

    let base_arg = base.map(|b| format!("--merge-base={}", b));
    let mut args: Vec<&str> = vec!["merge-tree", "--write-tree", "--name-only", "--no-messages"];
    if let Some(base_arg) = &base_arg {
        args.push(base_arg);
    }
    args.push(ours);
    args.push(theirs);

    let (code, output) = run_git_status(repo, &args, &GitInvocation::default())?;
    let mut lines = output.stdout.lines();
    let tree = lines.next().unwrap_or("").to_string();

    match code {
        0 if !tree.is_empty() => Ok(MergeTreeOutcome::Clean(tree)),
        1 => {
            let mut conflicted: Vec<String> = Vec::new();
            for line in lines.take_while(|l| !l.is_empty()) {
                if !conflicted.iter().any(|c| c == line) {
                    conflicted.push(line.to_string());
                }
            }
            Ok(MergeTreeOutcome::Conflicted(conflicted))
        }
        _ => Err(RepokitError::GitError(format!(
            "git merge-tree {} {} failed (exit code {}): {}",
            ours, theirs, code, output.stderr
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{commit_file, create_test_repo, git, git_stdout};

    #[test]
    fn test_ls_tree_lists_nested_paths() {
        let temp_dir = create_test_repo();
        let path = temp_dir.path();
        commit_file(path, "src/deep/mod.rs", "// m\n", "nested");

        let paths: Vec<String> = ls_tree(path, "HEAD")
            .unwrap()
            .into_iter()
            .map(|e| e.path)
            .collect();
        assert_eq!(paths, vec!["README.md", "src/deep/mod.rs"]);
    }

    #[test]
    fn test_filtered_tree_drops_paths_without_touching_index() {
        let temp_dir = create_test_repo();
        let path = temp_dir.path();
        commit_file(path, "private/notes.md", "secret\n", "notes");
        commit_file(path, "src/lib.rs", "// lib\n", "lib");

        let (tree, removed) =
            filtered_tree(path, "HEAD", |p| !p.starts_with("private/")).unwrap();
        assert_eq!(removed, vec!["private/notes.md"]);

        let kept: Vec<String> = ls_tree(path, &tree)
            .unwrap()
            .into_iter()
            .map(|e| e.path)
            .collect();
        assert_eq!(kept, vec!["README.md", "src/lib.rs"]);

        // The real index still has everything.
        let status = git_stdout(path, &["status", "--porcelain"]);
        assert!(status.is_empty());
    }

    #[test]
    fn test_filtered_tree_without_removals_returns_same_tree() {
        let temp_dir = create_test_repo();
        let path = temp_dir.path();
        let (tree, removed) = filtered_tree(path, "HEAD", |_| true).unwrap();
        assert!(removed.is_empty());
        assert_eq!(tree, tree_of(path, "HEAD").unwrap());
    }

    #[test]
    fn test_commit_tree_with_author() {
        let temp_dir = create_test_repo();
        let path = temp_dir.path();
        let tree = tree_of(path, "HEAD").unwrap();
        let author = Signature {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            date: Some("2020-01-01T00:00:00+00:00".to_string()),
        };

        let sha = commit_tree(path, &tree, &["HEAD"], "re-created\n", Some(&author)).unwrap();
        let who = git_stdout(path, &["show", "-s", "--format=%an <%ae> %s", &sha]);
        assert_eq!(who, "Ada <ada@example.com> re-created");
    }

    #[test]
    fn test_merge_tree_clean_and_conflicted() {
        let temp_dir = create_test_repo();
        let path = temp_dir.path();
        git(path, &["branch", "side"]);
        commit_file(path, "a.txt", "ours\n", "ours");
        git(path, &["checkout", "-q", "side"]);
        commit_file(path, "b.txt", "theirs\n", "theirs");

        match merge_tree(path, None, "main", "side").unwrap() {
            MergeTreeOutcome::Clean(tree) => {
                let paths: Vec<String> =
                    ls_tree(path, &tree).unwrap().into_iter().map(|e| e.path).collect();
                assert_eq!(paths, vec!["README.md", "a.txt", "b.txt"]);
            }
            other => panic!("expected clean merge, got {:?}", other),
        }

        commit_file(path, "a.txt", "different\n", "conflict");
        match merge_tree(path, None, "main", "side").unwrap() {
            MergeTreeOutcome::Conflicted(paths) => assert_eq!(paths, vec!["a.txt"]),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_tree() {
        let temp_dir = create_test_repo();
        assert_eq!(
            empty_tree(temp_dir.path()).unwrap(),
            "4b825dc642cb6eb9a060e54bf8d69288fbee4904"
        );
    }
}
