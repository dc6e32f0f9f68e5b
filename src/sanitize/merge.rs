//! Planning and applying a single merge step.

use super::redact::Redactor;
use super::rules::{MergeMode, MergeRules};
use super::summary::SquashSummary;
use crate::error::{RepokitError, Result};
use crate::guard::PrivateContentGuard;
use crate::vcs::{
    CommitInfo, CommitPaths, MergeTreeOutcome, Signature, advance_branch, branch_tip,
    commit_info, commit_range, commit_tree, empty_tree, filtered_tree, is_ancestor, merge_base,
    merge_tree, read_ref, touched_paths, tree_of, update_ref,
};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Namespace of the refs recording which private commit a public branch's
/// content derives from.
pub const PROMOTED_REF_PREFIX: &str = "refs/repokit/promoted/";

pub fn promoted_ref(branch: &str) -> String {
    format!("{}{}", PROMOTED_REF_PREFIX, branch)
}

/// One planned merge of `source_branch` into `target_branch`.
///
/// Planned against the branch tips it records; applying it fails if the
/// target has moved since.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeOp {
    pub source_branch: String,
    pub target_branch: String,
    pub mode: MergeMode,
    /// The redacted squash message; `None` for preserve.
    pub sanitized_message: Option<String>,
    pub source_tip: String,
    pub target_tip: String,
    /// Merge base the range starts from.
    pub base: Option<String>,
    /// Commits in the range, oldest first.
    pub commits: Vec<String>,
}

/// What applying a [`MergeOp`] did to the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Nothing to merge, or nothing that survives filtering.
    UpToDate,
    FastForward { tip: String },
    Squashed { commit: String, squashed: usize },
    Replayed { tip: String, commits: usize },
}

impl MergeOutcome {
    /// New commits added to the target, fast-forwards excluded.
    pub fn created_commits(&self) -> usize {
        match self {
            MergeOutcome::Squashed { .. } => 1,
            MergeOutcome::Replayed { commits, .. } => *commits,
            _ => 0,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            MergeOutcome::UpToDate => "already up to date".to_string(),
            MergeOutcome::FastForward { tip } => {
                format!("fast-forwarded to {}", short(tip))
            }
            MergeOutcome::Squashed { commit, squashed } => {
                format!("squashed {} commits into {}", squashed, short(commit))
            }
            MergeOutcome::Replayed { tip, commits } => {
                format!("replayed {} commits, now at {}", commits, short(tip))
            }
        }
    }
}

fn short(sha: &str) -> &str {
    sha.get(..10).unwrap_or(sha)
}

/// Branch-scoped history merging.
pub struct HistorySanitizer<'a> {
    repo: &'a Path,
    guard: PrivateContentGuard<'a>,
    rules: MergeRules,
    redactor: Redactor,
}

impl<'a> HistorySanitizer<'a> {
    pub fn new(
        repo: &'a Path,
        guard: PrivateContentGuard<'a>,
        rules: MergeRules,
        redactor: Redactor,
    ) -> Self {
        Self {
            repo,
            guard,
            rules,
            redactor,
        }
    }

    pub fn rules(&self) -> &MergeRules {
        &self.rules
    }

    pub fn guard(&self) -> &PrivateContentGuard<'a> {
        &self.guard
    }

    /// Plan merging `source` into `target`, choosing the mode from the rules
    /// unless `explicit` is given.
    pub fn plan(&self, source: &str, target: &str, explicit: Option<MergeMode>) -> Result<MergeOp> {
        let mode = self.rules.resolve(source, explicit)?;
        self.plan_with_mode(source, target, mode)
    }

    pub fn plan_with_mode(&self, source: &str, target: &str, mode: MergeMode) -> Result<MergeOp> {
        if mode == MergeMode::Interactive {
            return Err(RepokitError::MergeModeRequired {
                branch: source.to_string(),
            });
        }
        if source == target {
            return Err(RepokitError::UserError(format!(
                "cannot merge '{}' into itself",
                source
            )));
        }
        let source_tip = self.require_tip(source)?;
        let target_tip = self.require_tip(target)?;
        let base = self.range_base(target, &source_tip, &target_tip)?;
        let commits = commit_range(self.repo, base.as_deref(), &source_tip)?;

        let sanitized_message = if mode == MergeMode::Squash && !commits.is_empty() {
            Some(self.squash_message(source, target, &commits)?)
        } else {
            None
        };

        debug!(
            source,
            target,
            mode = %mode,
            commits = commits.len(),
            base = base.as_deref().unwrap_or("<none>"),
            "planned merge"
        );
        Ok(MergeOp {
            source_branch: source.to_string(),
            target_branch: target.to_string(),
            mode,
            sanitized_message,
            source_tip,
            target_tip,
            base,
            commits,
        })
    }

    /// Plan and apply in one go.
    pub fn merge(
        &self,
        source: &str,
        target: &str,
        explicit: Option<MergeMode>,
    ) -> Result<(MergeOp, MergeOutcome)> {
        let op = self.plan(source, target, explicit)?;
        let outcome = self.apply(&op)?;
        Ok((op, outcome))
    }

    /// Apply a planned merge. The target ref moves at most once, at the end.
    pub fn apply(&self, op: &MergeOp) -> Result<MergeOutcome> {
        if op.commits.is_empty() {
            debug!(source = %op.source_branch, target = %op.target_branch, "nothing to merge");
            return Ok(MergeOutcome::UpToDate);
        }

        let outcome = match op.mode {
            MergeMode::Squash => self.apply_squash(op)?,
            MergeMode::Preserve => self.apply_preserve(op)?,
            MergeMode::Interactive => {
                return Err(RepokitError::MergeModeRequired {
                    branch: op.source_branch.clone(),
                });
            }
        };

        self.record_promotion(op)?;
        info!(
            source = %op.source_branch,
            target = %op.target_branch,
            mode = %op.mode,
            "{}",
            outcome.describe()
        );
        Ok(outcome)
    }

    fn require_tip(&self, branch: &str) -> Result<String> {
        branch_tip(self.repo, branch)?
            .ok_or_else(|| RepokitError::UserError(format!("branch '{}' does not exist", branch)))
    }

    /// Where the range to merge starts.
    ///
    /// The target's promotion ref when it lies in the source's history (public
    /// branches created from a filtered private tree share no commits with
    /// it), otherwise the ordinary merge base.
    fn range_base(&self, target: &str, source_tip: &str, target_tip: &str) -> Result<Option<String>> {
        if let Some(promoted) = read_ref(self.repo, &promoted_ref(target))?
            && is_ancestor(self.repo, &promoted, source_tip)?
        {
            return Ok(Some(promoted));
        }
        merge_base(self.repo, target_tip, source_tip)
    }

    fn filters(&self, target: &str) -> bool {
        self.guard.graph().is_public(target)
    }

    fn keep(&self) -> impl Fn(&str) -> bool + '_ {
        move |path: &str| !self.guard.matcher().is_sensitive_path(path)
    }

    fn squash_message(&self, source: &str, target: &str, commits: &[String]) -> Result<String> {
        let infos = commits
            .iter()
            .map(|sha| commit_info(self.repo, sha))
            .collect::<Result<Vec<CommitInfo>>>()?;

        let filter = self.filters(target);
        let mut files: Vec<String> = Vec::new();
        for sha in commits {
            for path in touched_paths(self.repo, sha)? {
                if (!filter || (self.keep())(path.as_str())) && !files.contains(&path) {
                    files.push(path);
                }
            }
        }

        let graph = self.guard.graph();
        let is_promotion = graph.contains(source) && graph.contains(target);
        let summary = SquashSummary::build(source, target, &infos, files.len(), is_promotion);
        Ok(summary.render(&self.redactor))
    }

    /// A parentless commit holding `tree`, used only as a merge input.
    fn scratch_commit(&self, tree: &str) -> Result<String> {
        commit_tree(self.repo, tree, &[], "repokit merge input", None)
    }

    /// `commit` itself, or a scratch commit of its tree without sensitive
    /// paths when the target is public.
    fn merge_input(&self, commit: &str, filter: bool) -> Result<String> {
        if !filter {
            return Ok(commit.to_string());
        }
        let (tree, removed) = filtered_tree(self.repo, commit, self.keep())?;
        if removed.is_empty() {
            return Ok(commit.to_string());
        }
        self.scratch_commit(&tree)
    }

    fn empty_base(&self) -> Result<String> {
        let tree = empty_tree(self.repo)?;
        self.scratch_commit(&tree)
    }

    fn apply_squash(&self, op: &MergeOp) -> Result<MergeOutcome> {
        let filter = self.filters(&op.target_branch);
        let base = match &op.base {
            Some(base) => self.merge_input(base, filter)?,
            None => self.empty_base()?,
        };
        let theirs = self.merge_input(&op.source_tip, filter)?;

        let merged = match merge_tree(self.repo, Some(base.as_str()), &op.target_tip, &theirs)? {
            MergeTreeOutcome::Clean(tree) => tree,
            MergeTreeOutcome::Conflicted(paths) => return Err(conflict(op, None, &paths)),
        };
        let tree = if filter {
            filtered_tree(self.repo, &merged, self.keep())?.0
        } else {
            merged
        };

        if tree == tree_of(self.repo, &op.target_tip)? {
            debug!(target = %op.target_branch, "squash result leaves the target tree unchanged");
            return Ok(MergeOutcome::UpToDate);
        }

        let message = op.sanitized_message.clone().unwrap_or_else(|| {
            format!("Promote {} into {}", op.source_branch, op.target_branch)
        });
        let commit = commit_tree(self.repo, &tree, &[op.target_tip.as_str()], &message, None)?;
        advance_branch(
            self.repo,
            &op.target_branch,
            &commit,
            &op.target_tip,
            &format!("squash {} into {}", op.source_branch, op.target_branch),
        )?;
        Ok(MergeOutcome::Squashed {
            commit,
            squashed: op.commits.len(),
        })
    }

    fn apply_preserve(&self, op: &MergeOp) -> Result<MergeOutcome> {
        let infos = op
            .commits
            .iter()
            .map(|sha| commit_info(self.repo, sha))
            .collect::<Result<Vec<CommitInfo>>>()?;

        let mut touched = Vec::with_capacity(infos.len());
        for info in &infos {
            touched.push(CommitPaths {
                sha: info.sha.clone(),
                summary: info.summary().to_string(),
                paths: touched_paths(self.repo, &info.sha)?,
            });
        }
        let unsafe_commits = self.guard.unsafe_commits(&op.target_branch, &touched);
        if !unsafe_commits.is_empty() {
            return Err(RepokitError::UnsafeHistory {
                source_branch: op.source_branch.clone(),
                target_branch: op.target_branch.clone(),
                commits: unsafe_commits,
            });
        }

        let reason = format!("preserve {} into {}", op.source_branch, op.target_branch);
        if is_ancestor(self.repo, &op.target_tip, &op.source_tip)? {
            advance_branch(
                self.repo,
                &op.target_branch,
                &op.source_tip,
                &op.target_tip,
                &reason,
            )?;
            return Ok(MergeOutcome::FastForward {
                tip: op.source_tip.clone(),
            });
        }

        let mut current = op.target_tip.clone();
        let mut replayed = 0;
        let mut empty_base: Option<String> = None;
        for info in &infos {
            if info.is_merge() {
                debug!(sha = %info.sha, "skipping merge commit; its parents are replayed individually");
                continue;
            }
            let parent = match info.parents.first() {
                Some(parent) => parent.clone(),
                None => match &empty_base {
                    Some(base) => base.clone(),
                    None => {
                        let base = self.empty_base()?;
                        empty_base = Some(base.clone());
                        base
                    }
                },
            };
            let tree = match merge_tree(self.repo, Some(parent.as_str()), &current, &info.sha)? {
                MergeTreeOutcome::Clean(tree) => tree,
                MergeTreeOutcome::Conflicted(paths) => {
                    return Err(conflict(op, Some(info.sha.as_str()), &paths));
                }
            };
            let author = Signature {
                name: info.author_name.clone(),
                email: info.author_email.clone(),
                date: Some(info.author_date.clone()),
            };
            current = commit_tree(self.repo, &tree, &[current.as_str()], &info.message, Some(&author))?;
            replayed += 1;
        }

        if current == op.target_tip {
            return Ok(MergeOutcome::UpToDate);
        }
        advance_branch(self.repo, &op.target_branch, &current, &op.target_tip, &reason)?;
        Ok(MergeOutcome::Replayed {
            tip: current,
            commits: replayed,
        })
    }

    /// Point the target's promotion ref at the private commit its content now
    /// derives from.
    fn record_promotion(&self, op: &MergeOp) -> Result<()> {
        let graph = self.guard.graph();
        if !graph.is_public(&op.target_branch) {
            return Ok(());
        }
        let derived = if graph.is_private(&op.source_branch) {
            Some(op.source_tip.clone())
        } else {
            read_ref(self.repo, &promoted_ref(&op.source_branch))?
        };
        if let Some(derived) = derived {
            update_ref(
                self.repo,
                &promoted_ref(&op.target_branch),
                &derived,
                None,
                &format!("promote {} into {}", op.source_branch, op.target_branch),
            )?;
        }
        Ok(())
    }
}

fn conflict(op: &MergeOp, commit: Option<&str>, paths: &[String]) -> RepokitError {
    let at = commit
        .map(|sha| format!(" at commit {}", short(sha)))
        .unwrap_or_default();
    RepokitError::UserError(format!(
        "merging '{}' into '{}' conflicts{}; nothing was applied:\n{}\n\n\
         Fix: resolve the conflict on '{}' and retry.",
        op.source_branch,
        op.target_branch,
        at,
        paths
            .iter()
            .map(|p| format!("  x {}", p))
            .collect::<Vec<_>>()
            .join("\n"),
        op.target_branch
    ))
}
