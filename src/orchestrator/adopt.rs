//! The adoption sequence.

use super::plan::AdoptionPlan;
use super::snapshot::{RepositorySnapshot, info_exclude_path};
use crate::config::Config;
use crate::context::RepoContext;
use crate::error::{RepokitError, Result};
use crate::events::{Event, EventAction, append_event};
use crate::fs::{atomic_write_file, ensure_dir_with_gitkeep};
use crate::git::has_uncommitted_changes;
use crate::guard::{PrivateContentGuard, install_excludes};
use crate::locks::{self, LockGuard};
use crate::sanitize::promoted_ref;
use crate::state::{Phase, StateMarker};
use crate::templates::{ProjectDescriptor, TemplateRenderer};
use crate::vcs;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Inputs of one `adopt` run.
pub struct AdoptRequest<'a> {
    /// Repository root; created if missing.
    pub root: PathBuf,
    /// Merged configuration (overrides already applied).
    pub config: Config,
    /// Proceed even when the state marker disagrees with the repository.
    pub force: bool,
    pub renderer: Option<&'a dyn TemplateRenderer>,
    /// Project name for templates; defaults to the root directory name.
    pub project_name: Option<String>,
    pub description: String,
}

impl<'a> AdoptRequest<'a> {
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            root: root.into(),
            config,
            force: false,
            renderer: None,
            project_name: None,
            description: String::new(),
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_renderer(mut self, renderer: &'a dyn TemplateRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }
}

/// What `adopt` did.
#[derive(Debug, Clone, Serialize)]
pub struct AdoptionReport {
    pub root: PathBuf,
    pub strategy: String,
    pub private_branch: String,
    pub fresh_repository: bool,
    /// Commit made on the private branch, if anything needed committing.
    pub private_commit: Option<String>,
    pub created_branches: Vec<String>,
    /// Public branches that already existed and were only verified.
    pub existing_branches: Vec<String>,
    pub worktrees: Vec<(String, PathBuf)>,
    pub directories: Vec<String>,
    pub snapshot: PathBuf,
}

/// Materialize the repository described by `request`.
///
/// Planning and preflight checks fail without touching anything. Once the
/// snapshot is taken, any failure rolls the repository back and surfaces as
/// `AdoptionFailed`.
pub fn adopt(request: &AdoptRequest<'_>) -> Result<AdoptionReport> {
    let root_created = !request.root.exists();
    if root_created {
        std::fs::create_dir_all(&request.root).map_err(|e| {
            RepokitError::UserError(format!(
                "failed to create repository directory '{}': {}",
                request.root.display(),
                e
            ))
        })?;
    }
    let root = request.root.canonicalize().map_err(|e| {
        RepokitError::UserError(format!(
            "failed to resolve '{}': {}",
            request.root.display(),
            e
        ))
    })?;

    let plan = AdoptionPlan::build(&root, &request.config)?;
    let private = plan.graph.private_branch.clone();
    info!(root = %root.display(), strategy = %plan.graph.strategy, "adopting repository");

    if vcs::is_git_repository(&root) {
        preflight_existing(&root, &plan, request.force)?;
    }

    let fresh_repository = vcs::init_repository(&root, &private)?;
    let ctx = RepoContext::for_root(&root)?;

    let _repo_lock = locks::acquire_repository_lock(&ctx, "adopt")?;
    let _branch_locks = acquire_working_copy_locks(&ctx, &plan)?;

    let mut snapshot = RepositorySnapshot::capture(&ctx, fresh_repository)?;
    if root_created {
        snapshot.record_created([root.clone()]);
    }
    let snapshot_path = snapshot.persist(&ctx)?;

    let mut report = AdoptionReport {
        root: root.clone(),
        strategy: plan.graph.strategy.clone(),
        private_branch: private.clone(),
        fresh_repository,
        private_commit: None,
        created_branches: Vec::new(),
        existing_branches: Vec::new(),
        worktrees: Vec::new(),
        directories: plan.directories.iter().map(String::from).collect(),
        snapshot: snapshot_path,
    };

    match materialize(&ctx, &plan, request, &mut snapshot, &mut report) {
        Ok(()) => {
            info!(
                created = report.created_branches.len(),
                worktrees = report.worktrees.len(),
                "repository adopted"
            );
            Ok(report)
        }
        Err(cause) => {
            warn!(error = %cause, "adoption failed; rolling back");
            let rollback_problems = snapshot.rollback(&ctx);
            if !fresh_repository {
                let _ = snapshot.persist(&ctx);
                let event = Event::new(EventAction::Rollback).with_details(json!({
                    "operation": "adopt",
                    "cause": cause.to_string(),
                    "problems": rollback_problems,
                }));
                if let Err(e) = append_event(&ctx, &event) {
                    warn!(error = %e, "failed to record rollback event");
                }
            }
            Err(RepokitError::AdoptionFailed {
                cause: cause.to_string(),
                rollback_problems,
            })
        }
    }
}

/// Checks on an existing repository that must pass before anything changes.
fn preflight_existing(root: &Path, plan: &AdoptionPlan, force: bool) -> Result<()> {
    let ctx = RepoContext::for_root(root)?;
    let private = &plan.graph.private_branch;

    match StateMarker::load(&ctx) {
        Ok(Some(marker)) => {
            if let Err(e) = marker.check_compatible(&plan.graph, root) {
                if !force {
                    return Err(e);
                }
                warn!(error = %e, "proceeding despite marker mismatch (--force)");
            }
        }
        Ok(None) => {}
        Err(e) if force => warn!(error = %e, "ignoring unreadable marker (--force)"),
        Err(e) => return Err(e),
    }

    let head = vcs::head_branch(root)?.ok_or_else(|| {
        RepokitError::UserError(format!(
            "{} has a detached HEAD; check out '{}' before adopting",
            root.display(),
            private
        ))
    })?;
    let head_tip = vcs::branch_tip(root, &head)?;

    if head_tip.is_some() && has_uncommitted_changes(root)? {
        return Err(RepokitError::UserError(format!(
            "{} has uncommitted changes; commit or stash them before adopting",
            root.display()
        )));
    }

    if head != *private
        && let Some(private_tip) = vcs::branch_tip(root, private)?
        && head_tip.as_deref() != Some(private_tip.as_str())
    {
        return Err(RepokitError::UserError(format!(
            "the main working copy is on '{}' but '{}' points elsewhere; check out '{}' first",
            head, private, private
        )));
    }

    for spec in plan.graph.worktree_branches() {
        let wanted = plan.worktree_path(&spec.name);
        if let Some(existing) = vcs::find_worktree_for_branch(root, &spec.name)?
            && !vcs::paths_equivalent(&existing.path, &wanted)
            && !vcs::paths_equivalent(&existing.path, root)
        {
            return Err(RepokitError::BranchLocked {
                branch: spec.name.clone(),
                reason: format!("checked out at {}", existing.path.display()),
            });
        }
    }

    Ok(())
}

/// One lock per branch working copy this run will write to.
fn acquire_working_copy_locks(ctx: &RepoContext, plan: &AdoptionPlan) -> Result<Vec<LockGuard>> {
    let mut guards = vec![locks::acquire_branch_lock(
        ctx,
        &plan.graph.private_branch,
        "adopt",
    )?];
    for spec in plan.graph.worktree_branches() {
        guards.push(locks::acquire_branch_lock(ctx, &spec.name, "adopt")?);
    }
    Ok(guards)
}

/// Steps that run under the snapshot.
fn materialize(
    ctx: &RepoContext,
    plan: &AdoptionPlan,
    request: &AdoptRequest<'_>,
    snapshot: &mut RepositorySnapshot,
    report: &mut AdoptionReport,
) -> Result<()> {
    let graph = &plan.graph;

    StateMarker::adopting(
        graph,
        request.config.directory_profile.as_deref(),
        &request.config.directory_groups,
        request.config.private_set,
    )
    .save(ctx)?;

    let guard = PrivateContentGuard::new(graph, &plan.matcher, &request.config.sensitive);

    report.private_commit = commit_private_structure(ctx, plan, request, &guard, snapshot)?;

    for spec in graph.creation_order() {
        if graph.is_private(&spec.name) {
            continue;
        }
        if create_public_branch(&ctx.repo_root, plan, &spec.name)? {
            report.created_branches.push(spec.name.clone());
        } else {
            report.existing_branches.push(spec.name.clone());
        }
    }

    for spec in graph.worktree_branches() {
        let path = ensure_worktree(ctx, plan, &spec.name, snapshot)?;
        report.worktrees.push((spec.name.clone(), path));
    }

    for spec in graph.public_branches() {
        guard.ensure_clean_history(&ctx.repo_root, &spec.name)?;
    }

    let marker = StateMarker::load(ctx)?
        .ok_or_else(|| RepokitError::CorruptedState("state marker disappeared".to_string()))?
        .with_phase(Phase::Managed);
    marker.save(ctx)?;

    let event = Event::new(EventAction::Adopt).with_details(json!({
        "strategy": graph.strategy,
        "created_branches": report.created_branches,
        "existing_branches": report.existing_branches,
        "worktrees": report.worktrees.iter().map(|(b, _)| b).collect::<Vec<_>>(),
        "directories": report.directories,
    }));
    append_event(ctx, &event)?;

    Ok(())
}

/// Create the directory structure and template files in the main working
/// copy and commit them on the private branch.
fn commit_private_structure(
    ctx: &RepoContext,
    plan: &AdoptionPlan,
    request: &AdoptRequest<'_>,
    guard: &PrivateContentGuard<'_>,
    snapshot: &mut RepositorySnapshot,
) -> Result<Option<String>> {
    let root = &ctx.repo_root;
    let private = &plan.graph.private_branch;

    if vcs::head_branch(root)?.as_deref() != Some(private.as_str()) {
        // HEAD sits on another branch at the same commit; move it over so
        // the main working copy belongs to the private branch.
        if !vcs::branch_exists(root, private)?
            && let Some(head_tip) = vcs::rev_parse(root, "HEAD")?
        {
            vcs::create_branch(root, private, &head_tip)?;
        }
        vcs::set_head(root, private)?;
        debug!(branch = %private, "main working copy moved to the private branch");
    }

    exclude_worktrees_dir(ctx, plan.worktrees_dir())?;

    // A source tree without history is committed on the private branch as is;
    // public branches derive from that commit with sensitive paths left out.
    let unborn = !vcs::branch_exists(root, private)?;
    let mut to_stage = Vec::new();
    if unborn {
        let worktrees_prefix = format!("{}/", plan.worktrees_dir().trim_matches('/'));
        let source: Vec<String> = vcs::untracked_paths(root)?
            .into_iter()
            .filter(|p| !p.starts_with(&worktrees_prefix))
            .collect();
        debug!(files = source.len(), "staging existing source tree");
        to_stage.extend(source);
    }
    for dir in plan.private_tree_directories() {
        let created = ensure_dir_with_gitkeep(&root.join(&dir))?;
        to_stage.extend(created.iter().filter(|p| p.is_file()).filter_map(|p| relative(root, p)));
        snapshot.record_created(created);
    }

    if let Some(renderer) = request.renderer {
        let descriptor = ProjectDescriptor {
            name: request.project_name.clone().unwrap_or_else(|| {
                root.file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default()
            }),
            description: request.description.clone(),
            directories: plan.directories.iter().map(String::from).collect(),
        };
        for file in renderer.render(root, &descriptor)? {
            let path = root.join(&file.path);
            if path.exists() {
                continue;
            }
            atomic_write_file(&path, &file.contents)?;
            snapshot.record_created([path]);
            to_stage.push(file.path);
        }
    }

    vcs::stage_paths(root, &to_stage)?;
    snapshot.record_staged(&to_stage);
    guard.validate_staged_on(root, private)?;

    let staged = vcs::staged_paths(root)?;
    let commit = if !staged.is_empty() {
        Some(vcs::commit(root, "Initialize repository structure")?)
    } else if unborn {
        Some(vcs::commit_allow_empty(root, "Initialize repository")?)
    } else {
        None
    };
    if let Some(sha) = &commit {
        info!(branch = %private, commit = %sha, files = staged.len(), "committed structure");
    }
    Ok(commit)
}

/// Create `branch` if missing. Returns whether it was created.
///
/// A branch based on the private branch starts as a new root commit whose
/// tree is the private tree with every sensitive path left out, so private
/// content never enters its history. A branch based on a public branch starts
/// at that branch's tip.
fn create_public_branch(root: &Path, plan: &AdoptionPlan, branch: &str) -> Result<bool> {
    if vcs::branch_exists(root, branch)? {
        debug!(branch, "branch exists; leaving it untouched");
        return Ok(false);
    }

    let graph = &plan.graph;
    let base = graph
        .base_of(branch)
        .unwrap_or(graph.private_branch.as_str())
        .to_string();
    let base_tip = vcs::branch_tip(root, &base)?.ok_or_else(|| {
        RepokitError::UserError(format!(
            "base branch '{}' of '{}' does not exist",
            base, branch
        ))
    })?;

    if graph.is_private(&base) {
        let (tree, removed) =
            vcs::filtered_tree(root, &base_tip, |p| !plan.matcher.is_sensitive_path(p))?;
        let commit = vcs::commit_tree(root, &tree, &[], &format!("Initialize {}", branch), None)?;
        vcs::update_ref(
            root,
            &format!("refs/heads/{}", branch),
            &commit,
            Some(""),
            &format!("adopt: create {}", branch),
        )?;
        vcs::update_ref(root, &promoted_ref(branch), &base_tip, None, "adopt")?;
        info!(branch, excluded = removed.len(), "created public root commit");
    } else {
        vcs::create_branch(root, branch, &base_tip)?;
        if let Some(promoted) = vcs::read_ref(root, &promoted_ref(&base))? {
            vcs::update_ref(root, &promoted_ref(branch), &promoted, None, "adopt")?;
        }
        info!(branch, base = %base, "created branch from public base");
    }
    Ok(true)
}

/// Ensure the working copy of `branch` exists, carries guard excludes and
/// has the resolved directories on disk.
fn ensure_worktree(
    ctx: &RepoContext,
    plan: &AdoptionPlan,
    branch: &str,
    snapshot: &mut RepositorySnapshot,
) -> Result<PathBuf> {
    let root = &ctx.repo_root;
    let path = plan.worktree_path(branch);

    match vcs::find_worktree_for_branch(root, branch)? {
        Some(existing) if vcs::paths_equivalent(&existing.path, &path) => {
            debug!(branch, path = %path.display(), "worktree already present");
        }
        Some(existing) => {
            return Err(RepokitError::BranchLocked {
                branch: branch.to_string(),
                reason: format!("checked out at {}", existing.path.display()),
            });
        }
        None => {
            vcs::create_worktree(root, &path, branch)?;
            info!(branch, path = %path.display(), "created worktree");
        }
    }

    install_excludes(&path, branch, &plan.graph, &plan.matcher)?;

    for dir in plan.private_tree_directories() {
        snapshot.record_created(ensure_dir_with_gitkeep(&path.join(&dir))?);
    }

    Ok(path)
}

/// Keep branch working copies out of the private branch's candidate commits.
fn exclude_worktrees_dir(ctx: &RepoContext, worktrees_dir: &str) -> Result<()> {
    let exclude_path = info_exclude_path(ctx);
    let entry = format!("/{}/", worktrees_dir.trim_matches('/'));
    let existing = std::fs::read_to_string(&exclude_path).unwrap_or_default();

    if existing.lines().any(|line| line.trim() == entry) {
        return Ok(());
    }

    let mut content = existing;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    if !content.contains("# repokit worktrees") {
        content.push_str("# repokit worktrees\n");
    }
    content.push_str(&entry);
    content.push('\n');
    atomic_write_file(&exclude_path, &content)
}

fn relative(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
}
