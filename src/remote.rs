//! Remote hosting seam and the publish step.
//!
//! Publishing is the only network I/O repokit performs. It runs after every
//! local invariant holds: the branch must be public and its whole history must
//! pass the guard before anything is pushed.

use crate::error::{RepokitError, Result};
use crate::git::{GitInvocation, run_git, run_git_status};
use crate::guard::PrivateContentGuard;
use crate::vcs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Visibility requested for a hosted repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

impl Visibility {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "private" => Some(Self::Private),
            "public" => Some(Self::Public),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Public => "public",
        }
    }
}

/// A place public branches can be pushed to.
pub trait RemoteHost {
    /// Create (or reuse) the hosted repository and return its URL.
    fn create_repository(
        &self,
        name: &str,
        visibility: Visibility,
        org: Option<&str>,
    ) -> Result<String>;

    /// Push one local branch to the hosted repository.
    fn push(&self, branch: &str) -> Result<()>;
}

/// A remote reached with plain git.
///
/// `base_url` is either a URL prefix such as `git@github.com:` /
/// `https://git.example.com` or a local directory. For a local directory the
/// repository is created as a bare repository on disk; for a URL it must
/// already exist on the host and is only registered.
#[derive(Debug, Clone)]
pub struct GitRemote {
    repo: PathBuf,
    remote_name: String,
    base_url: String,
}

impl GitRemote {
    pub fn new(repo: &Path, remote_name: &str, base_url: &str) -> Self {
        Self {
            repo: repo.to_path_buf(),
            remote_name: remote_name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// URL the remote is currently registered with, if any.
    pub fn registered_url(&self) -> Result<Option<String>> {
        let (code, output) = run_git_status(
            &self.repo,
            &["remote", "get-url", &self.remote_name],
            &GitInvocation::default(),
        )?;
        Ok((code == 0 && !output.is_empty()).then_some(output.stdout))
    }

    fn repository_url(&self, name: &str, org: Option<&str>) -> String {
        let path = match org {
            Some(org) => format!("{}/{}.git", org, name),
            None => format!("{}.git", name),
        };
        if self.base_url.ends_with(':') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn is_local(&self) -> bool {
        !self.base_url.contains("://") && !self.base_url.ends_with(':')
    }

    fn register(&self, url: &str) -> Result<()> {
        match self.registered_url()? {
            Some(existing) if existing == url => {}
            Some(_) => {
                run_git(&self.repo, &["remote", "set-url", &self.remote_name, url])?;
                info!(remote = %self.remote_name, url, "updated remote URL");
            }
            None => {
                run_git(&self.repo, &["remote", "add", &self.remote_name, url])?;
                info!(remote = %self.remote_name, url, "added remote");
            }
        }
        Ok(())
    }
}

impl RemoteHost for GitRemote {
    fn create_repository(
        &self,
        name: &str,
        visibility: Visibility,
        org: Option<&str>,
    ) -> Result<String> {
        let url = self.repository_url(name, org);

        if self.is_local() {
            let path = Path::new(&url);
            if !path.exists() {
                std::fs::create_dir_all(path).map_err(|e| {
                    RepokitError::UserError(format!(
                        "failed to create remote directory '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                run_git(path, &["init", "--bare", "--quiet"])?;
                info!(url = %url, "created bare repository");
            }
        } else {
            debug!(
                url = %url,
                visibility = visibility.as_str(),
                "plain git cannot create hosted repositories; registering URL only"
            );
        }

        self.register(&url)?;
        Ok(url)
    }

    fn push(&self, branch: &str) -> Result<()> {
        let refspec = format!("refs/heads/{0}:refs/heads/{0}", branch);
        run_git(&self.repo, &["push", "--quiet", &self.remote_name, &refspec]).map_err(|e| {
            RepokitError::GitError(format!(
                "failed to push '{}' to '{}': {}",
                branch, self.remote_name, e
            ))
        })?;
        info!(branch, remote = %self.remote_name, "pushed branch");
        Ok(())
    }
}

/// A hosted repository to create before the first push.
#[derive(Debug, Clone)]
pub struct NewRepository {
    pub name: String,
    pub visibility: Visibility,
    pub org: Option<String>,
}

/// Push `branch` through `host` after checking it is safe to publish.
///
/// The private branch is refused outright, and a public branch whose history
/// contains any commit touching a private path is refused with
/// `PrivateContentDetected`. Nothing is created or pushed in either case.
/// With `create`, the hosted repository is created once the checks pass.
pub fn publish(
    repo: &Path,
    guard: &PrivateContentGuard<'_>,
    host: &dyn RemoteHost,
    branch: &str,
    create: Option<&NewRepository>,
) -> Result<Option<String>> {
    let graph = guard.graph();
    if graph.is_private(branch) {
        return Err(RepokitError::UserError(format!(
            "refusing to publish the private branch '{}'",
            branch
        )));
    }
    if !vcs::branch_exists(repo, branch)? {
        return Err(RepokitError::UserError(format!(
            "branch '{}' does not exist",
            branch
        )));
    }

    guard.ensure_clean_history(repo, branch)?;

    let url = match create {
        Some(new) => Some(host.create_repository(&new.name, new.visibility, new.org.as_deref())?),
        None => None,
    };
    host.push(branch)?;
    Ok(url)
}
