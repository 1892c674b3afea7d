use std::path::{Path, PathBuf};

use async_trait::async_trait;
use git2::{BranchType, ErrorCode, Repository, StatusOptions};
use tracing::debug;

use crate::common::error::MgitError;
use crate::common::result::MgitResult;
use crate::domain::value_objects::head_state::HeadState;
use crate::domain::value_objects::selection::PackageSnapshot;
use crate::infrastructure::git::backend::GitBackend;
use crate::infrastructure::process::git_runner::{GitArgs, GitRunner};

/// Concrete [`GitBackend`] over one on-disk repository.
///
/// Metadata queries go through libgit2; mutating porcelain commands and
/// fetches go through the git executable. The repository is reopened per
/// query, so the handle itself is cheap to move into a task.
pub struct RepositoryHandle {
    location: PathBuf,
    runner: GitRunner,
}

impl RepositoryHandle {
    /// Open a handle, verifying the location is a git repository.
    pub fn open(location: impl Into<PathBuf>) -> MgitResult<Self> {
        let location = location.into();
        Repository::open(&location).map_err(|e| {
            MgitError::git_error_with_source(
                format!("'{}' is not a git repository", location.display()),
                e,
            )
        })?;
        let runner = GitRunner::new(&location);
        Ok(Self { location, runner })
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    fn repo(&self) -> MgitResult<Repository> {
        Repository::open(&self.location).map_err(|e| {
            MgitError::git_error_with_source(
                format!("failed to open repository at '{}'", self.location.display()),
                e,
            )
        })
    }

    /// Read-only view used for selection and report headers.
    pub async fn snapshot(&self, name: impl Into<String>) -> MgitResult<PackageSnapshot> {
        Ok(PackageSnapshot {
            name: name.into(),
            head: self.current_branch().await?,
            remote: self.current_remote().await?,
            dirty: self.has_local_changes().await?,
        })
    }

    async fn fetch(&self, remote: &str) -> MgitResult<()> {
        self.runner.run(&GitArgs::new("fetch").arg(remote)).await?;
        Ok(())
    }

    fn lookup_branch_state(&self) -> MgitResult<HeadState> {
        let repo = self.repo()?;
        let result = match repo.head() {
            Ok(head) if head.is_branch() => {
                let name = head
                    .shorthand()
                    .ok_or_else(|| MgitError::git_error("branch name is not valid UTF-8"))?;
                Ok(HeadState::Branch(name.to_string()))
            }
            Ok(_) => Ok(HeadState::Detached),
            // A freshly initialized repository has a symbolic HEAD but no
            // commit yet; report the target branch name.
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head_ref = repo.find_reference("HEAD")?;
                match head_ref.symbolic_target() {
                    Some(target) => Ok(HeadState::Branch(
                        target.strip_prefix("refs/heads/").unwrap_or(target).to_string(),
                    )),
                    None => Ok(HeadState::Detached),
                }
            }
            Err(e) => Err(e.into()),
        };
        result
    }

    fn compare_with_upstream(&self, remote: &str, branch: &str) -> MgitResult<(usize, usize)> {
        let repo = self.repo()?;
        let head_oid = repo
            .head()?
            .target()
            .ok_or_else(|| MgitError::git_error("HEAD does not point at a commit"))?;
        let tracking = format!("{}/{}", remote, branch);
        let upstream = repo
            .find_branch(&tracking, BranchType::Remote)
            .map_err(|_| {
                MgitError::reference(format!("Remote branch '{}' does not exist", tracking))
            })?;
        let upstream_oid = upstream.get().target().ok_or_else(|| {
            MgitError::git_error(format!("'{}' does not point at a commit", tracking))
        })?;
        let (ahead, behind) = repo.graph_ahead_behind(head_oid, upstream_oid)?;
        debug!(
            repository = %self.location.display(),
            tracking, ahead, behind, "compared HEAD with upstream"
        );
        Ok((ahead, behind))
    }
}

#[async_trait]
impl GitBackend for RepositoryHandle {
    async fn current_branch(&self) -> MgitResult<HeadState> {
        self.lookup_branch_state()
    }

    async fn current_remote(&self) -> MgitResult<Option<String>> {
        let repo = self.repo()?;
        let remotes = repo.remotes()?;
        Ok(remotes.get(0).map(|name| name.to_string()))
    }

    async fn remotes(&self) -> MgitResult<Vec<String>> {
        let repo = self.repo()?;
        let remotes = repo.remotes()?;
        Ok(remotes.iter().flatten().map(str::to_string).collect())
    }

    async fn local_branches(&self) -> MgitResult<Vec<String>> {
        let repo = self.repo()?;
        let mut names = Vec::new();
        for branch in repo.branches(Some(BranchType::Local))? {
            let (branch, _) = branch?;
            if let Some(name) = branch.name()? {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    async fn remote_branches(&self, remote: &str) -> MgitResult<Vec<String>> {
        let repo = self.repo()?;
        let prefix = format!("{}/", remote);
        let mut names = Vec::new();
        for branch in repo.branches(Some(BranchType::Remote))? {
            let (branch, _) = branch?;
            if let Some(name) = branch.name()? {
                if let Some(short) = name.strip_prefix(&prefix) {
                    if short != "HEAD" {
                        names.push(short.to_string());
                    }
                }
            }
        }
        Ok(names)
    }

    async fn has_local_changes(&self) -> MgitResult<bool> {
        let repo = self.repo()?;
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true);
        let statuses = repo.statuses(Some(&mut options))?;
        Ok(!statuses.is_empty())
    }

    async fn is_behind(&self, remote: &str, branch: &str) -> MgitResult<bool> {
        self.fetch(remote).await?;
        let (_, behind) = self.compare_with_upstream(remote, branch)?;
        Ok(behind > 0)
    }

    async fn is_ahead(&self, remote: &str, branch: &str) -> MgitResult<bool> {
        self.fetch(remote).await?;
        let (ahead, _) = self.compare_with_upstream(remote, branch)?;
        Ok(ahead > 0)
    }

    async fn run(&self, args: GitArgs) -> MgitResult<String> {
        self.runner.run(&args).await
    }

    async fn run_shell(&self, command: &str) -> MgitResult<String> {
        self.runner.run_shell(command).await
    }
}
