use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::common::result::MgitResult;
use crate::domain::value_objects::head_state::HeadState;
use crate::infrastructure::process::git_runner::GitArgs;

/// Query and invocation surface of one repository.
///
/// The decision engine depends on this trait rather than on a concrete
/// repository so its state machines can be exercised against a mock. The
/// `run`/`run_shell` methods are the opaque subprocess boundary; everything
/// else is a local metadata query.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GitBackend: Send + Sync {
    /// Branch HEAD is on, or the detached sentinel. Never fails for a valid
    /// repository.
    async fn current_branch(&self) -> MgitResult<HeadState>;

    /// First configured remote, `None` when the repository has no remotes.
    async fn current_remote(&self) -> MgitResult<Option<String>>;

    async fn remotes(&self) -> MgitResult<Vec<String>>;

    async fn local_branches(&self) -> MgitResult<Vec<String>>;

    /// Branches known for `remote`, from the local remote-tracking refs.
    async fn remote_branches(&self, remote: &str) -> MgitResult<Vec<String>>;

    /// True iff a porcelain status listing (untracked included) is non-empty.
    async fn has_local_changes(&self) -> MgitResult<bool>;

    /// Fetch `remote`, then check whether `remote/branch` has commits missing
    /// from HEAD. The fetch runs on every call; callers must expect repeated
    /// network cost.
    async fn is_behind(&self, remote: &str, branch: &str) -> MgitResult<bool>;

    /// Fetch `remote`, then check whether HEAD has commits missing from
    /// `remote/branch`.
    async fn is_ahead(&self, remote: &str, branch: &str) -> MgitResult<bool>;

    /// Invoke the git executable in this repository.
    async fn run(&self, args: GitArgs) -> MgitResult<String>;

    /// Invoke a shell command in this repository.
    async fn run_shell(&self, command: &str) -> MgitResult<String>;
}
