use tracing::{debug, warn};

use crate::common::error::MgitError;
use crate::common::result::MgitResult;
use crate::domain::value_objects::command_request::{
    BashOptions, CheckoutOptions, CleanOptions, CommandRequest, CommitOptions, DiffOptions,
    LogOptions, PullOptions, PushOptions, ResetOptions, DEFAULT_LOG_FORMAT,
};
use crate::domain::value_objects::head_state::HeadState;
use crate::domain::value_objects::remote_branch::RemoteBranchRef;
use crate::infrastructure::git::backend::GitBackend;
use crate::infrastructure::process::git_runner::GitArgs;

/// Per-repository synchronization decision engine.
///
/// One policy instance executes one command against one repository. The
/// policy decides when a stash wrap is needed, when a rebase is mandatory or
/// forbidden, how a failed rebase is rolled back, and how ahead/behind state
/// gates push and pull. All git access goes through the [`GitBackend`] the
/// policy is constructed with.
pub struct SyncPolicy<B> {
    backend: B,
}

impl<B: GitBackend> SyncPolicy<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run one command to completion, producing the repository's result text.
    pub async fn execute(&self, request: &CommandRequest) -> MgitResult<String> {
        debug!(command = request.kind(), "executing command");
        match request {
            CommandRequest::Log(options) => self.log(options).await,
            CommandRequest::Status => self.status().await,
            CommandRequest::Diff(options) => self.diff(options).await,
            CommandRequest::Pull(options) => self.pull(options).await,
            CommandRequest::Push(options) => self.push(options).await,
            CommandRequest::Commit(options) => self.commit(options).await,
            CommandRequest::Checkout(options) => self.checkout(options).await,
            CommandRequest::Clean(options) => self.clean(options).await,
            CommandRequest::Reset(options) => self.reset(options).await,
            CommandRequest::Bash(options) => self.bash(options).await,
        }
    }

    async fn log(&self, options: &LogOptions) -> MgitResult<String> {
        let mut args = GitArgs::new("log").arg("-n").arg(options.max_count.to_string());
        args = match &options.pretty {
            Some(fmt) => args.arg(format!("--pretty={}", fmt)),
            None if options.oneline => args.arg("--oneline"),
            None => args.arg(format!("--pretty={}", DEFAULT_LOG_FORMAT)),
        };
        args = args.arg_opt(options.target.as_ref().map(RemoteBranchRef::qualified));
        self.backend.run(args).await
    }

    async fn status(&self) -> MgitResult<String> {
        self.backend.run(GitArgs::new("status")).await
    }

    async fn diff(&self, options: &DiffOptions) -> MgitResult<String> {
        let args = GitArgs::new("diff")
            .arg(format!("--color={}", options.color))
            .arg_opt(options.target.as_ref().map(RemoteBranchRef::qualified));
        let text = self.backend.run(args).await?;
        Ok(or_default(text, "No differences"))
    }

    async fn pull(&self, options: &PullOptions) -> MgitResult<String> {
        let (remote, branch) = self.resolve_target(options.target.as_ref()).await?;
        self.assert_remote_branch(Some(&remote), &branch).await?;

        if !self.backend.is_behind(&remote, &branch).await? {
            return Ok("Already up-to-date.".to_string());
        }

        let current = self.current_branch_name().await?;
        if branch == current {
            let stashed = self.stash_if_dirty().await?;
            let outcome = self
                .backend
                .run(GitArgs::new("pull").arg(&remote).arg(&branch))
                .await;
            self.finish_stash(stashed, outcome).await
        } else if !options.rebase {
            // Pulling a branch other than the checked-out one would merge
            // across branches; only a rebase is allowed to integrate it.
            Err(MgitError::validation(
                "Merge is not allowed. You need to use --rebase to pull",
            ))
        } else {
            self.rebase_onto(&remote, &branch).await
        }
    }

    async fn push(&self, options: &PushOptions) -> MgitResult<String> {
        let (remote, branch) = self.resolve_target(options.target.as_ref()).await?;

        if options.force {
            self.backend
                .run(GitArgs::new("push").arg("--force").arg(&remote).arg(&branch))
                .await?;
            return Ok("Push --force completed".to_string());
        }

        self.assert_remote(&remote).await?;
        let known = self.backend.remote_branches(&remote).await?;
        if !known.iter().any(|b| b == &branch) {
            self.backend
                .run(
                    GitArgs::new("push")
                        .arg("--set-upstream")
                        .arg(&remote)
                        .arg(&branch),
                )
                .await?;
            return Ok("Push completed (New Branch)".to_string());
        }

        if !self.backend.is_ahead(&remote, &branch).await? {
            return Ok("Nothing to commit".to_string());
        }

        if self.backend.is_behind(&remote, &branch).await? {
            if !options.rebase {
                return Err(MgitError::validation(
                    "Merge is not allowed. You need to use --rebase to push",
                ));
            }
            self.rebase_onto(&remote, &branch).await?;
        }

        self.backend
            .run(GitArgs::new("push").arg(&remote).arg(&branch))
            .await?;
        Ok("Push completed".to_string())
    }

    /// Rebase HEAD onto `remote/branch`, restoring the pre-rebase branch when
    /// the rebase fails.
    ///
    /// Invariant: after this returns, the repository is never mid-rebase. A
    /// command failure triggers `rebase --abort` plus a checkout of the
    /// branch that was current before the attempt, and the original failure
    /// is returned.
    async fn rebase_onto(&self, remote: &str, branch: &str) -> MgitResult<String> {
        let previous = self.current_branch_name().await?;
        let target = format!("{}/{}", remote, branch);

        let stashed = self.stash_if_dirty().await?;
        let outcome = match self.backend.run(GitArgs::new("rebase").arg(&target)).await {
            Ok(text) => Ok(or_default(text, format!("Rebase onto {} completed", target))),
            Err(error) => {
                warn!(%target, "rebase failed, rolling back");
                if let Err(abort_error) = self
                    .backend
                    .run(GitArgs::new("rebase").arg("--abort"))
                    .await
                {
                    warn!(error = %abort_error, "rebase --abort failed");
                }
                if let Err(checkout_error) = self
                    .backend
                    .run(GitArgs::new("checkout").arg(&previous))
                    .await
                {
                    warn!(error = %checkout_error, branch = %previous, "failed to restore branch");
                }
                Err(error)
            }
        };
        self.finish_stash(stashed, outcome).await
    }

    async fn commit(&self, options: &CommitOptions) -> MgitResult<String> {
        if options.message.trim().is_empty() {
            return Err(MgitError::validation("Commit message must not be empty"));
        }
        if !self.backend.has_local_changes().await? {
            return Err(MgitError::validation("Nothing to commit"));
        }
        let args = GitArgs::new("commit")
            .arg_if(options.all, "-a")
            .arg("-m")
            .arg(&options.message);
        let text = self.backend.run(args).await?;
        Ok(or_default(text, "Commit completed"))
    }

    async fn checkout(&self, options: &CheckoutOptions) -> MgitResult<String> {
        if options.upstream {
            if options.create || options.from.is_some() {
                return Err(MgitError::validation(
                    "--upstream cannot be combined with -b or FROM",
                ));
            }
            let remote = self.backend.current_remote().await?.ok_or_else(|| {
                MgitError::validation("Repository has no remote configured")
            })?;
            self.assert_remote_branch(Some(&remote), &options.name).await?;
            let tracking = format!("{}/{}", remote, options.name);
            let text = self
                .backend
                .run(GitArgs::new("checkout").arg("--track").arg(&tracking))
                .await?;
            return Ok(or_default(
                text,
                format!("Checked out '{}' tracking '{}'", options.name, tracking),
            ));
        }

        let locals = self.backend.local_branches().await?;
        let exists = locals.iter().any(|b| b == &options.name);

        if options.create {
            if exists {
                return Err(MgitError::validation(format!(
                    "Branch '{}' already exists",
                    options.name
                )));
            }
            let args = GitArgs::new("checkout")
                .arg("-b")
                .arg(&options.name)
                .arg_opt(options.from.clone());
            let text = self.backend.run(args).await?;
            Ok(or_default(
                text,
                format!("Created and switched to branch '{}'", options.name),
            ))
        } else {
            if options.from.is_some() {
                return Err(MgitError::validation(
                    "FROM can only be used together with -b",
                ));
            }
            if !exists {
                return Err(MgitError::validation(format!(
                    "Branch '{}' does not exist",
                    options.name
                )));
            }
            let text = self
                .backend
                .run(GitArgs::new("checkout").arg(&options.name))
                .await?;
            Ok(or_default(
                text,
                format!("Switched to branch '{}'", options.name),
            ))
        }
    }

    async fn clean(&self, options: &CleanOptions) -> MgitResult<String> {
        let branch = options.target.branch();

        // Guard against deleting the branch that is checked out.
        if let HeadState::Branch(current) = self.backend.current_branch().await? {
            if current == branch {
                return Err(MgitError::validation(format!(
                    "Cannot delete the checked-out branch '{}'",
                    branch
                )));
            }
        }

        self.backend
            .run(GitArgs::new("branch").arg("-D").arg(branch))
            .await?;
        let mut lines = vec![format!("Deleted local branch '{}'", branch)];

        if let Some(remote) = options.target.remote() {
            let known = self.backend.remote_branches(remote).await?;
            if known.iter().any(|b| b == branch) {
                self.backend
                    .run(GitArgs::new("push").arg(remote).arg("--delete").arg(branch))
                    .await?;
                lines.push(format!("Deleted remote branch '{}/{}'", remote, branch));
            } else {
                lines.push(format!(
                    "Remote branch '{}/{}' not found",
                    remote, branch
                ));
            }
        }
        Ok(lines.join("\n"))
    }

    async fn reset(&self, options: &ResetOptions) -> MgitResult<String> {
        if options.soft == options.hard {
            return Err(MgitError::validation(
                "Exactly one of --soft or --hard is required",
            ));
        }
        self.assert_remote_branch(options.target.remote(), options.target.branch())
            .await?;

        let mode = if options.soft { "--soft" } else { "--hard" };
        let target = options.target.qualified();

        // Unlike pull/push/rebase the stash wrap is opt-in here.
        let stashed = if options.stash {
            self.stash_if_dirty().await?
        } else {
            false
        };
        let outcome = self
            .backend
            .run(GitArgs::new("reset").arg(mode).arg(&target))
            .await
            .map(|text| or_default(text, format!("Reset {} to {}", mode, target)));
        self.finish_stash(stashed, outcome).await
    }

    async fn bash(&self, options: &BashOptions) -> MgitResult<String> {
        self.backend.run_shell(&options.command).await
    }

    /// Default an unqualified target to the repository's current remote and
    /// branch.
    async fn resolve_target(
        &self,
        target: Option<&RemoteBranchRef>,
    ) -> MgitResult<(String, String)> {
        let remote = match target.and_then(|t| t.remote()) {
            Some(remote) => remote.to_string(),
            None => self.backend.current_remote().await?.ok_or_else(|| {
                MgitError::validation("Repository has no remote configured")
            })?,
        };
        let branch = match target {
            Some(t) => t.branch().to_string(),
            None => self.current_branch_name().await?,
        };
        Ok((remote, branch))
    }

    async fn current_branch_name(&self) -> MgitResult<String> {
        match self.backend.current_branch().await? {
            HeadState::Branch(name) => Ok(name),
            HeadState::Detached => Err(MgitError::validation(
                "HEAD is detached; check out a branch first",
            )),
        }
    }

    async fn assert_remote(&self, remote: &str) -> MgitResult<()> {
        if self.backend.remotes().await?.iter().any(|r| r == remote) {
            Ok(())
        } else {
            Err(MgitError::reference(format!(
                "Remote '{}' does not exist",
                remote
            )))
        }
    }

    /// Both components of a reference must resolve before a mutating
    /// operation proceeds: the remote against the configured remotes, the
    /// branch against the remote-tracking list (or the local list when no
    /// remote is given).
    async fn assert_remote_branch(&self, remote: Option<&str>, branch: &str) -> MgitResult<()> {
        match remote {
            Some(remote) => {
                self.assert_remote(remote).await?;
                let known = self.backend.remote_branches(remote).await?;
                if known.iter().any(|b| b == branch) {
                    Ok(())
                } else {
                    Err(MgitError::reference(format!(
                        "Branch '{}' does not exist on remote '{}'",
                        branch, remote
                    )))
                }
            }
            None => {
                let known = self.backend.local_branches().await?;
                if known.iter().any(|b| b == branch) {
                    Ok(())
                } else {
                    Err(MgitError::reference(format!(
                        "Local branch '{}' does not exist",
                        branch
                    )))
                }
            }
        }
    }

    /// First half of the stash wrap: stash local changes (untracked files
    /// included) and report whether a stash was created.
    async fn stash_if_dirty(&self) -> MgitResult<bool> {
        if !self.backend.has_local_changes().await? {
            return Ok(false);
        }
        debug!("stashing local changes");
        self.backend
            .run(GitArgs::new("stash").arg("push").arg("--include-untracked"))
            .await?;
        Ok(true)
    }

    /// Second half of the stash wrap: pop the stash on every exit path of
    /// the wrapped action. A pop failure after a successful action becomes
    /// the result; a pop failure after a failed action is logged and the
    /// action's own error wins.
    async fn finish_stash(
        &self,
        stashed: bool,
        outcome: MgitResult<String>,
    ) -> MgitResult<String> {
        if !stashed {
            return outcome;
        }
        let pop = self.backend.run(GitArgs::new("stash").arg("pop")).await;
        match (outcome, pop) {
            (Ok(text), Ok(_)) => Ok(text),
            (Ok(_), Err(pop_error)) => Err(pop_error),
            (Err(error), Ok(_)) => Err(error),
            (Err(error), Err(pop_error)) => {
                warn!(error = %pop_error, "failed to restore stashed changes");
                Err(error)
            }
        }
    }
}

fn or_default(text: String, fallback: impl Into<String>) -> String {
    if text.is_empty() {
        fallback.into()
    } else {
        text
    }
}
