use std::any::Any;
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use indicatif::ProgressBar;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::{interval_at, Instant};
use tracing::{debug, warn};

use crate::common::error::MgitError;
use crate::common::result::MgitResult;
use crate::domain::entities::package::Package;
use crate::domain::entities::workspace::Workspace;
use crate::domain::value_objects::command_request::CommandRequest;
use crate::domain::value_objects::selection::{PackageSnapshot, SelectionCriteria};
use crate::application::services::sync_policy::SyncPolicy;
use crate::infrastructure::git::repository_handle::RepositoryHandle;

/// Result block for one repository, produced exactly once per invocation.
#[derive(Debug)]
pub struct PackageReport {
    pub package: String,
    /// `remote/branch` label at report time (a command may have moved HEAD).
    pub tracking: String,
    pub outcome: MgitResult<String>,
}

/// Aggregate counts for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub interrupted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchState {
    Idle,
    Dispatching,
    Draining,
    Done,
}

/// Dispatcher configuration: which packages to act on and how wide to fan
/// out.
#[derive(Debug, Clone)]
pub struct RunCommandConfig {
    pub criteria: SelectionCriteria,
    pub prod_branch: String,
    pub jobs: usize,
}

/// Runs the requested command once per selected repository, in parallel,
/// reporting each result as it arrives.
///
/// Tasks are independent: each exclusively owns its repository's working
/// tree for the task's duration, and every failure is converted into an
/// error report rather than propagated. Completion order is arrival order,
/// not selection order.
pub struct RunCommandUseCase {
    config: RunCommandConfig,
}

impl RunCommandUseCase {
    pub fn new(config: RunCommandConfig) -> Self {
        Self { config }
    }

    /// Execute the command across the workspace. `on_report` is invoked once
    /// per selected repository, in completion order.
    pub async fn execute<F>(
        &self,
        workspace: &Workspace,
        request: CommandRequest,
        mut on_report: F,
    ) -> MgitResult<BatchSummary>
    where
        F: FnMut(&PackageReport),
    {
        let mut state = DispatchState::Idle;
        debug!(?state, command = request.kind(), "dispatcher created");

        let selected = self.select_packages(workspace).await;
        if selected.is_empty() {
            return Err(MgitError::workspace(
                "No packages matched the selection criteria",
                Some(workspace.root().to_path_buf()),
            ));
        }

        state = DispatchState::Dispatching;
        debug!(
            ?state,
            selected = selected.len(),
            jobs = self.config.jobs,
            "submitting repository tasks"
        );

        let request = Arc::new(request);
        let semaphore = Arc::new(Semaphore::new(self.config.jobs.max(1)));
        let (tx, mut rx) = mpsc::unbounded_channel::<PackageReport>();
        let mut pending: BTreeSet<String> = selected
            .iter()
            .map(|(package, _)| package.name().to_string())
            .collect();
        let mut handles = Vec::with_capacity(selected.len());

        for (package, snapshot) in selected {
            let semaphore = Arc::clone(&semaphore);
            let request = Arc::clone(&request);
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                let report = run_single_package(&package, &snapshot, &request).await;
                // The receiver only goes away on interruption; the report is
                // then dropped along with the task.
                let _ = tx.send(report);
            }));
        }
        drop(tx);

        state = DispatchState::Draining;
        debug!(?state, pending = pending.len(), "waiting for completions");

        let mut summary = BatchSummary {
            total: pending.len(),
            ..Default::default()
        };
        let spinner = ProgressBar::new_spinner();
        let mut ticker = interval_at(
            Instant::now() + Duration::from_secs(1),
            Duration::from_secs(1),
        );

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(report) => {
                        pending.remove(&report.package);
                        match &report.outcome {
                            Ok(_) => summary.succeeded += 1,
                            Err(_) => summary.failed += 1,
                        }
                        spinner.suspend(|| on_report(&report));
                    }
                    None => break,
                },
                _ = ticker.tick() => {
                    if !pending.is_empty() {
                        let waiting =
                            pending.iter().cloned().collect::<Vec<_>>().join(", ");
                        debug!(pending = %waiting, "still running");
                        spinner.set_message(format!("waiting on: {}", waiting));
                        spinner.tick();
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    // Abandoned tasks never run their compensating rollback;
                    // interrupted repositories may need manual recovery.
                    warn!(
                        pending = pending.len(),
                        "interrupted; aborting in-flight repository tasks"
                    );
                    for handle in &handles {
                        handle.abort();
                    }
                    summary.interrupted = true;
                    break;
                }
            }
        }

        spinner.finish_and_clear();
        state = DispatchState::Done;
        debug!(?state, ?summary, "dispatch complete");
        Ok(summary)
    }

    /// Snapshot every package once and apply the selection predicate.
    /// Packages whose metadata cannot be read are skipped with a warning.
    async fn select_packages(&self, workspace: &Workspace) -> Vec<(Package, PackageSnapshot)> {
        let mut selected = Vec::new();
        for package in workspace.packages() {
            let handle = match RepositoryHandle::open(package.location()) {
                Ok(handle) => handle,
                Err(error) => {
                    warn!(package = package.name(), %error, "skipping unreadable repository");
                    continue;
                }
            };
            let snapshot = match handle.snapshot(package.name()).await {
                Ok(snapshot) => snapshot,
                Err(error) => {
                    warn!(package = package.name(), %error, "skipping unreadable repository");
                    continue;
                }
            };
            if self
                .config
                .criteria
                .matches(&snapshot, &self.config.prod_branch)
            {
                selected.push((package.clone(), snapshot));
            }
        }
        selected
    }
}

/// Execute the command in one repository, converting every failure
/// (panics included) into a report.
async fn run_single_package(
    package: &Package,
    snapshot: &PackageSnapshot,
    request: &CommandRequest,
) -> PackageReport {
    let outcome = AssertUnwindSafe(execute_in_repository(package, request))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            Err(MgitError::unexpected(format!(
                "repository task panicked: {}",
                panic_message(&panic)
            )))
        });

    let tracking = current_tracking_label(package)
        .await
        .unwrap_or_else(|| snapshot.tracking_label());

    PackageReport {
        package: package.name().to_string(),
        tracking,
        outcome,
    }
}

async fn execute_in_repository(
    package: &Package,
    request: &CommandRequest,
) -> MgitResult<String> {
    let handle = RepositoryHandle::open(package.location())?;
    let policy = SyncPolicy::new(handle);
    policy.execute(request).await
}

async fn current_tracking_label(package: &Package) -> Option<String> {
    let handle = RepositoryHandle::open(package.location()).ok()?;
    let snapshot = handle.snapshot(package.name()).await.ok()?;
    Some(snapshot.tracking_label())
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
