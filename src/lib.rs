//! # mgit - batch git operations across a workspace
//!
//! `mgit` applies one git command (pull, push, commit, checkout, reset,
//! clean, log, diff, status, or an arbitrary shell command) uniformly across
//! a *workspace*: a directory whose immediate subdirectories are
//! independently cloned repositories. A subset of repositories is selected
//! by criteria, the command runs against each selected repository
//! concurrently, and every repository reports its own result block - one
//! repository's failure never aborts the batch.
//!
//! ## Quick Start
//!
//! ```bash
//! # status of every repository in the workspace
//! mgit --all status
//!
//! # pull the repositories with local changes, rebasing where required
//! mgit --only-local pull --rebase
//!
//! # push two specific repositories
//! mgit --packages api web push
//! ```
//!
//! ## Architecture
//!
//! The crate is organized using clean architecture principles:
//!
//! - [`domain`]: workspace scanning, selection criteria, typed command
//!   requests
//! - [`application`]: the per-repository synchronization policy and the
//!   parallel dispatcher
//! - [`infrastructure`]: git metadata queries, the git subprocess boundary,
//!   workspace settings
//! - [`presentation`]: CLI interface and result reporting
//! - [`common`]: shared error and result types
//!
//! ## Synchronization policy
//!
//! The decision engine in
//! [`application::services::sync_policy::SyncPolicy`] owns the
//! conflict-avoidance protocol: uncommitted changes are stashed around
//! mutating operations and restored on every exit path, a rebase that fails
//! is aborted and the previous branch restored, and ahead/behind state
//! decides whether a push or pull is allowed to proceed at all.
//!
//! ## Error Handling
//!
//! - [`common::error::MgitError`]: error taxonomy separating validation
//!   failures from git command failures
//! - [`common::result::MgitResult`]: crate-wide result alias

#![deny(rustdoc::broken_intra_doc_links)]

pub mod application;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

// Re-export commonly used types for convenience
pub use crate::common::error::MgitError;
pub use crate::common::result::MgitResult as Result;
