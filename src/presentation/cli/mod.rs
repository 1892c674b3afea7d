pub mod reporter;

use std::env;
use std::path::PathBuf;
use std::process::exit;

use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::application::use_cases::run_command::{
    RunCommandConfig, RunCommandUseCase,
};
use crate::domain::entities::workspace::Workspace;
use crate::domain::value_objects::command_request::{
    BashOptions, CheckoutOptions, CleanOptions, CommandRequest, CommitOptions, DiffOptions,
    LogOptions, PullOptions, PushOptions, ResetOptions,
};
use crate::domain::value_objects::remote_branch::RemoteBranchRef;
use crate::domain::value_objects::selection::SelectionCriteria;
use crate::infrastructure::filesystem::settings::WorkspaceSettings;
use crate::presentation::cli::reporter::Reporter;

/// Version string including build metadata stamped by the build script.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_DATE"),
    ")"
);

/// mgit - run one git command across every repository in a workspace
#[derive(Parser)]
#[command(name = "mgit")]
#[command(about = "Run one git command across every repository in a workspace")]
#[command(version, long_version = LONG_VERSION)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Workspace folder (defaults to the current directory)
    #[arg(long, value_name = "DIR", env = "MGIT_WS", global = true)]
    pub ws: Option<PathBuf>,

    /// Use all packages
    #[arg(long = "all", global = true)]
    pub all_packages: bool,

    /// Only use packages with local changes
    #[arg(long = "only-local", global = true)]
    pub only_local: bool,

    /// Only use packages not on the production branch
    #[arg(long = "no-prod", global = true)]
    pub no_prod: bool,

    /// Package to use (repeatable)
    #[arg(short, long = "packages", value_name = "NAME", global = true)]
    pub packages: Vec<String>,

    /// Number of parallel jobs (0 = one per CPU; default: one at a time)
    #[arg(short, long, env = "MGIT_JOBS", global = true)]
    pub jobs: Option<usize>,

    /// Production tracking reference, e.g. origin/main
    #[arg(long, value_name = "REF", env = "MGIT_PROD_BRANCH", global = true)]
    pub prod_branch: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the commit log of each repository
    Log {
        /// Maximum number of commits to show
        #[arg(short = 'n', long = "max-count", default_value_t = 5)]
        max_count: usize,

        /// Show one line per commit
        #[arg(long)]
        oneline: bool,

        /// Pretty format passed through to git
        #[arg(long, value_name = "FMT")]
        pretty: Option<String>,

        /// Branch to log, as BRANCH or REMOTE/BRANCH
        #[arg(value_name = "TARGET")]
        target: Option<String>,
    },

    /// Show the working tree status of each repository
    Status,

    /// Show uncommitted changes of each repository
    Diff {
        /// Color mode passed through to git
        #[arg(long, value_name = "MODE", default_value = "always")]
        color: String,

        /// Branch to diff against, as BRANCH or REMOTE/BRANCH
        #[arg(value_name = "TARGET")]
        target: Option<String>,
    },

    /// Bring each repository up to date with its remote branch
    Pull {
        /// Allow integrating by rebase when a merge is not possible
        #[arg(long)]
        rebase: bool,

        /// Branch to pull, as BRANCH or REMOTE/BRANCH
        #[arg(value_name = "TARGET")]
        target: Option<String>,
    },

    /// Push each repository to its remote branch
    Push {
        /// Rebase onto the remote branch first when behind
        #[arg(long)]
        rebase: bool,

        /// Push unconditionally, bypassing ahead/behind checks
        #[arg(long)]
        force: bool,

        /// Branch to push, as BRANCH or REMOTE/BRANCH
        #[arg(value_name = "TARGET")]
        target: Option<String>,
    },

    /// Commit local changes in each repository
    Commit {
        /// Stage modified and deleted files before committing
        #[arg(short = 'a')]
        all: bool,

        /// Commit message
        #[arg(required = true, num_args = 1.., value_name = "MESSAGE")]
        message: Vec<String>,
    },

    /// Switch each repository to a branch
    Checkout {
        /// Create the branch
        #[arg(short = 'b')]
        create: bool,

        /// Check out a branch tracking the current remote's branch of the
        /// same name
        #[arg(long)]
        upstream: bool,

        /// Branch name
        #[arg(value_name = "NAME")]
        name: String,

        /// Base branch when creating
        #[arg(value_name = "FROM")]
        from: Option<String>,
    },

    /// Delete a branch locally and, when qualified, on the remote
    Clean {
        /// Branch to delete, as BRANCH or REMOTE/BRANCH
        #[arg(value_name = "TARGET")]
        target: String,
    },

    /// Reset each repository to a branch
    Reset {
        /// Keep the index and working tree
        #[arg(long)]
        soft: bool,

        /// Discard the index and working tree
        #[arg(long)]
        hard: bool,

        /// Stash local changes around the reset and restore them afterwards
        #[arg(long)]
        stash: bool,

        /// Branch to reset to, as BRANCH or REMOTE/BRANCH
        #[arg(value_name = "TARGET")]
        target: String,
    },

    /// Run a shell command in each repository
    Bash {
        /// Command line to run
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true, value_name = "CMD")]
        command: Vec<String>,
    },
}

impl Commands {
    /// Convert the parsed subcommand into the typed request shared by all
    /// repository tasks.
    pub fn to_request(&self) -> anyhow::Result<CommandRequest> {
        let request = match self {
            Commands::Log {
                max_count,
                oneline,
                pretty,
                target,
            } => CommandRequest::Log(LogOptions {
                max_count: *max_count,
                oneline: *oneline,
                pretty: pretty.clone(),
                target: parse_target(target)?,
            }),
            Commands::Status => CommandRequest::Status,
            Commands::Diff { color, target } => CommandRequest::Diff(DiffOptions {
                color: color.clone(),
                target: parse_target(target)?,
            }),
            Commands::Pull { rebase, target } => CommandRequest::Pull(PullOptions {
                rebase: *rebase,
                target: parse_target(target)?,
            }),
            Commands::Push {
                rebase,
                force,
                target,
            } => CommandRequest::Push(PushOptions {
                rebase: *rebase,
                force: *force,
                target: parse_target(target)?,
            }),
            Commands::Commit { all, message } => CommandRequest::Commit(CommitOptions {
                all: *all,
                message: message.join(" "),
            }),
            Commands::Checkout {
                create,
                upstream,
                name,
                from,
            } => CommandRequest::Checkout(CheckoutOptions {
                create: *create,
                upstream: *upstream,
                name: name.clone(),
                from: from.clone(),
            }),
            Commands::Clean { target } => CommandRequest::Clean(CleanOptions {
                target: RemoteBranchRef::parse(target)?,
            }),
            Commands::Reset {
                soft,
                hard,
                stash,
                target,
            } => CommandRequest::Reset(ResetOptions {
                soft: *soft,
                hard: *hard,
                stash: *stash,
                target: RemoteBranchRef::parse(target)?,
            }),
            Commands::Bash { command } => CommandRequest::Bash(BashOptions {
                command: command.join(" "),
            }),
        };
        Ok(request)
    }
}

fn parse_target(target: &Option<String>) -> anyhow::Result<Option<RemoteBranchRef>> {
    match target {
        Some(token) => Ok(Some(RemoteBranchRef::parse(token)?)),
        None => Ok(None),
    }
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
}

impl CliApp {
    pub fn new() -> Self {
        Self { cli: Cli::parse() }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        if self.cli.no_color {
            colored::control::set_override(false);
        }

        match self.handle_command().await {
            Ok(()) => Ok(()),
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                exit(1);
            }
        }
    }

    async fn handle_command(&self) -> anyhow::Result<()> {
        let root = match &self.cli.ws {
            Some(dir) => dir.clone(),
            None => env::current_dir()?,
        };
        let workspace = Workspace::scan(&root)?;
        let settings = WorkspaceSettings::load(workspace.root())?;

        let prod_branch = self
            .cli
            .prod_branch
            .clone()
            .unwrap_or_else(|| settings.prod_branch.clone());
        let jobs = settings.effective_jobs(self.cli.jobs);
        let criteria = SelectionCriteria::new(
            self.cli.all_packages,
            self.cli.only_local,
            self.cli.no_prod,
            self.cli.packages.iter().cloned(),
        );
        let request = self.cli.command.to_request()?;

        let reporter = Reporter::new();
        let use_case = RunCommandUseCase::new(RunCommandConfig {
            criteria,
            prod_branch,
            jobs,
        });

        let summary = use_case
            .execute(&workspace, request, |report| reporter.print(report))
            .await?;

        if summary.interrupted {
            reporter.print_interrupted_warning();
        }
        if self.cli.verbose {
            reporter.print_summary(&summary);
        }
        Ok(())
    }
}

impl Default for CliApp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_pull_with_target_and_rebase() {
        let cli = parse(&["mgit", "--all", "pull", "--rebase", "origin/main"]);
        assert!(cli.all_packages);
        let request = cli.command.to_request().unwrap();
        assert_eq!(
            request,
            CommandRequest::Pull(PullOptions {
                rebase: true,
                target: Some(RemoteBranchRef::with_remote("origin", "main")),
            })
        );
    }

    #[test]
    fn test_commit_message_words_are_joined() {
        let cli = parse(&["mgit", "commit", "-a", "fix:", "handle", "spaces"]);
        let request = cli.command.to_request().unwrap();
        assert_eq!(
            request,
            CommandRequest::Commit(CommitOptions {
                all: true,
                message: "fix: handle spaces".to_string(),
            })
        );
    }

    #[test]
    fn test_log_defaults() {
        let cli = parse(&["mgit", "log"]);
        let request = cli.command.to_request().unwrap();
        assert_eq!(request, CommandRequest::Log(LogOptions::default()));
    }

    #[test]
    fn test_selection_flags_are_global() {
        let cli = parse(&["mgit", "status", "--packages", "api", "--packages", "web"]);
        assert_eq!(cli.packages, vec!["api".to_string(), "web".to_string()]);
    }

    #[test]
    fn test_packages_flag_does_not_swallow_the_subcommand() {
        let cli = parse(&["mgit", "--packages", "web", "status"]);
        assert_eq!(cli.packages, vec!["web".to_string()]);
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn test_reset_parses_modes_and_target() {
        let cli = parse(&["mgit", "reset", "--hard", "--stash", "origin/main"]);
        let request = cli.command.to_request().unwrap();
        assert_eq!(
            request,
            CommandRequest::Reset(ResetOptions {
                soft: false,
                hard: true,
                stash: true,
                target: RemoteBranchRef::with_remote("origin", "main"),
            })
        );
    }

    #[test]
    fn test_bash_keeps_hyphenated_tokens() {
        let cli = parse(&["mgit", "bash", "ls", "-la"]);
        let request = cli.command.to_request().unwrap();
        assert_eq!(
            request,
            CommandRequest::Bash(BashOptions {
                command: "ls -la".to_string(),
            })
        );
    }

    #[test]
    fn test_commit_requires_a_message() {
        assert!(Cli::try_parse_from(["mgit", "commit"]).is_err());
    }

    #[test]
    fn test_invalid_target_is_rejected() {
        let cli = parse(&["mgit", "clean", "origin/"]);
        assert!(cli.command.to_request().is_err());
    }
}
