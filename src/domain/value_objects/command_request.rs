use crate::domain::value_objects::remote_branch::RemoteBranchRef;

/// Default pretty format for `mgit log`, matching plain `git log --pretty`
/// one-line output with colored hash, refs, relative date and author.
pub const DEFAULT_LOG_FORMAT: &str =
    "%Cred%h%Creset -%C(yellow)%d%Creset %s %Cgreen(%cr) %C(bold blue)<%an>%Creset";

/// One git command to apply to every selected repository.
///
/// Each variant carries a typed option struct validated at the CLI boundary;
/// the request is immutable and shared read-only across repository tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandRequest {
    Log(LogOptions),
    Status,
    Diff(DiffOptions),
    Pull(PullOptions),
    Push(PushOptions),
    Commit(CommitOptions),
    Checkout(CheckoutOptions),
    Clean(CleanOptions),
    Reset(ResetOptions),
    Bash(BashOptions),
}

impl CommandRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Log(_) => "log",
            Self::Status => "status",
            Self::Diff(_) => "diff",
            Self::Pull(_) => "pull",
            Self::Push(_) => "push",
            Self::Commit(_) => "commit",
            Self::Checkout(_) => "checkout",
            Self::Clean(_) => "clean",
            Self::Reset(_) => "reset",
            Self::Bash(_) => "bash",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    pub max_count: usize,
    pub oneline: bool,
    pub pretty: Option<String>,
    pub target: Option<RemoteBranchRef>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            max_count: 5,
            oneline: false,
            pretty: None,
            target: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOptions {
    pub color: String,
    pub target: Option<RemoteBranchRef>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            color: "always".to_string(),
            target: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullOptions {
    pub rebase: bool,
    pub target: Option<RemoteBranchRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushOptions {
    pub rebase: bool,
    pub force: bool,
    pub target: Option<RemoteBranchRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOptions {
    /// Stage modified and deleted files before committing (`git commit -a`).
    pub all: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutOptions {
    /// Create the branch (`git checkout -b`).
    pub create: bool,
    /// Check out a local branch tracking the current remote's branch of the
    /// same name.
    pub upstream: bool,
    pub name: String,
    pub from: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanOptions {
    pub target: RemoteBranchRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetOptions {
    pub soft: bool,
    pub hard: bool,
    /// Stash-wrap the reset; unlike pull/push/rebase the wrap is opt-in here.
    pub stash: bool,
    pub target: RemoteBranchRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BashOptions {
    pub command: String,
}
