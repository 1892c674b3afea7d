use std::path::PathBuf;
use thiserror::Error;

/// Error taxonomy for mgit.
///
/// Per-repository failures (`Validation`, `Reference`, `Command`, `Git`,
/// `Unexpected`) are converted into error results and reported in that
/// repository's output block; they never abort the batch. Only workspace-level
/// failures (`Workspace`, `Config`) terminate the invocation.
#[derive(Error, Debug)]
pub enum MgitError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Reference error: {message}")]
    Reference { message: String },

    #[error("Command `{command}` failed: {stderr}")]
    Command {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Git operation failed: {message}")]
    Git {
        message: String,
        #[source]
        source: Option<git2::Error>,
    },

    #[error("Workspace error: {message}")]
    Workspace {
        message: String,
        path: Option<PathBuf>,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("File system operation failed: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Unexpected error: {message}")]
    Unexpected { message: String },
}

impl MgitError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn reference(message: impl Into<String>) -> Self {
        Self::Reference {
            message: message.into(),
        }
    }

    pub fn command(
        command: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::Command {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    pub fn git_error(message: impl Into<String>) -> Self {
        Self::Git {
            message: message.into(),
            source: None,
        }
    }

    pub fn git_error_with_source(message: impl Into<String>, source: git2::Error) -> Self {
        Self::Git {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn workspace(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Workspace {
            message: message.into(),
            path,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// True for errors raised by the decision engine before any git call.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Reference { .. })
    }

    /// True for failures of the underlying git executable.
    pub fn is_command(&self) -> bool {
        matches!(self, Self::Command { .. })
    }
}

impl From<git2::Error> for MgitError {
    fn from(error: git2::Error) -> Self {
        Self::git_error_with_source("git query failed", error)
    }
}

impl From<std::io::Error> for MgitError {
    fn from(error: std::io::Error) -> Self {
        Self::io("file system operation failed", error)
    }
}

impl From<serde_yaml::Error> for MgitError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::config_with_source("YAML parsing failed", error)
    }
}
