use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command as TokioCommand;
use tracing::debug;

use crate::common::error::MgitError;
use crate::common::result::MgitResult;

/// Argument list for one git invocation, built token by token.
///
/// Tokens are passed to the process as discrete argv entries; nothing is ever
/// joined into a shell string, so branch names and messages need no quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitArgs {
    tokens: Vec<String>,
}

impl GitArgs {
    pub fn new(subcommand: impl AsRef<str>) -> Self {
        Self {
            tokens: vec![subcommand.as_ref().to_string()],
        }
    }

    pub fn arg(mut self, token: impl AsRef<str>) -> Self {
        self.tokens.push(token.as_ref().to_string());
        self
    }

    pub fn args<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tokens
            .extend(tokens.into_iter().map(|token| token.as_ref().to_string()));
        self
    }

    pub fn arg_if(self, condition: bool, token: impl AsRef<str>) -> Self {
        if condition {
            self.arg(token)
        } else {
            self
        }
    }

    pub fn arg_opt<S: AsRef<str>>(self, token: Option<S>) -> Self {
        match token {
            Some(token) => self.arg(token),
            None => self,
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn subcommand(&self) -> &str {
        &self.tokens[0]
    }

    /// Prefix match used by tests to assert which git calls were issued.
    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        self.tokens.len() >= prefix.len()
            && self.tokens.iter().zip(prefix).all(|(token, p)| token == p)
    }
}

impl fmt::Display for GitArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "git {}", self.tokens.join(" "))
    }
}

/// Blocking-call boundary to the git executable.
///
/// Every invocation runs in the repository's working directory with captured
/// output; a non-zero exit becomes a `Command` error carrying the executable's
/// diagnostic text. These subprocess calls are the only suspension points of a
/// repository task.
#[derive(Debug, Clone)]
pub struct GitRunner {
    workdir: PathBuf,
    program: String,
}

impl GitRunner {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            program: "git".to_string(),
        }
    }

    /// Override the executable. Used by tests to substitute a stand-in.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Run one git command, returning its output text.
    ///
    /// On success stdout is returned; when stdout is empty the stderr text is
    /// returned instead, since git reports some successful operations (pull,
    /// checkout) on stderr.
    pub async fn run(&self, args: &GitArgs) -> MgitResult<String> {
        debug!(command = %args, workdir = %self.workdir.display(), "running git command");

        let output = TokioCommand::new(&self.program)
            .args(args.tokens())
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                MgitError::command(args.to_string(), None, format!("failed to spawn: {}", e))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();

        if output.status.success() {
            Ok(if stdout.is_empty() { stderr } else { stdout })
        } else {
            let diagnostic = if stderr.is_empty() { stdout } else { stderr };
            Err(MgitError::command(
                args.to_string(),
                output.status.code(),
                diagnostic,
            ))
        }
    }

    /// Run an arbitrary shell command in the repository directory.
    pub async fn run_shell(&self, command: &str) -> MgitResult<String> {
        if command.trim().is_empty() {
            return Err(MgitError::validation("shell command must not be empty"));
        }
        debug!(command, workdir = %self.workdir.display(), "running shell command");

        let output = TokioCommand::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                MgitError::command(command.to_string(), None, format!("failed to spawn: {}", e))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();

        if output.status.success() {
            Ok(if stdout.is_empty() { stderr } else { stdout })
        } else {
            let diagnostic = if stderr.is_empty() { stdout } else { stderr };
            Err(MgitError::command(
                command.to_string(),
                output.status.code(),
                diagnostic,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_args_build_discrete_tokens() {
        let args = GitArgs::new("commit")
            .arg("-a")
            .args(["-m", "fix: handle spaces in message"]);
        assert_eq!(
            args.tokens(),
            ["commit", "-a", "-m", "fix: handle spaces in message"]
        );
        assert_eq!(args.subcommand(), "commit");
    }

    #[test]
    fn test_args_conditional_and_optional_tokens() {
        let args = GitArgs::new("log")
            .arg_if(true, "--oneline")
            .arg_if(false, "--graph")
            .arg_opt(Some("origin/main"))
            .arg_opt(None::<String>);
        assert_eq!(args.tokens(), ["log", "--oneline", "origin/main"]);
    }

    #[test]
    fn test_args_prefix_match() {
        let args = GitArgs::new("stash").arg("push").arg("--include-untracked");
        assert!(args.starts_with(&["stash", "push"]));
        assert!(!args.starts_with(&["stash", "pop"]));
        assert!(!args.starts_with(&["stash", "push", "--include-untracked", "extra"]));
    }

    #[test]
    fn test_args_display() {
        let args = GitArgs::new("pull").arg("origin").arg("main");
        assert_eq!(args.to_string(), "git pull origin main");
    }

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let temp_dir = TempDir::new().unwrap();
        let runner = GitRunner::new(temp_dir.path()).with_program("echo");
        let output = runner.run(&GitArgs::new("hello")).await.unwrap();
        assert_eq!(output, "hello");
    }

    #[tokio::test]
    async fn test_run_reports_failure_with_exit_code() {
        let temp_dir = TempDir::new().unwrap();
        let runner = GitRunner::new(temp_dir.path()).with_program("false");
        let error = runner.run(&GitArgs::new("anything")).await.unwrap_err();
        match error {
            MgitError::Command { exit_code, .. } => assert_eq!(exit_code, Some(1)),
            other => panic!("expected Command error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_shell_uses_working_directory() {
        let temp_dir = TempDir::new().unwrap();
        let runner = GitRunner::new(temp_dir.path());
        let output = runner.run_shell("pwd").await.unwrap();
        let canonical = temp_dir.path().canonicalize().unwrap();
        assert_eq!(
            PathBuf::from(output).canonicalize().unwrap(),
            canonical
        );
    }

    #[tokio::test]
    async fn test_run_shell_rejects_empty_command() {
        let temp_dir = TempDir::new().unwrap();
        let runner = GitRunner::new(temp_dir.path());
        assert!(runner.run_shell("  ").await.is_err());
    }
}
