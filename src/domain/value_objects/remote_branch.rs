use std::fmt;

use crate::common::error::MgitError;
use crate::common::result::MgitResult;

/// A possibly remote-qualified branch reference, as typed on the command line.
///
/// A bare `branch` token leaves the remote unspecified; the policy layer
/// defaults it to the repository's current remote. A `remote/branch` token is
/// split at the first `/`, so a local branch whose name contains a slash must
/// be qualified explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBranchRef {
    remote: Option<String>,
    branch: String,
}

impl RemoteBranchRef {
    pub fn branch_only(branch: impl Into<String>) -> Self {
        Self {
            remote: None,
            branch: branch.into(),
        }
    }

    pub fn with_remote(remote: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            remote: Some(remote.into()),
            branch: branch.into(),
        }
    }

    /// Parse a `branch` or `remote/branch` command-line token.
    pub fn parse(token: &str) -> MgitResult<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(MgitError::validation("branch reference must not be empty"));
        }

        match token.split_once('/') {
            Some((remote, branch)) => {
                if remote.is_empty() || branch.is_empty() {
                    return Err(MgitError::validation(format!(
                        "invalid branch reference '{}': expected BRANCH or REMOTE/BRANCH",
                        token
                    )));
                }
                Ok(Self::with_remote(remote, branch))
            }
            None => Ok(Self::branch_only(token)),
        }
    }

    pub fn remote(&self) -> Option<&str> {
        self.remote.as_deref()
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// The token git expects: `remote/branch` when qualified, else `branch`.
    pub fn qualified(&self) -> String {
        match &self.remote {
            Some(remote) => format!("{}/{}", remote, self.branch),
            None => self.branch.clone(),
        }
    }
}

impl fmt::Display for RemoteBranchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_branch_only() {
        let branch_ref = RemoteBranchRef::parse("develop").unwrap();
        assert_eq!(branch_ref.remote(), None);
        assert_eq!(branch_ref.branch(), "develop");
        assert_eq!(branch_ref.qualified(), "develop");
    }

    #[test]
    fn test_parse_remote_qualified() {
        let branch_ref = RemoteBranchRef::parse("origin/main").unwrap();
        assert_eq!(branch_ref.remote(), Some("origin"));
        assert_eq!(branch_ref.branch(), "main");
        assert_eq!(branch_ref.qualified(), "origin/main");
    }

    #[test]
    fn test_parse_splits_at_first_slash() {
        let branch_ref = RemoteBranchRef::parse("origin/feature/login").unwrap();
        assert_eq!(branch_ref.remote(), Some("origin"));
        assert_eq!(branch_ref.branch(), "feature/login");
    }

    #[test]
    fn test_parse_rejects_empty_components() {
        assert!(RemoteBranchRef::parse("").is_err());
        assert!(RemoteBranchRef::parse("   ").is_err());
        assert!(RemoteBranchRef::parse("/main").is_err());
        assert!(RemoteBranchRef::parse("origin/").is_err());
    }

    #[test]
    fn test_display_matches_qualified() {
        let branch_ref = RemoteBranchRef::with_remote("upstream", "release");
        assert_eq!(branch_ref.to_string(), "upstream/release");
    }
}
