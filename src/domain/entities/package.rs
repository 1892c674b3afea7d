use std::path::{Path, PathBuf};

/// One version-controlled project directory inside the workspace.
///
/// A package is valid only while its location contains git metadata; the set
/// of packages is discovered once at workspace-scan time and stays fixed for
/// the invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    name: String,
    location: PathBuf,
}

impl Package {
    /// Build a package from its on-disk location. Returns `None` when the
    /// directory carries no git metadata or has no usable name.
    pub fn discover(location: impl Into<PathBuf>) -> Option<Self> {
        let location = location.into();
        if !Self::is_git_repository(&location) {
            return None;
        }
        let name = location.file_name()?.to_str()?.to_string();
        Some(Self { name, location })
    }

    pub fn is_git_repository(path: &Path) -> bool {
        path.is_dir() && path.join(".git").exists()
    }

    /// Last path segment of the location.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &Path {
        &self.location
    }
}
