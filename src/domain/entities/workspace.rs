use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::common::error::MgitError;
use crate::common::result::MgitResult;
use crate::domain::entities::package::Package;

/// A directory whose immediate subdirectories are independently cloned
/// repositories.
///
/// The package set is scanned once and is immutable for the life of the
/// invocation.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    packages: Vec<Package>,
}

impl Workspace {
    /// Scan `root` for packages: every immediate subdirectory containing a
    /// `.git` entry, in name order.
    pub fn scan(root: impl Into<PathBuf>) -> MgitResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(MgitError::workspace(
                format!("workspace root '{}' is not a directory", root.display()),
                Some(root),
            ));
        }

        let mut packages = Vec::new();
        for entry in WalkDir::new(&root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                MgitError::workspace(
                    format!("failed to scan workspace: {}", e),
                    Some(root.clone()),
                )
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if let Some(package) = Package::discover(entry.path()) {
                packages.push(package);
            }
        }

        debug!(
            root = %root.display(),
            packages = packages.len(),
            "workspace scan complete"
        );
        Ok(Self { root, packages })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name() == name)
    }
}
