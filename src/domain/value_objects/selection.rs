use std::collections::BTreeSet;

use crate::domain::value_objects::head_state::HeadState;

/// Which repositories of the workspace an invocation acts on.
///
/// Criteria combine with OR: a package is selected as soon as one enabled
/// criterion matches it. An entirely empty criteria set selects nothing,
/// which is fatal for the invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionCriteria {
    /// Select every package in the workspace.
    pub all_packages: bool,
    /// Select packages with uncommitted local changes.
    pub only_local_changes: bool,
    /// Select packages whose tracking reference differs from the configured
    /// production reference.
    pub only_non_prod: bool,
    /// Select packages by name.
    pub names: BTreeSet<String>,
}

impl SelectionCriteria {
    pub fn new(
        all_packages: bool,
        only_local_changes: bool,
        only_non_prod: bool,
        names: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            all_packages,
            only_local_changes,
            only_non_prod,
            names: names.into_iter().collect(),
        }
    }

    /// True when no criterion is enabled at all.
    pub fn is_empty(&self) -> bool {
        !self.all_packages && !self.only_local_changes && !self.only_non_prod && self.names.is_empty()
    }

    /// Pure predicate over one package snapshot.
    pub fn matches(&self, snapshot: &PackageSnapshot, prod_branch: &str) -> bool {
        if self.all_packages {
            return true;
        }
        if self.only_local_changes && snapshot.dirty {
            return true;
        }
        if !self.names.is_empty() && self.names.contains(&snapshot.name) {
            return true;
        }
        if self.only_non_prod && snapshot.tracking_label() != prod_branch {
            return true;
        }
        false
    }
}

/// Read-only view of one package, taken once at workspace-scan time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSnapshot {
    pub name: String,
    pub head: HeadState,
    pub remote: Option<String>,
    pub dirty: bool,
}

impl PackageSnapshot {
    /// The `remote/branch` label shown in report headers and compared against
    /// the production reference. Falls back to the bare branch name when no
    /// remote is configured, and to the detached-HEAD marker otherwise.
    pub fn tracking_label(&self) -> String {
        match (&self.remote, &self.head) {
            (Some(remote), HeadState::Branch(branch)) => format!("{}/{}", remote, branch),
            (None, HeadState::Branch(branch)) => branch.clone(),
            (_, HeadState::Detached) => HeadState::Detached.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(name: &str, branch: &str, dirty: bool) -> PackageSnapshot {
        PackageSnapshot {
            name: name.to_string(),
            head: HeadState::Branch(branch.to_string()),
            remote: Some("origin".to_string()),
            dirty,
        }
    }

    #[test]
    fn test_empty_criteria_match_nothing() {
        let criteria = SelectionCriteria::default();
        assert!(criteria.is_empty());
        assert!(!criteria.matches(&snapshot("api", "main", true), "origin/main"));
    }

    #[test]
    fn test_all_packages_matches_everything() {
        let criteria = SelectionCriteria::new(true, false, false, []);
        assert!(criteria.matches(&snapshot("api", "main", false), "origin/main"));
        assert!(criteria.matches(&snapshot("web", "feature", true), "origin/main"));
    }

    #[test]
    fn test_only_local_changes() {
        let criteria = SelectionCriteria::new(false, true, false, []);
        assert!(criteria.matches(&snapshot("api", "main", true), "origin/main"));
        assert!(!criteria.matches(&snapshot("api", "main", false), "origin/main"));
    }

    #[test]
    fn test_explicit_names() {
        let criteria = SelectionCriteria::new(false, false, false, ["api".to_string()]);
        assert!(criteria.matches(&snapshot("api", "main", false), "origin/main"));
        assert!(!criteria.matches(&snapshot("web", "main", false), "origin/main"));
    }

    #[test]
    fn test_non_prod_branch() {
        let criteria = SelectionCriteria::new(false, false, true, []);
        assert!(!criteria.matches(&snapshot("api", "main", false), "origin/main"));
        assert!(criteria.matches(&snapshot("api", "feature", false), "origin/main"));
    }

    #[test]
    fn test_detached_head_counts_as_non_prod() {
        let criteria = SelectionCriteria::new(false, false, true, []);
        let snapshot = PackageSnapshot {
            name: "api".to_string(),
            head: HeadState::Detached,
            remote: Some("origin".to_string()),
            dirty: false,
        };
        assert!(criteria.matches(&snapshot, "origin/main"));
    }

    // Criteria are a union, not an intersection: a package picked by name is
    // selected even when another enabled criterion does not match it.
    #[test]
    fn test_criteria_combine_with_or() {
        let criteria = SelectionCriteria::new(false, true, false, ["web".to_string()]);
        assert!(criteria.matches(&snapshot("web", "main", false), "origin/main"));
        assert!(criteria.matches(&snapshot("api", "main", true), "origin/main"));
        assert!(!criteria.matches(&snapshot("api", "main", false), "origin/main"));
    }

    #[test]
    fn test_tracking_label_without_remote() {
        let snapshot = PackageSnapshot {
            name: "api".to_string(),
            head: HeadState::Branch("main".to_string()),
            remote: None,
            dirty: false,
        };
        assert_eq!(snapshot.tracking_label(), "main");
    }
}
