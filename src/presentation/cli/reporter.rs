use colored::Colorize;

use crate::application::use_cases::run_command::{BatchSummary, PackageReport};

const HEADER_RULE: &str = "############################";

/// Formats one result block per repository.
///
/// Blocks are written to stdout in completion order: a header naming the
/// package and its current tracking reference, then the result text or the
/// error in red.
pub struct Reporter;

impl Reporter {
    pub fn new() -> Self {
        Self
    }

    pub fn print(&self, report: &PackageReport) {
        println!("{}", self.format(report));
    }

    pub fn format(&self, report: &PackageReport) -> String {
        let mut block = String::new();
        block.push_str(HEADER_RULE);
        block.push('\n');
        block.push_str(&format!(
            "# {} ({})\n",
            report.package.bold(),
            report.tracking.blue()
        ));
        block.push_str(HEADER_RULE);
        block.push('\n');
        match &report.outcome {
            Ok(text) => block.push_str(text),
            Err(error) => block.push_str(&error.to_string().red().to_string()),
        }
        block.push('\n');
        block
    }

    pub fn print_summary(&self, summary: &BatchSummary) {
        println!(
            "{} {} succeeded, {} failed ({} repositories)",
            "::".blue().bold(),
            summary.succeeded,
            summary.failed,
            summary.total
        );
    }

    pub fn print_interrupted_warning(&self) {
        eprintln!(
            "{} Interrupted: in-flight repositories may be left mid-operation \
             (unfinished rebase or stash) and can require manual recovery",
            "⚠".yellow().bold()
        );
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::MgitError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_success_block() {
        colored::control::set_override(false);
        let reporter = Reporter::new();
        let report = PackageReport {
            package: "api".to_string(),
            tracking: "origin/main".to_string(),
            outcome: Ok("Already up-to-date.".to_string()),
        };
        assert_eq!(
            reporter.format(&report),
            "############################\n\
             # api (origin/main)\n\
             ############################\n\
             Already up-to-date.\n"
        );
    }

    #[test]
    fn test_format_error_block() {
        colored::control::set_override(false);
        let reporter = Reporter::new();
        let report = PackageReport {
            package: "web".to_string(),
            tracking: "origin/feature".to_string(),
            outcome: Err(MgitError::validation("Nothing to commit")),
        };
        let block = reporter.format(&report);
        assert!(block.contains("# web (origin/feature)"));
        assert!(block.contains("Validation error: Nothing to commit"));
    }

    #[test]
    fn test_format_detached_head_marker() {
        colored::control::set_override(false);
        let reporter = Reporter::new();
        let report = PackageReport {
            package: "api".to_string(),
            tracking: "(detached HEAD)".to_string(),
            outcome: Ok("ok".to_string()),
        };
        assert!(reporter.format(&report).contains("# api ((detached HEAD))"));
    }
}
