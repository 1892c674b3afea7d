pub mod run_command;

pub use run_command::{BatchSummary, PackageReport, RunCommandConfig, RunCommandUseCase};
