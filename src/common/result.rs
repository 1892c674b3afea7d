use crate::common::error::MgitError;

/// Result alias used throughout the crate.
pub type MgitResult<T> = Result<T, MgitError>;
