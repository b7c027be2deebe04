//! Standard exit codes for CLI operations

/// General error - discovery failed or the run could not start
pub const ERROR: i32 = 1;

/// Check mode found documents that are out of date
pub const STALE_DOCS: i32 = 2;
