//! Stable exit codes for promoter CLI commands.

/// Promotion succeeded, health is Healthy, or the input is valid.
pub const OK: i32 = 0;
/// Invalid input files, configuration or arguments.
pub const INVALID: i32 = 1;
/// Promotion Failed or Errored, or health is Unhealthy.
pub const FAILED: i32 = 2;
/// Promotion is still Running, or health is Progressing or Unknown.
pub const PENDING: i32 = 3;
