//! Timeout and error-threshold policy for promotion steps.
//!
//! Precedence for both knobs: the step's own `retry` override, then the
//! runner's declared default, then the engine-wide default.

use std::time::Duration;

use crate::core::types::{PromotionStatus, RetryPolicy, StepExecutionMetadata};

/// What the promotion executor does after recording one step attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptVerdict {
    /// Step succeeded; continue with the next step.
    Advance,
    /// Step is still in progress; stop this invocation and resume later.
    Suspend,
    /// Step failed but is still under its threshold; retry on a later invocation.
    Retry { error_count: u32, threshold: u32 },
    /// Threshold reached; the promotion ends with `status`.
    Abort {
        status: PromotionStatus,
        error_count: u32,
        threshold: u32,
    },
}

/// Resolve the timeout for one invocation. `None` means unbounded.
pub fn effective_timeout(
    step: Option<&RetryPolicy>,
    runner_default: Option<Duration>,
    engine_default: Option<Duration>,
) -> Option<Duration> {
    step.and_then(RetryPolicy::timeout)
        .or(runner_default)
        .or(engine_default)
        .filter(|timeout| !timeout.is_zero())
}

/// Resolve the consecutive-failure threshold. Zero means "not declared";
/// the result is always at least 1.
pub fn effective_error_threshold(
    step: Option<&RetryPolicy>,
    runner_default: u32,
    engine_default: u32,
) -> u32 {
    step.and_then(|retry| retry.error_threshold)
        .filter(|threshold| *threshold > 0)
        .or_else(|| (runner_default > 0).then_some(runner_default))
        .unwrap_or(engine_default)
        .max(1)
}

/// Time left of `timeout` after `elapsed`, or `None` if it is used up.
pub fn remaining_budget(timeout: Duration, elapsed: Duration) -> Option<Duration> {
    timeout
        .checked_sub(elapsed)
        .filter(|remaining| !remaining.is_zero())
}

/// Record the status of one attempt into `meta` and decide what happens next.
///
/// Succeeded and Running reset the consecutive error counter; Failed and
/// Errored increment it.
pub fn record_attempt(
    meta: &mut StepExecutionMetadata,
    status: PromotionStatus,
    threshold: u32,
) -> AttemptVerdict {
    meta.status = Some(status);
    match status {
        PromotionStatus::Succeeded => {
            meta.error_count = 0;
            AttemptVerdict::Advance
        }
        PromotionStatus::Running => {
            meta.error_count = 0;
            AttemptVerdict::Suspend
        }
        PromotionStatus::Failed | PromotionStatus::Errored => {
            meta.error_count = meta.error_count.saturating_add(1);
            if meta.error_count >= threshold {
                AttemptVerdict::Abort {
                    status,
                    error_count: meta.error_count,
                    threshold,
                }
            } else {
                AttemptVerdict::Retry {
                    error_count: meta.error_count,
                    threshold,
                }
            }
        }
    }
}
