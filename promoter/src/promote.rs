//! Promotion executor: runs an ordered list of steps against one shared state.
//!
//! One call to [`PromotionExecutor::promote`] is one invocation. A step that
//! reports `Running`, or that fails while still under its error threshold,
//! ends the invocation with an overall `Running` result; the caller re-invokes
//! later with [`PromotionContext::resume_from`] to continue at the same step.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::cancel::{CancelCause, Cancellation};
use crate::core::alias::{resolve_alias, validate_steps};
use crate::core::retry::{
    AttemptVerdict, effective_error_threshold, effective_timeout, record_attempt,
    remaining_budget,
};
use crate::core::types::{
    Criteria, PromotionContext, PromotionResult, PromotionStatus, PromotionStepResult, State,
    Step, StepExecutionMetadata,
};
use crate::directive::{
    Collaborators, ContextBuilder, PromotionStepContext, PromotionStepRunner, Registry,
};
use crate::io::config::{EngineConfig, PromotionConfig};
use crate::io::workdir::prepare_work_dir;

/// Engine-level reasons a promotion (or one attempt of a step) did not succeed.
///
/// Rendered into the `message` of the structured result; never returned to
/// the caller as an `Err`.
#[derive(Debug, thiserror::Error)]
pub enum PromotionError {
    #[error("invalid promotion steps: {}", .0.join("; "))]
    Invalid(Vec<String>),
    #[error("start step {start} is out of range for {steps} steps")]
    StartOutOfRange { start: usize, steps: usize },
    #[error("step {alias:?}: no promotion step runner registered for step kind {kind:?}")]
    UnknownKind { alias: String, kind: String },
    #[error("step {alias:?} errored: {message}")]
    Runner { alias: String, message: String },
    #[error("step {alias:?} timed out after {timeout:?}")]
    Timeout { alias: String, timeout: Duration },
    #[error("promotion canceled: {0}")]
    Canceled(CancelCause),
    #[error("prepare working directory: {0}")]
    WorkDir(String),
}

impl PromotionError {
    /// Status the failed attempt is recorded with.
    fn attempt_status(&self) -> PromotionStatus {
        match self {
            PromotionError::Timeout { .. } => PromotionStatus::Failed,
            _ => PromotionStatus::Errored,
        }
    }
}

/// Runs promotion steps through runners resolved from a [`Registry`].
#[derive(Debug, Clone)]
pub struct PromotionExecutor {
    registry: Arc<Registry>,
    collaborators: Collaborators,
    ui_base_url: String,
    workdir_root: PathBuf,
    defaults: PromotionConfig,
}

impl PromotionExecutor {
    pub fn new(registry: Arc<Registry>, collaborators: Collaborators, config: &EngineConfig) -> Self {
        Self {
            registry,
            collaborators,
            ui_base_url: config.ui_base_url.clone(),
            workdir_root: config.workdir_root(),
            defaults: config.promotion.clone(),
        }
    }

    /// Execute `steps` starting at `promo.start_from_step`.
    ///
    /// Always yields a structured result. `current_step` in the result is the
    /// index to resume at: the step that suspended or failed, or
    /// `steps.len()` once every step succeeded. `health_checks` holds the
    /// checks requested by steps that succeeded during this invocation.
    #[instrument(
        skip_all,
        fields(
            project = %promo.project,
            stage = %promo.stage,
            promotion = %promo.promotion,
            steps = steps.len(),
            start = promo.start_from_step,
        )
    )]
    pub async fn promote(
        &self,
        cancel: &Cancellation,
        promo: PromotionContext,
        steps: &[Step],
    ) -> PromotionResult {
        let start = promo.start_from_step;
        let mut run = Run {
            state: promo.state.clone(),
            metadata: normalize_metadata(promo.step_execution_metadata.clone(), steps),
            health_checks: Vec::new(),
        };

        let problems = validate_steps(steps);
        if !problems.is_empty() {
            warn!(problems = problems.len(), "rejecting invalid promotion steps");
            return run.fail(PromotionStatus::Errored, start, PromotionError::Invalid(problems));
        }
        if start > steps.len() {
            return run.fail(
                PromotionStatus::Errored,
                start,
                PromotionError::StartOutOfRange {
                    start,
                    steps: steps.len(),
                },
            );
        }

        // Resolve every remaining kind up front so a misconfigured list fails
        // before any step has side effects.
        let mut runners = Vec::with_capacity(steps.len() - start);
        for (index, step) in steps.iter().enumerate().skip(start) {
            let Some(resolved) = self.registry.promotion_step_runner(&step.kind) else {
                let err = PromotionError::UnknownKind {
                    alias: run.metadata[index].alias.clone(),
                    kind: step.kind.clone(),
                };
                warn!(step = index, kind = %step.kind, "unknown promotion step kind");
                let meta = &mut run.metadata[index];
                meta.status = Some(PromotionStatus::Errored);
                meta.message = Some(err.to_string());
                meta.finished_at = Some(Utc::now());
                return run.fail(PromotionStatus::Errored, index, err);
            };
            runners.push(resolved);
        }

        let work_dir = match self.work_dir(&promo) {
            Ok(dir) => dir,
            Err(err) => {
                warn!(error = %err, "working directory unavailable");
                return run.fail(PromotionStatus::Errored, start, err);
            }
        };

        info!(work_dir = %work_dir.display(), "promotion started");
        let builder = ContextBuilder::new(&self.collaborators, &self.ui_base_url);

        for ((index, step), (runner, permissions)) in
            steps.iter().enumerate().skip(start).zip(runners)
        {
            if let Some(cause) = cancel.cause() {
                warn!(step = index, %cause, "promotion canceled before step");
                return run.fail(PromotionStatus::Errored, index, PromotionError::Canceled(cause));
            }

            let alias = run.metadata[index].alias.clone();
            let timeout = effective_timeout(
                step.retry.as_ref(),
                runner.default_timeout(),
                self.defaults.default_step_timeout(),
            );
            let threshold = effective_error_threshold(
                step.retry.as_ref(),
                runner.default_error_threshold(),
                self.defaults.default_error_threshold,
            );

            let now = Utc::now();
            let started_at = *run.metadata[index].started_at.get_or_insert(now);
            let elapsed = (now - started_at).to_std().unwrap_or_default();

            let ctx =
                builder.promotion_step(permissions, &promo, &work_dir, step, &alias, &run.state);
            debug!(
                step = index,
                %alias,
                kind = %step.kind,
                timeout_secs = timeout.map(|t| t.as_secs()),
                threshold,
                "running promotion step"
            );
            let attempt = invoke(runner.as_ref(), cancel, &ctx, timeout, elapsed).await;

            let (status, message, result) = match attempt {
                Ok(result) => (result.status, result.message.clone(), Some(result)),
                Err(err) => (err.attempt_status(), Some(err.to_string()), None),
            };

            let meta = &mut run.metadata[index];
            // A step that gave up because the run was cancelled is not charged
            // against its error threshold.
            if status != PromotionStatus::Succeeded
                && let Some(cause) = cancel.cause()
            {
                warn!(step = index, %alias, %cause, "promotion canceled during step");
                let err = PromotionError::Canceled(cause);
                meta.status = Some(PromotionStatus::Errored);
                meta.message = Some(err.to_string());
                meta.finished_at = Some(Utc::now());
                return run.fail(PromotionStatus::Errored, index, err);
            }

            let verdict = record_attempt(meta, status, threshold);
            meta.message.clone_from(&message);

            match verdict {
                AttemptVerdict::Advance => {
                    meta.finished_at = Some(Utc::now());
                    if let Some(result) = result {
                        run.absorb(&alias, result);
                    }
                    debug!(step = index, %alias, "promotion step succeeded");
                }
                AttemptVerdict::Suspend => {
                    info!(step = index, %alias, "promotion step still running");
                    return run.finish(PromotionStatus::Running, index, message);
                }
                AttemptVerdict::Retry {
                    error_count,
                    threshold,
                } => {
                    // A retried attempt gets a fresh timeout window.
                    meta.started_at = None;
                    warn!(
                        step = index,
                        %alias,
                        %status,
                        error_count,
                        threshold,
                        "promotion step failed; will retry"
                    );
                    let message = format!(
                        "step {alias:?} {status} (attempt {error_count} of {threshold}); will retry: {}",
                        message.as_deref().unwrap_or("no message")
                    );
                    return run.finish(PromotionStatus::Running, index, Some(message));
                }
                AttemptVerdict::Abort {
                    status,
                    error_count,
                    threshold,
                } => {
                    meta.finished_at = Some(Utc::now());
                    warn!(
                        step = index,
                        %alias,
                        %status,
                        error_count,
                        threshold,
                        "promotion step exhausted its error threshold"
                    );
                    return run.finish(status, index, message);
                }
            }
        }

        info!("promotion succeeded");
        run.finish(PromotionStatus::Succeeded, steps.len(), None)
    }

    fn work_dir(&self, promo: &PromotionContext) -> Result<PathBuf, PromotionError> {
        if let Some(dir) = &promo.work_dir {
            return Ok(dir.clone());
        }
        prepare_work_dir(&self.workdir_root, &promo.project, &promo.promotion)
            .map_err(|err| PromotionError::WorkDir(format!("{err:#}")))
    }
}

/// Invoke the runner once, bounded by what is left of `timeout`.
async fn invoke(
    runner: &dyn PromotionStepRunner,
    cancel: &Cancellation,
    ctx: &PromotionStepContext,
    timeout: Option<Duration>,
    elapsed: Duration,
) -> Result<PromotionStepResult, PromotionError> {
    let runner_error = |err: anyhow::Error| PromotionError::Runner {
        alias: ctx.alias.clone(),
        message: format!("{err:#}"),
    };
    let Some(timeout) = timeout else {
        return runner.run_promotion_step(cancel, ctx).await.map_err(runner_error);
    };
    let timed_out = || PromotionError::Timeout {
        alias: ctx.alias.clone(),
        timeout,
    };
    // A step that suspended earlier keeps its original start time.
    let remaining = remaining_budget(timeout, elapsed).ok_or_else(&timed_out)?;
    match tokio::time::timeout(remaining, runner.run_promotion_step(cancel, ctx)).await {
        Ok(result) => result.map_err(runner_error),
        Err(_) => Err(timed_out()),
    }
}

/// Keep prior metadata for steps whose alias is unchanged; start fresh otherwise.
fn normalize_metadata(
    previous: Vec<StepExecutionMetadata>,
    steps: &[Step],
) -> Vec<StepExecutionMetadata> {
    let mut previous = previous.into_iter();
    steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let alias = resolve_alias(step, index);
            match previous.next() {
                Some(meta) if meta.alias == alias => meta,
                _ => StepExecutionMetadata {
                    alias,
                    ..StepExecutionMetadata::default()
                },
            }
        })
        .collect()
}

/// Mutable bookkeeping of one invocation.
struct Run {
    state: State,
    metadata: Vec<StepExecutionMetadata>,
    health_checks: Vec<Criteria>,
}

impl Run {
    fn absorb(&mut self, alias: &str, result: PromotionStepResult) {
        self.state.insert(alias, result.output.into_value());
        if let Some(criteria) = result.health_check {
            self.health_checks.push(criteria);
        }
    }

    fn fail(self, status: PromotionStatus, current_step: usize, err: PromotionError) -> PromotionResult {
        self.finish(status, current_step, Some(err.to_string()))
    }

    fn finish(
        self,
        status: PromotionStatus,
        current_step: usize,
        message: Option<String>,
    ) -> PromotionResult {
        PromotionResult {
            status,
            message,
            current_step,
            state: self.state,
            step_execution_metadata: self.metadata,
            health_checks: self.health_checks,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::types::{Config, RetryPolicy};
    use crate::directive::builtin::COMPOSE_OUTPUT;
    use crate::directive::{Registration, Runner};
    use crate::test_support::{MockStepRunner, ScriptedAttempt, config};

    fn executor(registry: Registry, root: &std::path::Path) -> PromotionExecutor {
        let config = EngineConfig {
            workdir_root: Some(root.to_path_buf()),
            ..EngineConfig::default()
        };
        PromotionExecutor::new(Arc::new(registry), Collaborators::default(), &config)
    }

    fn promo() -> PromotionContext {
        PromotionContext::new("payments", "prod", "prod.01")
    }

    #[tokio::test]
    async fn runs_every_step_and_merges_output_under_alias() {
        let temp = tempfile::tempdir().expect("tempdir");
        let exec = executor(Registry::with_builtins(), temp.path());
        let steps = vec![
            Step::new(COMPOSE_OUTPUT)
                .with_alias("compose")
                .with_config(config(json!({"image": "app:1"}))),
            Step::new(COMPOSE_OUTPUT).with_config(config(json!({"tag": "v1"}))),
        ];

        let result = exec.promote(&Cancellation::new(), promo(), &steps).await;

        assert_eq!(result.status, PromotionStatus::Succeeded);
        assert_eq!(result.current_step, 2);
        assert_eq!(result.state.get("compose"), Some(&json!({"image": "app:1"})));
        assert_eq!(result.state.get("step-1"), Some(&json!({"tag": "v1"})));
        assert!(
            result
                .step_execution_metadata
                .iter()
                .all(|meta| meta.status == Some(PromotionStatus::Succeeded)
                    && meta.finished_at.is_some())
        );
        assert!(temp.path().join("payments").join("prod.01").is_dir());
    }

    #[tokio::test]
    async fn later_steps_see_earlier_output() {
        let temp = tempfile::tempdir().expect("tempdir");
        let marker = MockStepRunner::succeeding();
        let mut registry = Registry::with_builtins();
        registry.register("marker", Runner::promotion_step(marker.clone()));
        let exec = executor(registry, temp.path());
        let steps = vec![
            Step::new(COMPOSE_OUTPUT)
                .with_alias("first")
                .with_config(config(json!({"commit": "abc"}))),
            Step::new("marker"),
        ];

        let result = exec.promote(&Cancellation::new(), promo(), &steps).await;

        assert_eq!(result.status, PromotionStatus::Succeeded);
        let seen = marker.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].alias, "step-1");
        assert_eq!(
            seen[0].shared_state.get("first"),
            Some(&json!({"commit": "abc"}))
        );
    }

    #[tokio::test]
    async fn unknown_kind_halts_the_run() {
        let temp = tempfile::tempdir().expect("tempdir");
        let after = MockStepRunner::succeeding();
        let mut registry = Registry::new();
        registry.register("after", Runner::promotion_step(after.clone()));
        let exec = executor(registry, temp.path());
        let steps = vec![Step::new("does-not-exist"), Step::new("after")];

        let result = exec.promote(&Cancellation::new(), promo(), &steps).await;

        assert_eq!(result.status, PromotionStatus::Errored);
        assert_eq!(result.current_step, 0);
        let message = result.message.expect("message");
        assert!(message.contains("does-not-exist"), "{message}");
        assert_eq!(after.calls(), 0);
        assert_eq!(
            result.step_execution_metadata[0].status,
            Some(PromotionStatus::Errored)
        );
        assert_eq!(result.step_execution_metadata[0].error_count, 0);
    }

    #[tokio::test]
    async fn health_checker_is_not_runnable_as_a_step() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut registry = Registry::new();
        registry.register(
            "argocd",
            Runner::health_check(crate::test_support::MockChecker::healthy()),
        );
        let exec = executor(registry, temp.path());

        let result = exec
            .promote(&Cancellation::new(), promo(), &[Step::new("argocd")])
            .await;

        assert_eq!(result.status, PromotionStatus::Errored);
    }

    #[tokio::test]
    async fn invalid_steps_never_run() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = MockStepRunner::succeeding();
        let mut registry = Registry::new();
        registry.register("mock", Runner::promotion_step(runner.clone()));
        let exec = executor(registry, temp.path());
        let steps = vec![Step::new("mock"), Step::new("mock").with_alias("step-2")];

        let result = exec.promote(&Cancellation::new(), promo(), &steps).await;

        assert_eq!(result.status, PromotionStatus::Errored);
        assert!(result.message.expect("message").contains("step-2"));
        assert_eq!(runner.calls(), 0);
    }

    #[tokio::test]
    async fn running_suspends_without_running_later_steps() {
        let temp = tempfile::tempdir().expect("tempdir");
        let waiting = MockStepRunner::scripted(vec![ScriptedAttempt::Result(
            PromotionStepResult::running("waiting for merge"),
        )]);
        let after = MockStepRunner::succeeding();
        let mut registry = Registry::new();
        registry.register("wait", Runner::promotion_step(waiting));
        registry.register("after", Runner::promotion_step(after.clone()));
        let exec = executor(registry, temp.path());
        let steps = vec![Step::new("wait"), Step::new("after")];

        let result = exec.promote(&Cancellation::new(), promo(), &steps).await;

        assert_eq!(result.status, PromotionStatus::Running);
        assert_eq!(result.current_step, 0);
        assert_eq!(result.message.as_deref(), Some("waiting for merge"));
        assert!(result.step_execution_metadata[0].started_at.is_some());
        assert_eq!(after.calls(), 0);
    }

    #[tokio::test]
    async fn failure_below_threshold_retries_then_fails() {
        let temp = tempfile::tempdir().expect("tempdir");
        let flaky = MockStepRunner::scripted(vec![
            ScriptedAttempt::Error("connection reset".to_string()),
            ScriptedAttempt::Error("connection reset".to_string()),
        ]);
        let mut registry = Registry::new();
        registry.register("flaky", Runner::promotion_step(flaky.clone()));
        let exec = executor(registry, temp.path());
        let steps = vec![Step::new("flaky").with_retry(RetryPolicy {
            timeout_secs: None,
            error_threshold: Some(2),
        })];

        let first = exec.promote(&Cancellation::new(), promo(), &steps).await;
        assert_eq!(first.status, PromotionStatus::Running);
        assert_eq!(first.step_execution_metadata[0].error_count, 1);
        assert!(first.step_execution_metadata[0].started_at.is_none());
        assert!(
            first
                .message
                .as_deref()
                .expect("message")
                .contains("connection reset")
        );

        let second = exec
            .promote(&Cancellation::new(), promo().resume_from(&first), &steps)
            .await;
        assert_eq!(second.status, PromotionStatus::Errored);
        assert_eq!(second.current_step, 0);
        assert_eq!(second.step_execution_metadata[0].error_count, 2);
        assert_eq!(flaky.calls(), 2);
    }

    #[tokio::test]
    async fn timeout_counts_as_failure() {
        let temp = tempfile::tempdir().expect("tempdir");
        let slow = MockStepRunner::scripted(vec![ScriptedAttempt::Sleep(Duration::from_secs(30))]);
        let mut registry = Registry::new();
        registry.register(
            "slow",
            Registration::new(Runner::promotion_step(slow.with_default_timeout(
                Duration::from_millis(20),
            ))),
        );
        let exec = executor(registry, temp.path());

        let result = exec
            .promote(&Cancellation::new(), promo(), &[Step::new("slow")])
            .await;

        assert_eq!(result.status, PromotionStatus::Failed);
        assert!(result.message.expect("message").contains("timed out"));
        assert_eq!(result.step_execution_metadata[0].error_count, 1);
    }

    #[tokio::test]
    async fn cancellation_stops_before_next_step() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cancel = Cancellation::new();
        let canceller = MockStepRunner::scripted(vec![ScriptedAttempt::CancelThenSucceed]);
        let after = MockStepRunner::succeeding();
        let mut registry = Registry::new();
        registry.register("cancel", Runner::promotion_step(canceller));
        registry.register("after", Runner::promotion_step(after.clone()));
        let exec = executor(registry, temp.path());
        let steps = vec![Step::new("cancel"), Step::new("after")];

        let result = exec.promote(&cancel, promo(), &steps).await;

        assert_eq!(result.status, PromotionStatus::Errored);
        assert_eq!(result.current_step, 1);
        assert!(result.message.expect("message").contains("context canceled"));
        assert_eq!(after.calls(), 0);
    }

    #[tokio::test]
    async fn step_giving_up_on_cancellation_is_not_retried() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cancel = Cancellation::new();
        cancel.cancel_after(Duration::from_millis(20));
        let waiter = MockStepRunner::scripted(vec![ScriptedAttempt::AwaitCancel]);
        let mut registry = Registry::new();
        registry.register("wait", Runner::promotion_step(waiter.clone()));
        let exec = executor(registry, temp.path());
        let steps = vec![Step::new("wait").with_retry(RetryPolicy {
            timeout_secs: None,
            error_threshold: Some(3),
        })];

        let result = exec.promote(&cancel, promo(), &steps).await;

        assert_eq!(result.status, PromotionStatus::Errored);
        assert_eq!(result.current_step, 0);
        let message = result.message.expect("message");
        assert!(message.contains("context deadline exceeded"), "{message}");
        let meta = &result.step_execution_metadata[0];
        assert_eq!(meta.status, Some(PromotionStatus::Errored));
        assert_eq!(meta.error_count, 0);
        assert_eq!(waiter.calls(), 1);
    }

    #[tokio::test]
    async fn unknown_kind_later_in_the_list_runs_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let first = MockStepRunner::succeeding();
        let mut registry = Registry::with_builtins();
        registry.register("first", Runner::promotion_step(first.clone()));
        let exec = executor(registry, temp.path());
        let steps = vec![
            Step::new("first"),
            Step::new(COMPOSE_OUTPUT)
                .with_alias("vars")
                .with_config(config(json!({"image": "app:1"}))),
            Step::new("nonexistent"),
        ];

        let result = exec.promote(&Cancellation::new(), promo(), &steps).await;

        assert_eq!(result.status, PromotionStatus::Errored);
        assert_eq!(result.current_step, 2);
        assert!(result.message.expect("message").contains("nonexistent"));
        assert_eq!(first.calls(), 0);
        assert!(result.state.is_empty());
        assert_eq!(result.step_execution_metadata[0].status, None);
        assert_eq!(
            result.step_execution_metadata[2].status,
            Some(PromotionStatus::Errored)
        );
        assert!(!temp.path().join("payments").exists());
    }

    #[tokio::test]
    async fn resumes_at_start_step() {
        let temp = tempfile::tempdir().expect("tempdir");
        let first = MockStepRunner::succeeding();
        let second = MockStepRunner::succeeding();
        let mut registry = Registry::new();
        registry.register("first", Runner::promotion_step(first.clone()));
        registry.register("second", Runner::promotion_step(second.clone()));
        let exec = executor(registry, temp.path());
        let mut ctx = promo();
        ctx.start_from_step = 1;

        let result = exec
            .promote(
                &Cancellation::new(),
                ctx,
                &[Step::new("first"), Step::new("second")],
            )
            .await;

        assert_eq!(result.status, PromotionStatus::Succeeded);
        assert_eq!(first.calls(), 0);
        assert_eq!(second.calls(), 1);
    }

    #[tokio::test]
    async fn start_beyond_steps_is_errored() {
        let temp = tempfile::tempdir().expect("tempdir");
        let exec = executor(Registry::with_builtins(), temp.path());
        let mut ctx = promo();
        ctx.start_from_step = 5;

        let result = exec
            .promote(&Cancellation::new(), ctx, &[Step::new(COMPOSE_OUTPUT)])
            .await;

        assert_eq!(result.status, PromotionStatus::Errored);
        assert!(result.message.expect("message").contains("out of range"));
    }

    #[tokio::test]
    async fn collects_health_checks_from_successful_steps() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = MockStepRunner::scripted(vec![ScriptedAttempt::Result(
            PromotionStepResult::succeeded().with_health_check(
                Criteria::new("argocd").with_config(Config::from_iter([(
                    "app".to_string(),
                    json!("payments"),
                )])),
            ),
        )]);
        let mut registry = Registry::new();
        registry.register("sync", Runner::promotion_step(runner));
        let exec = executor(registry, temp.path());

        let result = exec
            .promote(&Cancellation::new(), promo(), &[Step::new("sync")])
            .await;

        assert_eq!(result.status, PromotionStatus::Succeeded);
        assert_eq!(result.health_checks.len(), 1);
        assert_eq!(result.health_checks[0].kind, "argocd");
    }

    #[test]
    fn metadata_is_kept_only_for_matching_aliases() {
        let previous = vec![
            StepExecutionMetadata {
                alias: "step-0".to_string(),
                error_count: 2,
                ..StepExecutionMetadata::default()
            },
            StepExecutionMetadata {
                alias: "renamed".to_string(),
                error_count: 1,
                ..StepExecutionMetadata::default()
            },
        ];
        let steps = vec![Step::new("a"), Step::new("b"), Step::new("c")];

        let metadata = normalize_metadata(previous, &steps);

        assert_eq!(metadata.len(), 3);
        assert_eq!(metadata[0].error_count, 2);
        assert_eq!(metadata[1].alias, "step-1");
        assert_eq!(metadata[1].error_count, 0);
        assert_eq!(metadata[2].alias, "step-2");
    }
}
