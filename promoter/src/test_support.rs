//! Test doubles for runners, collaborators and the engine.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::cancel::Cancellation;
use crate::core::alias::resolve_alias;
use crate::core::health_state::HealthState;
use crate::core::types::{
    Config, Criteria, Health, HealthCheckResult, PromotionContext, PromotionResult,
    PromotionStatus, PromotionStepResult, State, Step, StepExecutionMetadata,
};
use crate::directive::{
    Grants, HealthCheckContext, HealthChecker, PromotionStepContext, PromotionStepRunner,
};
use crate::engine::Engine;
use crate::io::cluster::ClusterClient;

/// Build a [`Config`] from a JSON object literal.
pub fn config(value: Value) -> Config {
    match value {
        Value::Object(map) => Config::from(map),
        other => panic!("config must be a JSON object, got {other}"),
    }
}

/// Build a [`State`] from a JSON object literal.
pub fn state(value: Value) -> State {
    match value {
        Value::Object(map) => State::from(map),
        other => panic!("state must be a JSON object, got {other}"),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// What a [`MockStepRunner`] does on one invocation.
#[derive(Debug, Clone)]
pub enum ScriptedAttempt {
    Result(PromotionStepResult),
    /// Return `Err` with this message.
    Error(String),
    /// Sleep, then succeed.
    Sleep(Duration),
    /// Cancel the run's signal, then succeed.
    CancelThenSucceed,
    /// Wait for the run to be cancelled and fail with the cause.
    AwaitCancel,
}

/// Snapshot of a [`PromotionStepContext`] as a runner received it.
#[derive(Debug, Clone)]
pub struct SeenStepContext {
    pub alias: String,
    pub project: String,
    pub stage: String,
    pub work_dir: PathBuf,
    pub shared_state: State,
    pub config: Config,
    pub has_credentials_db: bool,
    pub has_primary_client: bool,
    pub has_target_client: bool,
}

#[derive(Debug, Default)]
struct StepScript {
    attempts: VecDeque<ScriptedAttempt>,
    fallback: Option<PromotionStatus>,
    seen: Vec<SeenStepContext>,
}

/// Promotion step runner that plays back scripted attempts.
///
/// Clones share the script and the record of received contexts. Once the
/// script is exhausted every call returns the fallback status (Succeeded
/// unless set otherwise).
#[derive(Debug, Clone, Default)]
pub struct MockStepRunner {
    script: Arc<Mutex<StepScript>>,
    default_timeout: Option<Duration>,
    default_error_threshold: u32,
}

impl MockStepRunner {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn with_status(status: PromotionStatus) -> Self {
        let runner = Self::default();
        lock(&runner.script).fallback = Some(status);
        runner
    }

    pub fn scripted(attempts: Vec<ScriptedAttempt>) -> Self {
        let runner = Self::default();
        lock(&runner.script).attempts = attempts.into();
        runner
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    pub fn with_default_error_threshold(mut self, threshold: u32) -> Self {
        self.default_error_threshold = threshold;
        self
    }

    pub fn calls(&self) -> usize {
        lock(&self.script).seen.len()
    }

    pub fn seen(&self) -> Vec<SeenStepContext> {
        lock(&self.script).seen.clone()
    }
}

#[async_trait]
impl PromotionStepRunner for MockStepRunner {
    async fn run_promotion_step(
        &self,
        cancel: &Cancellation,
        ctx: &PromotionStepContext,
    ) -> Result<PromotionStepResult> {
        let (attempt, fallback) = {
            let mut script = lock(&self.script);
            script.seen.push(SeenStepContext {
                alias: ctx.alias.clone(),
                project: ctx.project.clone(),
                stage: ctx.stage.clone(),
                work_dir: ctx.work_dir.clone(),
                shared_state: ctx.shared_state.clone(),
                config: ctx.config.clone(),
                has_credentials_db: ctx.grants().credentials_db().is_some(),
                has_primary_client: ctx.grants().primary_client().is_some(),
                has_target_client: ctx.grants().target_client().is_some(),
            });
            (
                script.attempts.pop_front(),
                script.fallback.unwrap_or(PromotionStatus::Succeeded),
            )
        };

        match attempt {
            Some(ScriptedAttempt::Result(result)) => Ok(result),
            Some(ScriptedAttempt::Error(message)) => Err(anyhow!(message)),
            Some(ScriptedAttempt::Sleep(duration)) => {
                tokio::time::sleep(duration).await;
                Ok(PromotionStepResult::succeeded())
            }
            Some(ScriptedAttempt::CancelThenSucceed) => {
                cancel.cancel();
                Ok(PromotionStepResult::succeeded())
            }
            Some(ScriptedAttempt::AwaitCancel) => {
                let cause = cancel.cancelled().await;
                Err(anyhow!("{cause}"))
            }
            None => Ok(PromotionStepResult::new(fallback)),
        }
    }

    fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout
    }

    fn default_error_threshold(&self) -> u32 {
        self.default_error_threshold
    }
}

/// Snapshot of a [`HealthCheckContext`] as a checker received it.
#[derive(Debug, Clone)]
pub struct SeenCheckContext {
    pub project: String,
    pub stage: String,
    pub config: Config,
    pub has_credentials_db: bool,
    pub has_primary_client: bool,
    pub has_target_client: bool,
}

impl SeenCheckContext {
    fn capture(ctx: &HealthCheckContext) -> Self {
        let grants: &Grants = ctx.grants();
        Self {
            project: ctx.project.clone(),
            stage: ctx.stage.clone(),
            config: ctx.config.clone(),
            has_credentials_db: grants.credentials_db().is_some(),
            has_primary_client: grants.primary_client().is_some(),
            has_target_client: grants.target_client().is_some(),
        }
    }
}

#[derive(Debug, Clone)]
enum CheckBehaviour {
    Return(HealthCheckResult),
    CancelThenWait,
}

/// Health checker returning a fixed result, or cancelling the run and
/// waiting for the signal.
#[derive(Debug, Clone)]
pub struct MockChecker {
    behaviour: CheckBehaviour,
    seen: Arc<Mutex<Vec<SeenCheckContext>>>,
}

impl MockChecker {
    pub fn returning(result: HealthCheckResult) -> Self {
        Self {
            behaviour: CheckBehaviour::Return(result),
            seen: Arc::default(),
        }
    }

    pub fn healthy() -> Self {
        Self::returning(HealthCheckResult::new(HealthState::Healthy))
    }

    /// Cancels the run, waits for the signal and reports `Unknown` with the
    /// cancellation cause.
    pub fn cancel_then_wait() -> Self {
        Self {
            behaviour: CheckBehaviour::CancelThenWait,
            seen: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        lock(&self.seen).len()
    }

    pub fn seen(&self) -> Vec<SeenCheckContext> {
        lock(&self.seen).clone()
    }
}

#[async_trait]
impl HealthChecker for MockChecker {
    async fn check(&self, cancel: &Cancellation, ctx: &HealthCheckContext) -> HealthCheckResult {
        lock(&self.seen).push(SeenCheckContext::capture(ctx));
        match &self.behaviour {
            CheckBehaviour::Return(result) => result.clone(),
            CheckBehaviour::CancelThenWait => {
                cancel.cancel();
                let cause = cancel.cancelled().await;
                HealthCheckResult::unknown(cause.to_string())
            }
        }
    }
}

/// A runner implementing both capabilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct DualRunner;

#[async_trait]
impl PromotionStepRunner for DualRunner {
    async fn run_promotion_step(
        &self,
        _cancel: &Cancellation,
        _ctx: &PromotionStepContext,
    ) -> Result<PromotionStepResult> {
        Ok(PromotionStepResult::succeeded())
    }
}

#[async_trait]
impl HealthChecker for DualRunner {
    async fn check(&self, _cancel: &Cancellation, _ctx: &HealthCheckContext) -> HealthCheckResult {
        HealthCheckResult::new(HealthState::Healthy)
    }
}

type ObjectKey = (String, String, String);

/// Cluster client over an in-memory object map. `patch` applies a JSON
/// merge patch to an existing object.
#[derive(Debug, Default)]
pub struct InMemoryClusterClient {
    name: String,
    objects: Mutex<HashMap<ObjectKey, Value>>,
}

impl InMemoryClusterClient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: Mutex::default(),
        }
    }

    pub fn insert(&self, kind: &str, namespace: &str, name: &str, object: Value) {
        lock(&self.objects).insert(key(kind, namespace, name), object);
    }
}

fn key(kind: &str, namespace: &str, name: &str) -> ObjectKey {
    (kind.to_string(), namespace.to_string(), name.to_string())
}

fn merge_patch(target: &mut Value, patch: Value) {
    let Value::Object(patch) = patch else {
        *target = patch;
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(target) = target {
        for (field, value) in patch {
            if value.is_null() {
                target.remove(&field);
            } else {
                merge_patch(target.entry(field).or_insert(Value::Null), value);
            }
        }
    }
}

#[async_trait]
impl ClusterClient for InMemoryClusterClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, kind: &str, namespace: &str, name: &str) -> Result<Option<Value>> {
        Ok(lock(&self.objects).get(&key(kind, namespace, name)).cloned())
    }

    async fn patch(&self, kind: &str, namespace: &str, name: &str, patch: Value) -> Result<()> {
        let mut objects = lock(&self.objects);
        let object = objects
            .get_mut(&key(kind, namespace, name))
            .ok_or_else(|| anyhow!("{kind} {namespace}/{name} not found"))?;
        merge_patch(object, patch);
        Ok(())
    }
}

type PromoteFn = dyn Fn(&PromotionContext, &[Step]) -> PromotionResult + Send + Sync;
type CheckHealthFn = dyn Fn(&str, &str, &[Criteria]) -> Health + Send + Sync;

/// [`Engine`] with injectable behaviour. Without overrides every promotion
/// succeeds and every health run is Healthy.
#[derive(Clone, Default)]
pub struct FakeEngine {
    promote_fn: Option<Arc<PromoteFn>>,
    check_health_fn: Option<Arc<CheckHealthFn>>,
}

impl FakeEngine {
    pub fn on_promote<F>(mut self, f: F) -> Self
    where
        F: Fn(&PromotionContext, &[Step]) -> PromotionResult + Send + Sync + 'static,
    {
        self.promote_fn = Some(Arc::new(f));
        self
    }

    pub fn on_check_health<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str, &[Criteria]) -> Health + Send + Sync + 'static,
    {
        self.check_health_fn = Some(Arc::new(f));
        self
    }
}

#[async_trait]
impl Engine for FakeEngine {
    async fn promote(
        &self,
        _cancel: &Cancellation,
        promo: PromotionContext,
        steps: &[Step],
    ) -> PromotionResult {
        if let Some(f) = &self.promote_fn {
            return f(&promo, steps);
        }
        PromotionResult {
            status: PromotionStatus::Succeeded,
            message: None,
            current_step: steps.len(),
            state: promo.state,
            step_execution_metadata: steps
                .iter()
                .enumerate()
                .map(|(index, step)| StepExecutionMetadata {
                    alias: resolve_alias(step, index),
                    status: Some(PromotionStatus::Succeeded),
                    ..StepExecutionMetadata::default()
                })
                .collect(),
            health_checks: Vec::new(),
        }
    }

    async fn check_health(
        &self,
        _cancel: &Cancellation,
        project: &str,
        stage: &str,
        criteria: &[Criteria],
    ) -> Health {
        match &self.check_health_fn {
            Some(f) => f(project, stage, criteria),
            None => Health::default(),
        }
    }
}
