//! Shared data types for the promotion and health-check engines.
//!
//! Wire shapes use camelCase field names because they are persisted verbatim
//! into the owning resource's status by the reconciliation loop.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::health_state::HealthState;

/// Failure to convert an opaque [`Config`] into a typed structure.
#[derive(Debug, thiserror::Error)]
#[error("decode config: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// Opaque, JSON-shaped step configuration.
///
/// Runners receive a deep copy; [`Config::decode`] converts it into the
/// runner's own typed structure through a serialize/deserialize round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config(Map<String, Value>);

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Independent copy; nothing reachable from the copy aliases `self`.
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// Decode into `T` via a JSON round trip.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        let encoded = serde_json::to_vec(&self.0)?;
        Ok(serde_json::from_slice(&encoded)?)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Config {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Config {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Opaque key/value mapping.
///
/// Used for shared promotion state (keyed by step alias) and for the output
/// of individual steps and checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(Map<String, Value>);

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for State {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Config> for State {
    fn from(config: Config) -> Self {
        Self(config.into_map())
    }
}

impl FromIterator<(String, Value)> for State {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Outcome of a promotion step, and of a promotion as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromotionStatus {
    Succeeded,
    Failed,
    Errored,
    /// Incomplete; the promotion must be invoked again later to resume.
    Running,
}

impl PromotionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PromotionStatus::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PromotionStatus::Succeeded => "Succeeded",
            PromotionStatus::Failed => "Failed",
            PromotionStatus::Errored => "Errored",
            PromotionStatus::Running => "Running",
        }
    }
}

impl fmt::Display for PromotionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-step overrides of the runner's retry defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_threshold: Option<u32>,
}

impl RetryPolicy {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// One step of a user-defined promotion process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Registered runner name.
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub config: Config,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
}

impl Step {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }
}

/// A request for one health check.
///
/// `project` and `stage` are filled in by the health executor and are not part
/// of the wire shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criteria {
    pub kind: String,
    #[serde(default)]
    pub config: Config,
    #[serde(skip)]
    pub project: String,
    #[serde(skip)]
    pub stage: String,
}

impl Criteria {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }
}

/// Result of a single health check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub status: HealthState,
    /// Present only when the check produced data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<State>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

impl HealthCheckResult {
    pub fn new(status: HealthState) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// `Unknown` with a single explanatory issue.
    pub fn unknown(issue: impl Into<String>) -> Self {
        Self {
            status: HealthState::Unknown,
            output: None,
            issues: vec![issue.into()],
        }
    }

    pub fn with_output(mut self, output: State) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_issue(mut self, issue: impl Into<String>) -> Self {
        self.issues.push(issue.into());
        self
    }
}

/// Aggregated verdict of a health-check run, persisted verbatim to status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status: HealthState,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
    /// Ordered outputs of the checks that produced any, as a JSON array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
}

/// Result returned by a promotion step runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionStepResult {
    pub status: PromotionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub output: State,
    /// Health check to run against the stage after the promotion completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<Criteria>,
}

impl PromotionStepResult {
    pub fn new(status: PromotionStatus) -> Self {
        Self {
            status,
            message: None,
            output: State::new(),
            health_check: None,
        }
    }

    pub fn succeeded() -> Self {
        Self::new(PromotionStatus::Succeeded)
    }

    pub fn running(message: impl Into<String>) -> Self {
        Self::new(PromotionStatus::Running).with_message(message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_output(mut self, output: State) -> Self {
        self.output = output;
        self
    }

    pub fn with_health_check(mut self, criteria: Criteria) -> Self {
        self.health_check = Some(criteria);
        self
    }
}

/// Bookkeeping for one step, carried across promotion invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepExecutionMetadata {
    pub alias: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Consecutive failed/errored attempts.
    #[serde(default)]
    pub error_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PromotionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Everything the promotion executor needs besides the steps themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionContext {
    pub project: String,
    pub stage: String,
    /// Name of the promotion being executed.
    pub promotion: String,
    /// Working directory for the steps; prepared by the engine when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
    /// Shared state left by previous invocations.
    #[serde(default)]
    pub state: State,
    /// Index of the step to resume at.
    #[serde(default)]
    pub start_from_step: usize,
    #[serde(default)]
    pub step_execution_metadata: Vec<StepExecutionMetadata>,
    /// Freight references handed read-only to every step.
    #[serde(default)]
    pub freight: Vec<State>,
}

impl PromotionContext {
    pub fn new(
        project: impl Into<String>,
        stage: impl Into<String>,
        promotion: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            stage: stage.into(),
            promotion: promotion.into(),
            ..Self::default()
        }
    }

    /// Carry the bookkeeping of a previous result into the next invocation.
    pub fn resume_from(mut self, previous: &PromotionResult) -> Self {
        self.state = previous.state.clone();
        self.start_from_step = previous.current_step;
        self.step_execution_metadata = previous.step_execution_metadata.clone();
        self
    }
}

/// Aggregate result of one promotion invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionResult {
    pub status: PromotionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Index of the step to resume at on the next invocation.
    pub current_step: usize,
    pub state: State,
    pub step_execution_metadata: Vec<StepExecutionMetadata>,
    /// Health checks collected from successful steps, in step order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub health_checks: Vec<Criteria>,
}
