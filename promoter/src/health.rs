//! Health executor: runs health checks in order and folds their verdicts.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::cancel::Cancellation;
use crate::core::health_state::HealthState;
use crate::core::types::{Criteria, Health, State};
use crate::directive::{Collaborators, ContextBuilder, Registry};

/// Runs health checks through checkers resolved from a [`Registry`].
#[derive(Debug, Clone)]
pub struct HealthExecutor {
    registry: Arc<Registry>,
    collaborators: Collaborators,
}

impl HealthExecutor {
    pub fn new(registry: Arc<Registry>, collaborators: Collaborators) -> Self {
        Self {
            registry,
            collaborators,
        }
    }

    /// Run `criteria` for `project`/`stage` and aggregate the results.
    ///
    /// Cancellation is polled before each check; once observed the verdict
    /// becomes at least `Unknown` and no further checks start. A kind with no
    /// registered checker contributes `Unknown` and the run continues.
    #[instrument(skip_all, fields(%project, %stage, checks = criteria.len()))]
    pub async fn check_health(
        &self,
        cancel: &Cancellation,
        project: &str,
        stage: &str,
        criteria: &[Criteria],
    ) -> Health {
        let builder = ContextBuilder::new(&self.collaborators, "");
        let mut status = HealthState::default();
        let mut issues = Vec::new();
        let mut outputs: Vec<State> = Vec::new();

        for (index, criterion) in criteria.iter().enumerate() {
            if let Some(cause) = cancel.cause() {
                warn!(check = index, %cause, "health checks canceled");
                status = status.merge(HealthState::Unknown);
                issues.push(cause.to_string());
                break;
            }

            let Some((checker, permissions)) = self.registry.health_checker(&criterion.kind)
            else {
                warn!(check = index, kind = %criterion.kind, "unknown health check kind");
                status = status.merge(HealthState::Unknown);
                issues.push(format!(
                    "no health checker registered for health check kind {:?}",
                    criterion.kind
                ));
                continue;
            };

            let scoped = Criteria {
                project: project.to_string(),
                stage: stage.to_string(),
                ..criterion.clone()
            };
            let ctx = builder.health_check(permissions, &scoped);
            let result = checker.check(cancel, &ctx).await;
            debug!(
                check = index,
                kind = %criterion.kind,
                status = %result.status,
                issues = result.issues.len(),
                "health check finished"
            );

            status = status.merge(result.status);
            issues.extend(result.issues);
            if let Some(output) = result.output {
                outputs.push(output);
            }
        }

        let output = if outputs.is_empty() {
            None
        } else {
            match serde_json::to_value(&outputs) {
                Ok(value) => Some(value),
                Err(err) => {
                    issues.push(format!("failed to encode health check output: {err}"));
                    None
                }
            }
        };

        info!(%status, issues = issues.len(), "health checks aggregated");
        Health {
            status,
            issues,
            output,
        }
    }
}
