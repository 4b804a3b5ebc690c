//! Entry points used by the reconciliation loop.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cancel::Cancellation;
use crate::core::types::{Criteria, Health, PromotionContext, PromotionResult, Step};
use crate::directive::{Collaborators, Registry};
use crate::health::HealthExecutor;
use crate::io::config::EngineConfig;
use crate::promote::PromotionExecutor;

/// Executes promotions and health checks.
///
/// Implementations never fail outright: every outcome, including invalid
/// input and cancellation, is reported through the returned structure.
#[async_trait]
pub trait Engine: Send + Sync {
    async fn promote(
        &self,
        cancel: &Cancellation,
        promo: PromotionContext,
        steps: &[Step],
    ) -> PromotionResult;

    async fn check_health(
        &self,
        cancel: &Cancellation,
        project: &str,
        stage: &str,
        criteria: &[Criteria],
    ) -> Health;
}

/// [`Engine`] running steps and checks sequentially in the caller's task.
#[derive(Debug, Clone)]
pub struct SimpleEngine {
    promotions: PromotionExecutor,
    health: HealthExecutor,
}

impl SimpleEngine {
    pub fn new(registry: Arc<Registry>, collaborators: Collaborators, config: &EngineConfig) -> Self {
        Self {
            promotions: PromotionExecutor::new(registry.clone(), collaborators.clone(), config),
            health: HealthExecutor::new(registry, collaborators),
        }
    }
}

#[async_trait]
impl Engine for SimpleEngine {
    async fn promote(
        &self,
        cancel: &Cancellation,
        promo: PromotionContext,
        steps: &[Step],
    ) -> PromotionResult {
        self.promotions.promote(cancel, promo, steps).await
    }

    async fn check_health(
        &self,
        cancel: &Cancellation,
        project: &str,
        stage: &str,
        criteria: &[Criteria],
    ) -> Health {
        self.health
            .check_health(cancel, project, stage, criteria)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::health_state::HealthState;
    use crate::core::types::PromotionStatus;
    use crate::test_support::FakeEngine;

    #[tokio::test]
    async fn fake_engine_defaults_to_success() {
        let engine: Box<dyn Engine> = Box::new(FakeEngine::default());
        let result = engine
            .promote(
                &Cancellation::new(),
                PromotionContext::new("p", "s", "promo"),
                &[Step::new("anything")],
            )
            .await;
        assert_eq!(result.status, PromotionStatus::Succeeded);

        let health = engine
            .check_health(&Cancellation::new(), "p", "s", &[Criteria::new("x")])
            .await;
        assert_eq!(health.status, HealthState::Healthy);
    }

    #[tokio::test]
    async fn fake_engine_uses_injected_behaviour() {
        let engine = FakeEngine::default().on_check_health(|_, _, criteria| Health {
            status: HealthState::Unhealthy,
            issues: vec![format!("{} checks", criteria.len())],
            output: None,
        });
        let health = engine
            .check_health(
                &Cancellation::new(),
                "p",
                "s",
                &[Criteria::new("a"), Criteria::new("b")],
            )
            .await;
        assert_eq!(health.status, HealthState::Unhealthy);
        assert_eq!(health.issues, vec!["2 checks".to_string()]);
    }

    #[tokio::test]
    async fn simple_engine_runs_builtins() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = EngineConfig {
            workdir_root: Some(temp.path().to_path_buf()),
            ..EngineConfig::default()
        };
        let engine = SimpleEngine::new(
            Arc::new(Registry::with_builtins()),
            Collaborators::default(),
            &config,
        );

        let result = engine
            .promote(
                &Cancellation::new(),
                PromotionContext::new("p", "s", "promo"),
                &[Step::new(crate::directive::builtin::COMPOSE_OUTPUT)],
            )
            .await;

        assert_eq!(result.status, PromotionStatus::Succeeded);
        assert_eq!(result.current_step, 1);
    }
}
