//! Pluggable runner contracts.
//!
//! A runner implements one or both capabilities: executing promotion steps
//! ([`PromotionStepRunner`]) and executing health checks ([`HealthChecker`]).
//! Runners are registered by kind name in a [`Registry`] together with the
//! [`Permissions`] that decide which privileged collaborators they receive.

pub mod builtin;
pub mod context;
pub mod registry;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::cancel::Cancellation;
use crate::core::types::{HealthCheckResult, PromotionStepResult};

pub use context::{Collaborators, ContextBuilder, Grants, HealthCheckContext, PromotionStepContext};
pub use registry::{Registry, Resolved};

/// Executes one kind of promotion step.
#[async_trait]
pub trait PromotionStepRunner: Send + Sync {
    /// Run the step. Returning `Err` counts as an Errored attempt.
    ///
    /// Implementations should honor `cancel` during long-running work.
    async fn run_promotion_step(
        &self,
        cancel: &Cancellation,
        ctx: &PromotionStepContext,
    ) -> Result<PromotionStepResult>;

    /// Per-invocation timeout when the step does not override it.
    fn default_timeout(&self) -> Option<Duration> {
        None
    }

    /// Consecutive failed attempts tolerated before the promotion fails.
    /// `0` defers to the engine default.
    fn default_error_threshold(&self) -> u32 {
        0
    }
}

/// Executes one kind of health check.
#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// Run the check. Problems are reported as issues, never as errors.
    async fn check(&self, cancel: &Cancellation, ctx: &HealthCheckContext) -> HealthCheckResult;
}

/// Capability a runner is looked up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    PromotionStep,
    HealthCheck,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::PromotionStep => f.write_str("promotion step"),
            Capability::HealthCheck => f.write_str("health check"),
        }
    }
}

/// Privileged collaborators a runner may receive.
///
/// Everything defaults to denied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Permissions {
    pub allow_credentials_db: bool,
    pub allow_primary_client: bool,
    pub allow_target_client: bool,
}

impl Permissions {
    pub const NONE: Permissions = Permissions {
        allow_credentials_db: false,
        allow_primary_client: false,
        allow_target_client: false,
    };

    pub const ALL: Permissions = Permissions {
        allow_credentials_db: true,
        allow_primary_client: true,
        allow_target_client: true,
    };
}

/// A runner, narrowed to the capabilities it declares.
#[derive(Clone, Default)]
pub struct Runner {
    promotion_step: Option<Arc<dyn PromotionStepRunner>>,
    health_check: Option<Arc<dyn HealthChecker>>,
}

impl Runner {
    pub fn promotion_step<R: PromotionStepRunner + 'static>(runner: R) -> Self {
        Self {
            promotion_step: Some(Arc::new(runner)),
            health_check: None,
        }
    }

    pub fn health_check<R: HealthChecker + 'static>(checker: R) -> Self {
        Self {
            promotion_step: None,
            health_check: Some(Arc::new(checker)),
        }
    }

    /// A single instance serving both capabilities.
    pub fn dual<R: PromotionStepRunner + HealthChecker + 'static>(runner: R) -> Self {
        let shared = Arc::new(runner);
        Self {
            promotion_step: Some(shared.clone()),
            health_check: Some(shared),
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::PromotionStep => self.promotion_step.is_some(),
            Capability::HealthCheck => self.health_check.is_some(),
        }
    }

    pub(crate) fn as_promotion_step(&self) -> Option<&Arc<dyn PromotionStepRunner>> {
        self.promotion_step.as_ref()
    }

    pub(crate) fn as_health_check(&self) -> Option<&Arc<dyn HealthChecker>> {
        self.health_check.as_ref()
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("promotion_step", &self.promotion_step.is_some())
            .field("health_check", &self.health_check.is_some())
            .finish()
    }
}

/// A runner plus its declared permissions. Immutable once registered.
#[derive(Debug, Clone)]
pub struct Registration {
    pub runner: Runner,
    pub permissions: Permissions,
}

impl Registration {
    pub fn new(runner: Runner) -> Self {
        Self {
            runner,
            permissions: Permissions::NONE,
        }
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn allow_credentials_db(mut self) -> Self {
        self.permissions.allow_credentials_db = true;
        self
    }

    pub fn allow_primary_client(mut self) -> Self {
        self.permissions.allow_primary_client = true;
        self
    }

    pub fn allow_target_client(mut self) -> Self {
        self.permissions.allow_target_client = true;
        self
    }
}

impl From<Runner> for Registration {
    fn from(runner: Runner) -> Self {
        Self::new(runner)
    }
}
