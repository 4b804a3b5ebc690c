//! Kind-name → runner registry.
//!
//! Built once at startup (built-ins via [`Registry::with_builtins`], plus any
//! test doubles) and then shared read-only, typically behind an `Arc`.
//! Registration needs `&mut self`, so writes cannot race with lookups.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::directive::builtin;
use crate::directive::{Capability, HealthChecker, Permissions, PromotionStepRunner, Registration};

/// A runner narrowed to the capability it was looked up for.
#[derive(Clone)]
pub enum Resolved<'a> {
    PromotionStep {
        runner: &'a Arc<dyn PromotionStepRunner>,
        permissions: Permissions,
    },
    HealthCheck {
        checker: &'a Arc<dyn HealthChecker>,
        permissions: Permissions,
    },
}

impl Resolved<'_> {
    pub fn capability(&self) -> Capability {
        match self {
            Resolved::PromotionStep { .. } => Capability::PromotionStep,
            Resolved::HealthCheck { .. } => Capability::HealthCheck,
        }
    }

    pub fn permissions(&self) -> Permissions {
        match self {
            Resolved::PromotionStep { permissions, .. }
            | Resolved::HealthCheck { permissions, .. } => *permissions,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    registrations: HashMap<String, Registration>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in runners.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register_builtins(&mut registry);
        registry
    }

    /// Insert or replace the registration for `name`. The last write wins.
    pub fn register(&mut self, name: impl Into<String>, registration: impl Into<Registration>) {
        let name = name.into();
        let registration = registration.into();
        debug!(
            kind = %name,
            promotion_step = registration.runner.supports(Capability::PromotionStep),
            health_check = registration.runner.supports(Capability::HealthCheck),
            permissions = ?registration.permissions,
            "registering runner"
        );
        self.registrations.insert(name, registration);
    }

    /// Look up `name` narrowed to `capability`.
    ///
    /// Returns `None` when nothing is registered under `name` or when the
    /// registered runner does not implement `capability`.
    pub fn lookup(&self, name: &str, capability: Capability) -> Option<Resolved<'_>> {
        let registration = self.registrations.get(name)?;
        let permissions = registration.permissions;
        match capability {
            Capability::PromotionStep => registration
                .runner
                .as_promotion_step()
                .map(|runner| Resolved::PromotionStep {
                    runner,
                    permissions,
                }),
            Capability::HealthCheck => registration
                .runner
                .as_health_check()
                .map(|checker| Resolved::HealthCheck {
                    checker,
                    permissions,
                }),
        }
    }

    pub fn promotion_step_runner(
        &self,
        name: &str,
    ) -> Option<(&Arc<dyn PromotionStepRunner>, Permissions)> {
        match self.lookup(name, Capability::PromotionStep)? {
            Resolved::PromotionStep {
                runner,
                permissions,
            } => Some((runner, permissions)),
            Resolved::HealthCheck { .. } => None,
        }
    }

    pub fn health_checker(&self, name: &str) -> Option<(&Arc<dyn HealthChecker>, Permissions)> {
        match self.lookup(name, Capability::HealthCheck)? {
            Resolved::HealthCheck {
                checker,
                permissions,
            } => Some((checker, permissions)),
            Resolved::PromotionStep { .. } => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registrations.contains_key(name)
    }

    /// Registered kind names, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.registrations.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
