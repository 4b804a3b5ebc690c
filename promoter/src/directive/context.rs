//! Permission-scoped execution contexts.
//!
//! [`ContextBuilder`] assembles the context handed to a runner for one step or
//! check. Privileged collaborators are copied into the context's [`Grants`]
//! only when the runner's [`Permissions`] allow them; a disallowed
//! collaborator is simply absent, and runners have no way to reach the
//! ambient [`Collaborators`] themselves.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::types::{Config, Criteria, PromotionContext, State, Step};
use crate::directive::Permissions;
use crate::io::cluster::ClusterClient;
use crate::io::credentials::CredentialsDb;

/// Privileged collaborators available to the engine.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub credentials_db: Option<Arc<dyn CredentialsDb>>,
    /// Client for the control-plane API.
    pub primary_client: Option<Arc<dyn ClusterClient>>,
    /// Client for the target delivery tool's API.
    pub target_client: Option<Arc<dyn ClusterClient>>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("credentials_db", &self.credentials_db.is_some())
            .field("primary_client", &self.primary_client.is_some())
            .field("target_client", &self.target_client.is_some())
            .finish()
    }
}

/// The subset of [`Collaborators`] one runner invocation may use.
#[derive(Clone, Default)]
pub struct Grants {
    credentials_db: Option<Arc<dyn CredentialsDb>>,
    primary_client: Option<Arc<dyn ClusterClient>>,
    target_client: Option<Arc<dyn ClusterClient>>,
}

impl Grants {
    /// Keep only the collaborators `permissions` allow.
    pub fn scoped(permissions: Permissions, ambient: &Collaborators) -> Self {
        Self {
            credentials_db: ambient
                .credentials_db
                .clone()
                .filter(|_| permissions.allow_credentials_db),
            primary_client: ambient
                .primary_client
                .clone()
                .filter(|_| permissions.allow_primary_client),
            target_client: ambient
                .target_client
                .clone()
                .filter(|_| permissions.allow_target_client),
        }
    }

    pub fn credentials_db(&self) -> Option<&dyn CredentialsDb> {
        self.credentials_db.as_deref()
    }

    pub fn primary_client(&self) -> Option<&dyn ClusterClient> {
        self.primary_client.as_deref()
    }

    pub fn target_client(&self) -> Option<&dyn ClusterClient> {
        self.target_client.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials_db.is_none() && self.primary_client.is_none() && self.target_client.is_none()
    }
}

impl fmt::Debug for Grants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grants")
            .field("credentials_db", &self.credentials_db.is_some())
            .field("primary_client", &self.primary_client.is_some())
            .field("target_client", &self.target_client.is_some())
            .finish()
    }
}

/// Context for one promotion step invocation.
#[derive(Debug, Clone)]
pub struct PromotionStepContext {
    pub ui_base_url: String,
    pub work_dir: PathBuf,
    /// Deep copy of the shared state as of this step.
    pub shared_state: State,
    pub alias: String,
    /// Deep copy of the step's configuration.
    pub config: Config,
    pub project: String,
    pub stage: String,
    pub promotion: String,
    pub freight: Vec<State>,
    grants: Grants,
}

impl PromotionStepContext {
    pub fn grants(&self) -> &Grants {
        &self.grants
    }
}

/// Context for one health check invocation.
#[derive(Debug, Clone)]
pub struct HealthCheckContext {
    pub project: String,
    pub stage: String,
    /// Deep copy of the check's configuration.
    pub config: Config,
    grants: Grants,
}

impl HealthCheckContext {
    pub fn grants(&self) -> &Grants {
        &self.grants
    }
}

/// Builds per-invocation contexts from the ambient collaborators.
#[derive(Debug, Clone, Copy)]
pub struct ContextBuilder<'a> {
    collaborators: &'a Collaborators,
    ui_base_url: &'a str,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(collaborators: &'a Collaborators, ui_base_url: &'a str) -> Self {
        Self {
            collaborators,
            ui_base_url,
        }
    }

    pub fn promotion_step(
        &self,
        permissions: Permissions,
        promo: &PromotionContext,
        work_dir: &Path,
        step: &Step,
        alias: &str,
        shared_state: &State,
    ) -> PromotionStepContext {
        PromotionStepContext {
            ui_base_url: self.ui_base_url.to_string(),
            work_dir: work_dir.to_path_buf(),
            shared_state: shared_state.deep_copy(),
            alias: alias.to_string(),
            config: step.config.deep_copy(),
            project: promo.project.clone(),
            stage: promo.stage.clone(),
            promotion: promo.promotion.clone(),
            freight: promo.freight.clone(),
            grants: Grants::scoped(permissions, self.collaborators),
        }
    }

    pub fn health_check(&self, permissions: Permissions, criteria: &Criteria) -> HealthCheckContext {
        HealthCheckContext {
            project: criteria.project.clone(),
            stage: criteria.stage.clone(),
            config: criteria.config.deep_copy(),
            grants: Grants::scoped(permissions, self.collaborators),
        }
    }
}
