//! Cluster API client contract.
//!
//! The same contract serves the primary control-plane client and the
//! target delivery-tool client; which one a runner receives (if any) is decided
//! by its registration.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Minimal object access against a cluster API.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Human-readable identity of the cluster this client talks to.
    fn name(&self) -> &str;

    /// Fetch an object; `Ok(None)` when it does not exist.
    async fn get(&self, kind: &str, namespace: &str, name: &str) -> Result<Option<Value>>;

    /// Apply a JSON merge patch to an existing object.
    async fn patch(&self, kind: &str, namespace: &str, name: &str, patch: Value) -> Result<()>;
}
