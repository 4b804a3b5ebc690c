//! Credential store contract.
//!
//! Only runners whose registration allows it ever receive a handle to the
//! store (see [`crate::directive::context`]).

use std::collections::HashMap;
use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Kind of external system a credential grants access to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialType {
    Git,
    Helm,
    Image,
    Generic,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Resolves credentials for a project.
#[async_trait]
pub trait CredentialsDb: Send + Sync {
    /// Look up a credential; `Ok(None)` when none is registered.
    async fn get(
        &self,
        project: &str,
        cred_type: CredentialType,
        name: &str,
    ) -> Result<Option<Credential>>;
}

/// In-memory store for tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryCredentialsDb {
    entries: HashMap<(String, CredentialType, String), Credential>,
}

impl InMemoryCredentialsDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        project: impl Into<String>,
        cred_type: CredentialType,
        name: impl Into<String>,
        credential: Credential,
    ) {
        self.entries
            .insert((project.into(), cred_type, name.into()), credential);
    }
}

#[async_trait]
impl CredentialsDb for InMemoryCredentialsDb {
    async fn get(
        &self,
        project: &str,
        cred_type: CredentialType,
        name: &str,
    ) -> Result<Option<Credential>> {
        let key = (project.to_string(), cred_type, name.to_string());
        Ok(self.entries.get(&key).cloned())
    }
}
