// ABOUTME: Pluggable credential persistence keyed by (user, vendor)
// ABOUTME: Ships an in-memory store; database-backed stores live behind the host storage layer

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use partsbin_core::VendorId;

use crate::credential::Credential;
use crate::error::AuthResult;

/// Credential persistence for vendor integrations
///
/// `put` must be atomic with respect to concurrent `get`s for the same key:
/// a reader never observes a partially written credential.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, user_id: &str, vendor: VendorId) -> AuthResult<Option<Credential>>;

    async fn put(&self, credential: &Credential) -> AuthResult<()>;

    async fn delete(&self, user_id: &str, vendor: VendorId) -> AuthResult<()>;
}

/// In-memory credential store
///
/// Used by tests and as the default when the host application does not wire
/// a database-backed store. The `RwLock` makes each put atomic per key.
#[derive(Default)]
pub struct MemoryCredentialStore {
    credentials: RwLock<HashMap<(String, VendorId), Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, user_id: &str, vendor: VendorId) -> AuthResult<Option<Credential>> {
        let credentials = self.credentials.read().await;
        Ok(credentials.get(&(user_id.to_string(), vendor)).cloned())
    }

    async fn put(&self, credential: &Credential) -> AuthResult<()> {
        debug!(
            "Storing credential for user {} vendor {}",
            credential.user_id, credential.vendor
        );
        let mut credentials = self.credentials.write().await;
        credentials.insert(
            (credential.user_id.clone(), credential.vendor),
            credential.clone(),
        );
        Ok(())
    }

    async fn delete(&self, user_id: &str, vendor: VendorId) -> AuthResult<()> {
        debug!("Deleting credential for user {} vendor {}", user_id, vendor);
        let mut credentials = self.credentials.write().await;
        credentials.remove(&(user_id.to_string(), vendor));
        Ok(())
    }
}
