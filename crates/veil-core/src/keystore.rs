//! Named identity storage.
//!
//! Callers own long-lived identities; the pipeline only borrows them. The
//! store hands out `Arc<Identity>` so a loaded key can be shared across tasks
//! without copying secret material.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use veil_crypto::{Identity, PublicKey};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyStoreError {
    #[error("identity not found: {0}")]
    NotFound(String),

    #[error("identity already exists: {0}")]
    AlreadyExists(String),
}

// ============================================================================
// KeyStore Trait
// ============================================================================

#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Look up an identity by name.
    async fn identity(&self, name: &str) -> Result<Arc<Identity>, KeyStoreError>;

    /// Store `identity` under `name`. Existing names are not overwritten.
    async fn insert(&self, name: &str, identity: Identity) -> Result<PublicKey, KeyStoreError>;

    async fn remove(&self, name: &str) -> Result<(), KeyStoreError>;

    /// Stored names with their public keys, sorted by name.
    async fn list(&self) -> Vec<(String, PublicKey)>;
}

// ============================================================================
// In-Memory Implementation
// ============================================================================

#[derive(Default, Clone)]
pub struct InMemoryKeyStore {
    identities: Arc<RwLock<HashMap<String, Arc<Identity>>>>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyStore for InMemoryKeyStore {
    async fn identity(&self, name: &str) -> Result<Arc<Identity>, KeyStoreError> {
        self.identities
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| KeyStoreError::NotFound(name.to_string()))
    }

    async fn insert(&self, name: &str, identity: Identity) -> Result<PublicKey, KeyStoreError> {
        let mut identities = self.identities.write().await;
        if identities.contains_key(name) {
            return Err(KeyStoreError::AlreadyExists(name.to_string()));
        }
        let public = identity.public_key().clone();
        identities.insert(name.to_string(), Arc::new(identity));
        Ok(public)
    }

    async fn remove(&self, name: &str) -> Result<(), KeyStoreError> {
        self.identities
            .write()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| KeyStoreError::NotFound(name.to_string()))
    }

    async fn list(&self) -> Vec<(String, PublicKey)> {
        let mut entries: Vec<_> = self
            .identities
            .read()
            .await
            .iter()
            .map(|(name, id)| (name.clone(), id.public_key().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
