// src/secret/store.rs
use std::collections::BTreeMap;
use std::io;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use uuid::Uuid;

use super::{ObjectKey, Secret};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("secret {0} not found")]
    NotFound(ObjectKey),

    #[error("secret {0} already exists")]
    AlreadyExists(ObjectKey),

    /// The secret changed since the caller read it.
    #[error("secret {key} was modified: expected resource version {expected}, found {found}")]
    Conflict {
        key: ObjectKey,
        expected: u64,
        found: u64,
    },

    #[error("invalid secret key {0}")]
    InvalidKey(ObjectKey),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode secret: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Persistence for secrets.
///
/// `create` never overwrites and `update` never creates. `update` is a
/// compare-and-swap on `metadata.resource_version`: it fails with
/// [`StoreError::Conflict`] unless the caller holds the current version.
pub trait SecretStore: Send + Sync {
    fn get(&self, key: &ObjectKey) -> Result<Secret, StoreError>;
    fn create(&self, secret: &Secret) -> Result<Secret, StoreError>;
    fn update(&self, secret: &Secret) -> Result<Secret, StoreError>;
}

/// In-process store, mostly useful for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: Mutex<BTreeMap<ObjectKey, Secret>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored secrets.
    pub fn len(&self) -> usize {
        self.secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, key: &ObjectKey) -> Result<Secret, StoreError> {
        let secrets = self.secrets.lock().unwrap_or_else(PoisonError::into_inner);
        secrets
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    fn create(&self, secret: &Secret) -> Result<Secret, StoreError> {
        let key = secret.key();
        let mut secrets = self.secrets.lock().unwrap_or_else(PoisonError::into_inner);
        if secrets.contains_key(&key) {
            return Err(StoreError::AlreadyExists(key));
        }

        let mut stored = secret.clone();
        stored.metadata.uid = Uuid::new_v4().to_string();
        stored.metadata.resource_version = 1;
        secrets.insert(key, stored.clone());
        Ok(stored)
    }

    fn update(&self, secret: &Secret) -> Result<Secret, StoreError> {
        let key = secret.key();
        let mut secrets = self.secrets.lock().unwrap_or_else(PoisonError::into_inner);
        let current = secrets
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;

        if current.metadata.resource_version != secret.metadata.resource_version {
            return Err(StoreError::Conflict {
                key,
                expected: secret.metadata.resource_version,
                found: current.metadata.resource_version,
            });
        }

        let mut stored = secret.clone();
        stored.metadata.uid = current.metadata.uid.clone();
        stored.metadata.resource_version = current.metadata.resource_version + 1;
        *current = stored.clone();
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(name: &str) -> Secret {
        Secret::new(&ObjectKey::new("default", name)).with_data("value", "payload")
    }

    #[test]
    fn test_create_assigns_uid_and_refuses_overwrite() {
        let store = MemorySecretStore::new();
        let created = store.create(&secret("demo-kubeconfig")).unwrap();
        assert!(!created.metadata.uid.is_empty());
        assert_eq!(created.metadata.resource_version, 1);

        let err = store.create(&secret("demo-kubeconfig")).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_requires_existing_secret() {
        let store = MemorySecretStore::new();
        let err = store.update(&secret("demo-kubeconfig")).unwrap_err();
        assert!(err.is_not_found());
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_rejects_stale_resource_version() {
        let store = MemorySecretStore::new();
        let created = store.create(&secret("demo-kubeconfig")).unwrap();

        let mut first = created.clone();
        first.data.insert("value".to_string(), b"first".to_vec());
        let updated = store.update(&first).unwrap();
        assert_eq!(updated.metadata.resource_version, 2);
        assert_eq!(updated.metadata.uid, created.metadata.uid);

        let mut second = created;
        second.data.insert("value".to_string(), b"second".to_vec());
        let err = store.update(&second).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Conflict {
                expected: 1,
                found: 2,
                ..
            }
        ));

        let stored = store.get(&ObjectKey::new("default", "demo-kubeconfig")).unwrap();
        assert_eq!(stored.data["value"], b"first".to_vec());
    }
}
