// src/secret/file.rs
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::debug;
use uuid::Uuid;

use super::store::{SecretStore, StoreError};
use super::{ObjectKey, Secret};
use crate::utils::fs::{temp_path, write_new_private};

/// Secrets stored as one JSON document per secret under
/// `<root>/<namespace>/<name>.json`.
///
/// Writes go to a temporary file first so a secret is never observed half
/// written. Version checks are serialized within one process only.
#[derive(Debug)]
pub struct FileSecretStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSecretStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &ObjectKey) -> Result<PathBuf, StoreError> {
        let valid = |part: &str| {
            !part.is_empty() && part != "." && part != ".." && !part.contains(&['/', '\\'][..])
        };
        if !valid(&key.namespace) || !valid(&key.name) {
            return Err(StoreError::InvalidKey(key.clone()));
        }
        Ok(self
            .root
            .join(&key.namespace)
            .join(format!("{}.json", key.name)))
    }

    fn read(&self, path: &Path, key: &ObjectKey) -> Result<Secret, StoreError> {
        let content = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(key.clone()),
            _ => StoreError::Io(e),
        })?;
        Ok(serde_json::from_slice(&content)?)
    }

    /// Writes the secret next to `target` and returns the temporary path.
    fn write_temp(&self, target: &Path, secret: &Secret) -> Result<PathBuf, StoreError> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp = temp_path(target);
        write_new_private(&temp, &serde_json::to_vec_pretty(secret)?)?;
        Ok(temp)
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, key: &ObjectKey) -> Result<Secret, StoreError> {
        let path = self.path_for(key)?;
        self.read(&path, key)
    }

    fn create(&self, secret: &Secret) -> Result<Secret, StoreError> {
        let key = secret.key();
        let path = self.path_for(&key)?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut stored = secret.clone();
        stored.metadata.uid = Uuid::new_v4().to_string();
        stored.metadata.resource_version = 1;

        let temp = self.write_temp(&path, &stored)?;
        // hard_link refuses to replace an existing file, which gives create-only semantics.
        let linked = fs::hard_link(&temp, &path);
        let _ = fs::remove_file(&temp);
        match linked {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists(key));
            }
            Err(e) => return Err(StoreError::Io(e)),
        }

        debug!(secret = %key, path = %path.display(), "created secret");
        Ok(stored)
    }

    fn update(&self, secret: &Secret) -> Result<Secret, StoreError> {
        let key = secret.key();
        let path = self.path_for(&key)?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.read(&path, &key)?;
        if current.metadata.resource_version != secret.metadata.resource_version {
            return Err(StoreError::Conflict {
                key,
                expected: secret.metadata.resource_version,
                found: current.metadata.resource_version,
            });
        }

        let mut stored = secret.clone();
        stored.metadata.uid = current.metadata.uid;
        stored.metadata.resource_version = current.metadata.resource_version + 1;

        let temp = self.write_temp(&path, &stored)?;
        if let Err(e) = fs::rename(&temp, &path) {
            let _ = fs::remove_file(&temp);
            return Err(StoreError::Io(e));
        }

        debug!(
            secret = %key,
            resource_version = stored.metadata.resource_version,
            "updated secret"
        );
        Ok(stored)
    }
}
