// src/secret/mod.rs
//! Secret records and the naming convention that ties them to a cluster.
//!
//! Every secret belonging to a cluster is named `<cluster>-<purpose>`, so the
//! cluster name can always be recovered from the secret name alone.

mod file;
mod store;

pub use file::FileSecretStore;
pub use store::{MemorySecretStore, SecretStore, StoreError};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Data key holding a PEM certificate in CA secrets.
pub const TLS_CRT_DATA_NAME: &str = "tls.crt";
/// Data key holding a PEM private key in CA secrets.
pub const TLS_KEY_DATA_NAME: &str = "tls.key";
/// Data key holding the serialized kubeconfig.
pub const KUBECONFIG_DATA_NAME: &str = "value";
/// Label linking a secret back to its cluster.
pub const CLUSTER_NAME_LABEL: &str = "cluster.x-k8s.io/cluster-name";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    /// Root CA, signs the API server identity.
    ClusterCa,
    /// CA trusted by the API server for client certificates.
    ClientClusterCa,
    Kubeconfig,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::ClusterCa => "ca",
            Purpose::ClientClusterCa => "cca",
            Purpose::Kubeconfig => "kubeconfig",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Purpose {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ca" => Ok(Purpose::ClusterCa),
            "cca" => Ok(Purpose::ClientClusterCa),
            "kubeconfig" => Ok(Purpose::Kubeconfig),
            other => Err(format!("unknown secret purpose {:?}", other)),
        }
    }
}

/// Namespaced name of a cluster or secret.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    /// Assigned by the store on create.
    #[serde(default)]
    pub uid: String,
    /// Bumped by the store on every write; updates must carry the current value.
    #[serde(default)]
    pub resource_version: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owner_references: Vec<OwnerReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    pub metadata: ObjectMeta,
    #[serde(default, with = "crate::utils::serde_b64::byte_map")]
    pub data: BTreeMap<String, Vec<u8>>,
}

impl Secret {
    pub fn new(key: &ObjectKey) -> Self {
        Self {
            metadata: ObjectMeta {
                name: key.name.clone(),
                namespace: key.namespace.clone(),
                ..Default::default()
            },
            data: BTreeMap::new(),
        }
    }

    pub fn with_data(mut self, key: &str, value: impl Into<Vec<u8>>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(&self.metadata.namespace, &self.metadata.name)
    }
}

/// Name of the secret with the given purpose for a cluster.
pub fn name(cluster_name: &str, purpose: Purpose) -> String {
    format!("{}-{}", cluster_name, purpose)
}

/// Splits a secret name back into its cluster name and purpose.
pub fn parse_secret_name(secret_name: &str) -> Result<(String, Purpose)> {
    let malformed = |reason: String| Error::MalformedSecretName {
        name: secret_name.to_string(),
        reason,
    };

    let (cluster_name, suffix) = secret_name
        .rsplit_once('-')
        .ok_or_else(|| malformed("expected <cluster>-<purpose>".to_string()))?;
    let purpose = suffix.parse::<Purpose>().map_err(malformed)?;
    if cluster_name.is_empty() {
        return Err(malformed("empty cluster name".to_string()));
    }

    Ok((cluster_name.to_string(), purpose))
}
