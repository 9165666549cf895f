// types.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::secret::{ObjectKey, OwnerReference};

pub const CLUSTER_API_VERSION: &str = "cluster.x-k8s.io/v1beta1";
pub const CLUSTER_KIND: &str = "Cluster";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for ApiEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// The cluster a kubeconfig secret belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub name: String,
    pub namespace: String,
    pub uid: String,
    pub control_plane_endpoint: ApiEndpoint,
}

impl Cluster {
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(&self.namespace, &self.name)
    }

    pub fn owner_reference(&self) -> OwnerReference {
        OwnerReference {
            api_version: CLUSTER_API_VERSION.to_string(),
            kind: CLUSTER_KIND.to_string(),
            name: self.name.clone(),
            uid: self.uid.clone(),
        }
    }
}
