//! Issuing admin kubeconfig secrets and regenerating them in place.
//!
//! None of these functions coordinate with each other. Two concurrent
//! rotations of the same secret are only kept apart by the store rejecting
//! the stale `update`.

use std::collections::BTreeMap;
use tracing::{debug, info};
use url::Url;

use super::codec::{cluster_entry, from_secret, write};
use super::kube;
use crate::cert::ca::{ca_certificate, certificate_authority};
use crate::error::{Error, Result};
use crate::secret::{
    self, parse_secret_name, ObjectKey, ObjectMeta, OwnerReference, Purpose, Secret, SecretStore,
    StoreError, CLUSTER_NAME_LABEL, KUBECONFIG_DATA_NAME,
};
use crate::types::Cluster;

fn get_dependent_secret(
    store: &dyn SecretStore,
    cluster: &ObjectKey,
    purpose: Purpose,
) -> Result<Secret> {
    let key = ObjectKey::new(&cluster.namespace, secret::name(&cluster.name, purpose));
    store.get(&key).map_err(|e| match e {
        StoreError::NotFound(_) => Error::DependentCertificateNotFound {
            cluster: cluster.name.clone(),
            purpose,
        },
        other => Error::Store(other),
    })
}

/// Signs a new admin identity with the cluster's client CA and returns the
/// serialized kubeconfig. `endpoint` must already be a full server URL.
pub fn generate_kubeconfig(
    store: &dyn SecretStore,
    cluster: &ObjectKey,
    endpoint: &str,
    proxy_url: Option<&str>,
) -> Result<Vec<u8>> {
    let cluster_ca = get_dependent_secret(store, cluster, Purpose::ClusterCa)?;
    let client_cluster_ca = get_dependent_secret(store, cluster, Purpose::ClientClusterCa)?;

    let client_ca = certificate_authority(&client_cluster_ca, "client CA")?;
    let server_ca_cert = ca_certificate(&cluster_ca, "cluster CA")?;
    debug!(cluster = %cluster, "decoded cluster CAs");

    let config = kube::new(
        &cluster.name,
        endpoint,
        &client_ca.cert,
        &client_ca.key,
        &server_ca_cert,
        proxy_url,
    )?;

    write(&config)
}

/// Turns a `host:port` control plane endpoint into the server URL written to
/// the kubeconfig. Endpoints that already carry a scheme are kept as is.
pub fn server_url(endpoint: &str) -> Result<String> {
    let invalid = |reason: String| Error::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let server = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    };
    let url = Url::parse(&server).map_err(|e| invalid(e.to_string()))?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    Ok(server)
}

/// Creates the kubeconfig secret for the given cluster.
pub fn create_secret(
    store: &dyn SecretStore,
    cluster: &Cluster,
    proxy_url: Option<&str>,
) -> Result<Secret> {
    create_secret_with_owner(
        store,
        &cluster.key(),
        &cluster.control_plane_endpoint.to_string(),
        cluster.owner_reference(),
        proxy_url,
    )
}

/// Creates the kubeconfig secret for the given cluster key, endpoint, owner
/// reference and proxy URL. Fails with `AlreadyExists` rather than
/// overwriting an existing secret.
pub fn create_secret_with_owner(
    store: &dyn SecretStore,
    cluster: &ObjectKey,
    endpoint: &str,
    owner: OwnerReference,
    proxy_url: Option<&str>,
) -> Result<Secret> {
    let server = server_url(endpoint)?;
    let out = generate_kubeconfig(store, cluster, &server, proxy_url)?;

    let created = store.create(&generate_secret_with_owner(cluster, out, owner))?;
    info!(secret = %created.key(), server = %server, "created kubeconfig secret");
    Ok(created)
}

/// Kubeconfig secret for a cluster object, owned by that cluster.
pub fn generate_secret(cluster: &Cluster, data: Vec<u8>) -> Secret {
    generate_secret_with_owner(&cluster.key(), data, cluster.owner_reference())
}

pub fn generate_secret_with_owner(
    cluster: &ObjectKey,
    data: Vec<u8>,
    owner: OwnerReference,
) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: secret::name(&cluster.name, Purpose::Kubeconfig),
            namespace: cluster.namespace.clone(),
            labels: BTreeMap::from([(CLUSTER_NAME_LABEL.to_string(), cluster.name.clone())]),
            owner_references: vec![owner],
            ..Default::default()
        },
        data: BTreeMap::from([(KUBECONFIG_DATA_NAME.to_string(), data)]),
    }
}

/// Replaces the client identity in an existing kubeconfig secret, keeping
/// its server and proxy URL, and writes it back with an update.
///
/// `secret` must be the current version from the store.
pub fn regenerate_secret(store: &dyn SecretStore, config_secret: &Secret) -> Result<Secret> {
    let (cluster_name, purpose) = parse_secret_name(&config_secret.metadata.name)?;
    if purpose != Purpose::Kubeconfig {
        return Err(Error::MalformedSecretName {
            name: config_secret.metadata.name.clone(),
            reason: format!("expected a {} secret, got {}", Purpose::Kubeconfig, purpose),
        });
    }

    let config = from_secret(config_secret)?;
    let cluster = cluster_entry(&config, &cluster_name)?;
    let key = ObjectKey::new(&config_secret.metadata.namespace, &cluster_name);

    let out = generate_kubeconfig(store, &key, &cluster.server, Some(cluster.proxy_url.as_str()))?;

    let mut updated = config_secret.clone();
    updated.data.insert(KUBECONFIG_DATA_NAME.to_string(), out);
    let stored = store.update(&updated)?;

    info!(
        secret = %stored.key(),
        resource_version = stored.metadata.resource_version,
        "regenerated kubeconfig client certificate"
    );
    Ok(stored)
}
