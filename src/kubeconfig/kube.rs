use openssl::error::ErrorStack;
use openssl::pkey::{PKeyRef, Private};
use openssl::x509::X509Ref;
use std::collections::BTreeMap;

use crate::cert::openssl::{
    encode_cert_pem, encode_private_key_pem, generate_private_key, sign_certificate,
};
use crate::cert::CertificateConfig;
use crate::error::{Error, Result};

/// In-memory kubeconfig with entries keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub clusters: BTreeMap<String, Cluster>,
    pub contexts: BTreeMap<String, Context>,
    /// Serialized as `users`.
    pub auth_infos: BTreeMap<String, AuthInfo>,
    pub current_context: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cluster {
    pub server: String,
    /// PEM of the CA that signed the API server certificate.
    pub certificate_authority_data: Vec<u8>,
    /// Empty means no proxy.
    pub proxy_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    pub cluster: String,
    pub auth_info: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthInfo {
    pub client_certificate_data: Vec<u8>,
    pub client_key_data: Vec<u8>,
}

pub fn user_name(cluster_name: &str) -> String {
    format!("{}-admin", cluster_name)
}

pub fn context_name(cluster_name: &str) -> String {
    format!("{}@{}", user_name(cluster_name), cluster_name)
}

/// Builds an admin kubeconfig for the cluster with a freshly signed client
/// certificate from the client CA.
pub fn new(
    cluster_name: &str,
    endpoint: &str,
    client_ca_cert: &X509Ref,
    client_ca_key: &PKeyRef<Private>,
    server_ca_cert: &X509Ref,
    proxy_url: Option<&str>,
) -> Result<Config> {
    let cert_config = CertificateConfig::admin();

    let client_key =
        generate_private_key(cert_config.key_size).map_err(|source| Error::Signing {
            step: "create private key",
            source,
        })?;
    let client_cert = sign_certificate(&cert_config, &client_key, client_ca_cert, client_ca_key)
        .map_err(|source| Error::Signing {
            step: "sign certificate",
            source,
        })?;

    let encode_failed =
        |what: &'static str| move |source: ErrorStack| Error::PemEncode { what, source };
    let client_certificate_data =
        encode_cert_pem(&client_cert).map_err(encode_failed("client certificate"))?;
    let client_key_data =
        encode_private_key_pem(&client_key).map_err(encode_failed("client private key"))?;
    let certificate_authority_data =
        encode_cert_pem(server_ca_cert).map_err(encode_failed("cluster CA certificate"))?;

    let user_name = user_name(cluster_name);
    let context_name = context_name(cluster_name);

    Ok(Config {
        clusters: BTreeMap::from([(
            cluster_name.to_string(),
            Cluster {
                server: endpoint.to_string(),
                certificate_authority_data,
                proxy_url: proxy_url.unwrap_or_default().to_string(),
            },
        )]),
        contexts: BTreeMap::from([(
            context_name.clone(),
            Context {
                cluster: cluster_name.to_string(),
                auth_info: user_name.clone(),
            },
        )]),
        auth_infos: BTreeMap::from([(
            user_name,
            AuthInfo {
                client_certificate_data,
                client_key_data,
            },
        )]),
        current_context: context_name,
    })
}
