// src/kubeconfig/mod.rs
pub mod codec;
mod kube;
mod lifecycle;
pub mod rotation;

pub use codec::{cluster_entry, from_secret, kubeconfig_bytes, load, write};
pub use kube::{context_name, new, user_name, AuthInfo, Cluster, Config, Context};
pub use lifecycle::{
    create_secret, create_secret_with_owner, generate_kubeconfig, generate_secret,
    generate_secret_with_owner, regenerate_secret, server_url,
};
pub use rotation::{
    client_certificates, needs_client_cert_rotation, needs_client_cert_rotation_at,
    ClientCertificateInfo,
};
