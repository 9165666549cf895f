//! Error types for kubeconfig issuance and rotation

use std::io;

use thiserror::Error;

use crate::secret::{Purpose, StoreError};

/// Result type alias for kubeconfig operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed cause for decode failures coming from different parsers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Kubeconfig issuance and rotation errors.
///
/// Variants name the step that failed so callers can tell a CA that is not
/// provisioned yet (worth waiting for) from corrupted material.
#[derive(Error, Debug)]
pub enum Error {
    /// One of the two CA secrets the kubeconfig depends on does not exist
    #[error("could not find secret {purpose} for cluster {cluster}")]
    DependentCertificateNotFound { cluster: String, purpose: Purpose },

    /// Certificate PEM is present but cannot be parsed
    #[error("failed to decode {what} certificate")]
    CertificateDecode {
        what: &'static str,
        #[source]
        source: BoxError,
    },

    /// Private key PEM is present but cannot be parsed
    #[error("failed to decode {what} private key")]
    PrivateKeyDecode {
        what: &'static str,
        #[source]
        source: openssl::error::ErrorStack,
    },

    /// Certificate field is missing or blank
    #[error("{what} certificate not found")]
    CertificateAbsent { what: &'static str },

    /// Private key field is missing or blank
    #[error("{what} private key not found")]
    PrivateKeyAbsent { what: &'static str },

    /// Key generation or certificate signing failed
    #[error("unable to {step}")]
    Signing {
        step: &'static str,
        #[source]
        source: openssl::error::ErrorStack,
    },

    /// Certificate or key could not be written as PEM
    #[error("failed to encode {what} as PEM")]
    PemEncode {
        what: &'static str,
        #[source]
        source: openssl::error::ErrorStack,
    },

    /// Kubeconfig could not be encoded
    #[error("failed to serialize config to yaml")]
    Serialization(#[source] serde_yaml::Error),

    /// Kubeconfig payload could not be decoded
    #[error("failed to load kubeconfig: {reason}")]
    Deserialization {
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Secret name does not follow `<cluster>-<purpose>`
    #[error("failed to parse secret name {name:?}: {reason}")]
    MalformedSecretName { name: String, reason: String },

    /// Secret carries no kubeconfig payload
    #[error("missing key {key:?} in secret data")]
    PayloadFieldMissing { key: &'static str },

    /// Kubeconfig has no cluster entry for the secret's cluster
    #[error("cluster {0:?} not found in kubeconfig")]
    ClusterNotInKubeconfig(String),

    /// Control plane endpoint is not a usable server URL
    #[error("invalid control plane endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Store error other than a missing CA
    #[error("secret store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn deserialization(reason: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Deserialization {
            reason: reason.into(),
            source: Some(source.into()),
        }
    }

    /// True when a CA secret is missing, i.e. the cluster PKI is not
    /// provisioned yet and the caller may retry later.
    #[must_use]
    pub fn is_dependent_not_found(&self) -> bool {
        matches!(self, Self::DependentCertificateNotFound { .. })
    }

    /// True when the store rejected an update because the secret changed
    /// since it was read.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(StoreError::Conflict { .. }))
    }
}
