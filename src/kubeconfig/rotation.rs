use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing::debug;
use x509_parser::prelude::{FromDer, X509Certificate};

use super::codec::from_secret;
use super::kube::Config;
use crate::cert::ca::decode_certificate;
use crate::error::{BoxError, Error, Result};
use crate::secret::Secret;

const CLIENT_CERT: &str = "kubeconfig client";

#[derive(Debug, Clone)]
pub struct ClientCertificateInfo {
    /// Kubeconfig user entry the certificate belongs to.
    pub user: String,
    pub subject: String,
    pub issuer: String,
    pub serial: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl ClientCertificateInfo {
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.not_after - now
    }
}

fn decode_failure(source: impl Into<BoxError>) -> Error {
    Error::CertificateDecode {
        what: CLIENT_CERT,
        source: source.into(),
    }
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| decode_failure(format!("invalid timestamp {}", seconds)))
}

pub fn analyze_client_certificate(user: &str, pem: &[u8]) -> Result<ClientCertificateInfo> {
    let cert_der = decode_certificate(Some(pem), CLIENT_CERT)?
        .to_der()
        .map_err(decode_failure)?;
    let (_remainder, cert) =
        X509Certificate::from_der(&cert_der).map_err(|e| decode_failure(e.to_string()))?;

    Ok(ClientCertificateInfo {
        user: user.to_string(),
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        serial: hex::encode(cert.raw_serial()),
        not_before: timestamp(cert.validity().not_before.timestamp())?,
        not_after: timestamp(cert.validity().not_after.timestamp())?,
    })
}

/// Every client certificate embedded in the kubeconfig. Fails on the first
/// one that cannot be decoded.
pub fn client_certificates(config: &Config) -> Result<Vec<ClientCertificateInfo>> {
    config
        .auth_infos
        .iter()
        .map(|(user, auth_info)| {
            analyze_client_certificate(user, &auth_info.client_certificate_data)
        })
        .collect()
}

/// Returns whether any client certificate in the kubeconfig secret expires
/// within `threshold` from now.
pub fn needs_client_cert_rotation(secret: &Secret, threshold: Duration) -> Result<bool> {
    needs_client_cert_rotation_at(secret, threshold, Utc::now())
}

/// Same as [`needs_client_cert_rotation`] with an explicit current time.
///
/// A certificate with exactly `threshold` left does not need rotation.
pub fn needs_client_cert_rotation_at(
    secret: &Secret,
    threshold: Duration,
    now: DateTime<Utc>,
) -> Result<bool> {
    let config = from_secret(secret)?;

    for (user, auth_info) in &config.auth_infos {
        let info = analyze_client_certificate(user, &auth_info.client_certificate_data)?;
        if info.remaining(now) < threshold {
            debug!(
                secret = %secret.key(),
                user = %user,
                not_after = %info.not_after,
                "client certificate expires within threshold"
            );
            return Ok(true);
        }
    }

    Ok(false)
}
