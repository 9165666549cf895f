// src/cert/ca.rs
//! Decoding of CA secrets into signing material.

use openssl::pkey::{PKey, Private};
use openssl::x509::X509;

use super::openssl::{decode_cert_pem, decode_private_key_pem};
use crate::error::{Error, Result};
use crate::secret::{Secret, TLS_CRT_DATA_NAME, TLS_KEY_DATA_NAME};

/// A CA able to sign certificates.
pub struct CertificateAuthority {
    pub cert: X509,
    pub key: PKey<Private>,
}

/// Decodes a certificate, reporting a missing or blank value as
/// [`Error::CertificateAbsent`] and unparsable content as
/// [`Error::CertificateDecode`].
pub fn decode_certificate(pem: Option<&[u8]>, what: &'static str) -> Result<X509> {
    match decode_cert_pem(pem.unwrap_or_default()) {
        Ok(Some(cert)) => Ok(cert),
        Ok(None) => Err(Error::CertificateAbsent { what }),
        Err(e) => Err(Error::CertificateDecode {
            what,
            source: Box::new(e),
        }),
    }
}

pub fn decode_private_key(pem: Option<&[u8]>, what: &'static str) -> Result<PKey<Private>> {
    match decode_private_key_pem(pem.unwrap_or_default()) {
        Ok(Some(key)) => Ok(key),
        Ok(None) => Err(Error::PrivateKeyAbsent { what }),
        Err(source) => Err(Error::PrivateKeyDecode { what, source }),
    }
}

/// Certificate half of a CA secret.
pub fn ca_certificate(secret: &Secret, what: &'static str) -> Result<X509> {
    decode_certificate(secret.data.get(TLS_CRT_DATA_NAME).map(Vec::as_slice), what)
}

/// Both halves of a CA secret. The certificate is decoded first.
pub fn certificate_authority(secret: &Secret, what: &'static str) -> Result<CertificateAuthority> {
    let cert = ca_certificate(secret, what)?;
    let key = decode_private_key(secret.data.get(TLS_KEY_DATA_NAME).map(Vec::as_slice), what)?;
    Ok(CertificateAuthority { cert, key })
}
