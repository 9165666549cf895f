// src/cert/mod.rs
pub mod ca;
pub mod openssl;
mod types;

pub use ca::CertificateAuthority;
pub use types::{
    CertificateConfig, ExtendedKeyUsage, ADMIN_COMMON_NAME, ADMIN_ORGANIZATION,
    DEFAULT_CERT_VALIDITY_DAYS, DEFAULT_KEY_SIZE,
};
