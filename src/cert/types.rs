// cert/types.rs

/// Common name of the cluster administrator identity.
pub const ADMIN_COMMON_NAME: &str = "kubernetes-admin";
/// Group bound to cluster-admin by the default RBAC policy.
pub const ADMIN_ORGANIZATION: &str = "system:masters";

/// Validity of certificates signed for client identities.
pub const DEFAULT_CERT_VALIDITY_DAYS: u32 = 365;
pub const DEFAULT_KEY_SIZE: u32 = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendedKeyUsage {
    ClientAuth,
}

/// Subject profile and parameters for a leaf certificate.
#[derive(Debug, Clone)]
pub struct CertificateConfig {
    pub common_name: String,
    pub organization: Vec<String>,
    pub validity_days: u32,
    pub key_size: u32,
    pub extended_key_usage: Vec<ExtendedKeyUsage>,
}

impl CertificateConfig {
    /// Cluster administrator client certificate.
    pub fn admin() -> Self {
        Self {
            common_name: ADMIN_COMMON_NAME.to_string(),
            organization: vec![ADMIN_ORGANIZATION.to_string()],
            validity_days: DEFAULT_CERT_VALIDITY_DAYS,
            key_size: DEFAULT_KEY_SIZE,
            extended_key_usage: vec![ExtendedKeyUsage::ClientAuth],
        }
    }
}
