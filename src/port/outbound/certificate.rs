//! Certificate authority port.

use crate::error::Result;

/// PEM-encoded web server material for one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebCertificate {
    pub key_pem: String,
    pub cert_pem: String,
    /// Certificate of the issuing CA.
    pub chain_pem: String,
}

/// Issues web certificates scoped to an instance domain.
pub trait CertificateAuthority: Send + Sync {
    /// # Errors
    ///
    /// Returns [`LaunchError::Certificate`](crate::error::LaunchError::Certificate)
    /// when key generation or signing fails.
    fn issue(&self, domain: &str) -> Result<WebCertificate>;
}
