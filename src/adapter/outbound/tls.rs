//! Throwaway certificate authority for node web certificates.

use rcgen::{BasicConstraints, Certificate, CertificateParams, DnType, IsCa};

use crate::error::{LaunchError, Result};
use crate::port::outbound::certificate::{CertificateAuthority, WebCertificate};

const CA_NAME: &str = "clusterup test CA";

/// Self-signed CA generated once per process.
///
/// Every certificate it issues is valid for the domain and its wildcard,
/// so one certificate covers all nodes of an instance.
pub struct TestCa {
    ca: Certificate,
    ca_pem: String,
}

impl TestCa {
    pub fn new() -> Result<Self> {
        let mut params = CertificateParams::new(Vec::new());
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.distinguished_name.push(DnType::CommonName, CA_NAME);

        let ca = Certificate::from_params(params).map_err(|e| issue_error(CA_NAME, &e))?;
        let ca_pem = ca.serialize_pem().map_err(|e| issue_error(CA_NAME, &e))?;
        Ok(Self { ca, ca_pem })
    }

    #[must_use]
    pub fn ca_pem(&self) -> &str {
        &self.ca_pem
    }
}

impl CertificateAuthority for TestCa {
    fn issue(&self, domain: &str) -> Result<WebCertificate> {
        let mut params = CertificateParams::new(vec![domain.to_string(), format!("*.{domain}")]);
        params.distinguished_name.push(DnType::CommonName, domain);

        let cert = Certificate::from_params(params).map_err(|e| issue_error(domain, &e))?;
        let cert_pem = cert
            .serialize_pem_with_signer(&self.ca)
            .map_err(|e| issue_error(domain, &e))?;

        Ok(WebCertificate {
            key_pem: cert.serialize_private_key_pem(),
            cert_pem,
            chain_pem: self.ca_pem.clone(),
        })
    }
}

fn issue_error(domain: &str, err: &rcgen::RcgenError) -> LaunchError {
    LaunchError::Certificate {
        domain: domain.to_string(),
        reason: err.to_string(),
    }
}
