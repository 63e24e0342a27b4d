//! DNS registration port.
//!
//! A bring-up asks the registrar for DNS servers once before any instance
//! starts, registers container hostnames as containers come up, and hands
//! it the final output document once every instance is up so the instance
//! domains become resolvable.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use async_trait::async_trait;

use crate::domain::{OutputDocument, Uid};
use crate::error::{ConfigError, Error, Result};

/// Which DNS server the environment should use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsRequest {
    /// Start a dedicated DNS server container.
    Auto,
    /// Use the engine's default resolver.
    None,
    /// Use an existing server.
    Server(IpAddr),
}

impl FromStr for DnsRequest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "none" => Ok(Self::None),
            other => other.parse().map(Self::Server).map_err(|_| {
                ConfigError::InvalidValue {
                    field: "dns".to_string(),
                    reason: format!("expected 'auto', 'none' or an IP address, got '{other}'"),
                }
                .into()
            }),
        }
    }
}

impl fmt::Display for DnsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::None => f.write_str("none"),
            Self::Server(ip) => write!(f, "{ip}"),
        }
    }
}

/// Address of one container hostname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    pub hostname: String,
    pub address: String,
}

impl HostRecord {
    pub fn new(hostname: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            address: address.into(),
        }
    }
}

#[async_trait]
pub trait DnsRegistrar: Send + Sync {
    /// Resolves the request to the DNS servers containers should use, plus
    /// an output fragment describing anything started.
    async fn maybe_start(
        &self,
        request: &DnsRequest,
        uid: &Uid,
    ) -> Result<(Vec<String>, OutputDocument)>;

    /// Makes `hosts` resolvable through the server this registrar started.
    ///
    /// A no-op when no server was started.
    async fn register_hosts(&self, hosts: &[HostRecord]) -> Result<()>;

    /// Publishes the domain records of `output`.
    async fn maybe_restart_with_configuration(
        &self,
        request: &DnsRequest,
        uid: &Uid,
        output: &OutputDocument,
    ) -> Result<()>;
}
