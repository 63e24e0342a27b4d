//! Deterministic container names, hostnames and runtime node names.
//!
//! Every name is a pure function of its inputs, so a process can compute the
//! address of a peer that has not been started yet. Hostnames double as
//! container names.
//!
//! ```
//! use clusterup::domain::naming::{worker_hostname, worker_node_name, Uid};
//!
//! let uid = Uid::new("1700000000").unwrap();
//! assert_eq!(
//!     worker_hostname("worker1", "c1", &uid).unwrap(),
//!     "worker1.c1.1700000000.dev"
//! );
//! assert_eq!(
//!     worker_node_name("worker1", "c1", &uid).unwrap(),
//!     "worker@worker1.c1.1700000000.dev"
//! );
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, Result};

/// Suffix appended to every generated hostname.
pub const ENV_DOMAIN: &str = "dev";

/// Role prefix of worker node names.
pub const WORKER_ROLE: &str = "worker";

/// Role prefix of cluster-manager node names.
pub const CM_ROLE: &str = "cm";

/// Port the couchbase memcached endpoint listens on.
pub const COUCHBASE_PORT: u16 = 11211;

/// Per-run disambiguating token concatenated into generated names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uid(String);

impl Uid {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        validate_name(&value)?;
        Ok(Self(value))
    }

    /// Uid derived from the current Unix timestamp.
    #[must_use]
    pub fn generate() -> Self {
        Self(chrono::Utc::now().timestamp().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Uid {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

pub fn validate_name(part: &str) -> Result<()> {
    let reason = if part.is_empty() {
        "must not be empty"
    } else if part.chars().any(char::is_whitespace) {
        "must not contain whitespace"
    } else if part.contains('.') {
        "must not contain '.'"
    } else {
        return Ok(());
    };
    Err(ConfigError::InvalidName {
        name: part.to_string(),
        reason: reason.to_string(),
    }
    .into())
}

/// Hostname for a unique name within the environment.
///
/// `parts` are consecutive domain parts, most specific first, e.g.
/// `["worker1", "c1"]`. Any `@` is dropped.
pub fn format_hostname<S: AsRef<str>>(parts: &[S], uid: &Uid) -> Result<String> {
    if parts.is_empty() {
        return Err(ConfigError::InvalidName {
            name: String::new(),
            reason: "at least one name part is required".to_string(),
        }
        .into());
    }

    let mut labels = Vec::with_capacity(parts.len() + 2);
    for part in parts {
        let label = part.as_ref().replace('@', "");
        validate_name(&label)?;
        labels.push(label);
    }
    labels.push(uid.as_str().to_string());
    labels.push(ENV_DOMAIN.to_string());
    Ok(labels.join("."))
}

/// Runtime node name of a process of `role` running on `hostname`.
#[must_use]
pub fn format_node_name(role: &str, hostname: &str) -> String {
    format!("{role}@{hostname}")
}

pub fn cluster_domain(instance: &str, uid: &Uid) -> Result<String> {
    format_hostname(&[instance], uid)
}

pub fn worker_hostname(node: &str, instance: &str, uid: &Uid) -> Result<String> {
    format_hostname(&[node, instance], uid)
}

pub fn worker_node_name(node: &str, instance: &str, uid: &Uid) -> Result<String> {
    let hostname = worker_hostname(node, instance, uid)?;
    Ok(format_node_name(WORKER_ROLE, &hostname))
}

pub fn cm_node_name(cm: &str, instance: &str, uid: &Uid) -> Result<String> {
    let hostname = format_hostname(&[cm, instance], uid)?;
    Ok(format_node_name(CM_ROLE, &hostname))
}

pub fn couchbase_hostname(index: usize, instance: &str, uid: &Uid) -> Result<String> {
    format_hostname(&[format!("couchbase{index}").as_str(), instance], uid)
}

/// Connection endpoint of the `index`-th couchbase node of an instance.
pub fn couchbase_endpoint(index: usize, instance: &str, uid: &Uid) -> Result<String> {
    Ok(format!(
        "{}:{COUCHBASE_PORT}",
        couchbase_hostname(index, instance, uid)?
    ))
}

pub fn dns_hostname(uid: &Uid) -> Result<String> {
    format_hostname(&["dns"], uid)
}

pub fn ceph_hostname(name: &str, uid: &Uid) -> Result<String> {
    format_hostname(&[name, "cephrados"], uid)
}

/// Stable POSIX id in `10000..60000` for an OS user or group name.
#[must_use]
pub fn posix_id(name: &str) -> u32 {
    // FNV-1a
    let mut hash: u32 = 0x811c_9dc5;
    for byte in name.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash % 50_000 + 10_000
}
