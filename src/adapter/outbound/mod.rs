//! Outbound adapters (driven side).

pub mod dns;
pub mod docker;
pub mod nagios;
pub mod tls;
