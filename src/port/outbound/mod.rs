//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the infrastructure a bring-up drives: the
//! container engine, the environment DNS server, the test certificate
//! authority and node health endpoints.

pub mod certificate;
pub mod container;
pub mod dns;
pub mod probe;
