//! Clusterup - brings up multi-container worker clusters for integration
//! test environments.
//!
//! An environment document describes one or more instances (clusters) of
//! worker nodes. For every instance the crate starts the database cluster
//! its nodes reference, launches one container per node, waits until all
//! of them report healthy and records the instance's DNS records. The
//! result is a single JSON output document describing everything started.
//!
//! # Modules
//!
//! - [`domain`] - Environment model, naming rules, the output document
//! - [`port`] - Container engine, DNS, certificate and probe traits plus the
//!   worker [`Role`](port::inbound::role::Role)
//! - [`application`] - Readiness polling, database bring-up, node launch,
//!   instance orchestration
//! - [`adapter`] - Docker CLI, dnsmasq, rcgen CA, nagios probe, the CLI
//! - [`infrastructure`] - Settings, logging and wiring
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `testkit` - In-memory container engine and probes for tests
//!
//! # Example
//!
//! ```no_run
//! use clusterup::domain::naming::{format_hostname, Uid};
//!
//! let uid = Uid::new("1700000000").unwrap();
//! let hostname = format_hostname(&["worker1", "c1"], &uid).unwrap();
//! assert_eq!(hostname, "worker1.c1.1700000000.dev");
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
