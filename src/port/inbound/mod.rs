//! Inbound (driving) ports.
//!
//! - [`role`]: capability set a worker role supplies to the orchestrator

pub mod role;
