//! Application services (use cases).
//!
//! These services drive the domain model through the ports: bringing up
//! databases, launching nodes, gating on readiness and orchestrating whole
//! instances.

pub mod database;
pub mod launcher;
pub mod orchestrator;
pub mod poller;
pub mod role;
pub mod script;
pub mod storage;

pub use orchestrator::{BringUpOptions, Orchestrator, OrchestratorSettings};
pub use poller::ReadinessPoller;
