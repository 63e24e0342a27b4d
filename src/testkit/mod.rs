//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`engine`] - `RecordingEngine`, an in-memory container engine.
//! - [`probe`] - `ScriptedProbe` health answers and a `StaticCa`.
//! - [`dns`] - `RecordingDns`, a registrar that keeps registered hosts.
//! - [`config`] - Canonical settings, environment documents and a wired
//!   orchestrator.

pub mod config;
pub mod dns;
pub mod engine;
pub mod probe;
