//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                  ┌───────────────────────────┐
//!                  │        Orchestrator       │
//!     ┌────────────┤   Domain + Role (inbound) ├─────────────┐
//!     │            └───────────────────────────┘             │
//!     ▼                        ▼                             ▼
//! ┌──────────┐          ┌─────────────┐               ┌────────────┐
//! │Container │          │     DNS     │               │ TLS / Probe│
//! │  Engine  │          │  Registrar  │               │  Adapters  │
//! └──────────┘          └─────────────┘               └────────────┘
//! ```
//!
//! - [`inbound::role::Role`] - per-role capability set plugged into the
//!   orchestrator
//! - [`outbound::container::ContainerEngine`] - run / exec / inspect
//! - [`outbound::dns::DnsRegistrar`] - optional environment DNS server
//! - [`outbound::certificate::CertificateAuthority`] - web certificates
//! - [`outbound::probe::HealthProbe`] - node health endpoint

pub mod inbound;
pub mod outbound;
