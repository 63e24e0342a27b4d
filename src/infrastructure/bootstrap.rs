//! Composition root: wires settings to concrete adapters.

use std::sync::Arc;

use tracing::debug;

use crate::adapter::outbound::dns::DnsServer;
use crate::adapter::outbound::docker::DockerCli;
use crate::adapter::outbound::nagios::NagiosProbe;
use crate::adapter::outbound::tls::TestCa;
use crate::application::role::ClusterWorker;
use crate::application::{Orchestrator, OrchestratorSettings};
use crate::error::Result;
use crate::infrastructure::config::settings::Settings;
use crate::port::inbound::role::Role;
use crate::port::outbound::container::ContainerEngine;

/// Container engine configured by `[docker]`.
#[must_use]
pub fn build_engine(settings: &Settings) -> Arc<dyn ContainerEngine> {
    Arc::new(DockerCli::new(settings.docker.binary.clone()))
}

/// The cluster worker role probing nodes over nagios.
#[must_use]
pub fn build_role() -> Arc<dyn Role> {
    Arc::new(ClusterWorker::new(Arc::new(NagiosProbe::new())))
}

/// Orchestrator over `engine` with the default role, a dnsmasq registrar
/// and a fresh test CA.
pub fn build_orchestrator(settings: &Settings, engine: Arc<dyn ContainerEngine>) -> Result<Orchestrator> {
    let dns = Arc::new(DnsServer::new(Arc::clone(&engine), settings.images.dns.clone()));
    let ca = Arc::new(TestCa::new()?);
    debug!(binary = %settings.docker.binary, "Wiring orchestrator");

    Ok(Orchestrator::new(
        engine,
        build_role(),
        dns,
        ca,
        OrchestratorSettings {
            node_ready: settings.timeouts.cluster_poller(),
            database_ready: settings.timeouts.couchbase_poller(),
            couchbase_image: settings.images.couchbase.clone(),
        },
    ))
}
