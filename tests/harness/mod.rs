#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use clusterup::application::{Orchestrator, OrchestratorSettings};
use clusterup::adapter::outbound::dns::DnsServer;
use clusterup::domain::{EnvironmentConfig, LaunchableNode, PreparedNode, Uid};
use clusterup::error::Result;
use clusterup::port::inbound::role::{InstanceContext, Role};
use clusterup::port::outbound::container::{ContainerEngine, ContainerId, Volume, VolumeMode};
use clusterup::testkit::config::orchestrator_settings;
use clusterup::testkit::engine::RecordingEngine;
use clusterup::testkit::probe::StaticCa;

/// Hook invocation seen by [`RecordingRole`].
#[derive(Debug, Clone, PartialEq)]
pub enum Hook {
    PreConfigure { instance: String, domain: String },
    PostConfigure {
        instance: String,
        containers: usize,
        docker_ids: usize,
    },
}

/// Cluster-worker-shaped role that records its hooks and is always ready.
#[derive(Clone, Default)]
pub struct RecordingRole {
    hooks: Arc<Mutex<Vec<Hook>>>,
    pub dns_server: bool,
    pub extra_volume: bool,
}

impl RecordingRole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dns_server(mut self) -> Self {
        self.dns_server = true;
        self
    }

    pub fn with_extra_volume(mut self) -> Self {
        self.extra_volume = true;
        self
    }

    pub fn hooks(&self) -> Vec<Hook> {
        self.hooks.lock().expect("lock role hooks").clone()
    }
}

#[async_trait]
impl Role for RecordingRole {
    fn app_name(&self) -> &str {
        "cluster_worker"
    }

    fn domains_attribute(&self) -> &str {
        "cluster_domains"
    }

    fn domain_env_name(&self) -> &str {
        "cluster_domain"
    }

    fn nodes_list_attribute(&self) -> &str {
        "cluster_worker_nodes"
    }

    fn has_dns_server(&self) -> bool {
        self.dns_server
    }

    fn tweak_config(&self, mut node: PreparedNode, uid: &Uid) -> PreparedNode {
        node.app_env
            .insert("tweaked_for".to_string(), uid.to_string().into());
        node
    }

    fn pre_start_commands(&self, domain: &str) -> String {
        format!("echo starting {domain}")
    }

    fn extra_volumes(&self, node: &LaunchableNode, _bindir: &Path) -> Vec<Volume> {
        if self.extra_volume {
            vec![Volume::bind(
                format!("/srv/{}", node.hostname),
                "/mnt/storage",
                VolumeMode::ReadWrite,
            )]
        } else {
            Vec::new()
        }
    }

    fn couchbase_buckets(&self) -> Vec<(String, u32)> {
        vec![("default".to_string(), 256), ("sync".to_string(), 128)]
    }

    fn couchbase_ramsize(&self) -> u32 {
        512
    }

    async fn pre_configure_instance(
        &self,
        instance: &str,
        domain: &str,
        _env: &EnvironmentConfig,
    ) -> Result<()> {
        self.hooks
            .lock()
            .expect("lock role hooks")
            .push(Hook::PreConfigure {
                instance: instance.to_string(),
                domain: domain.to_string(),
            });
        Ok(())
    }

    async fn post_configure_instance(&self, ctx: InstanceContext<'_>) -> Result<()> {
        self.hooks
            .lock()
            .expect("lock role hooks")
            .push(Hook::PostConfigure {
                instance: ctx.instance.to_string(),
                containers: ctx.containers.len(),
                docker_ids: ctx.output.strings("docker_ids").len(),
            });
        Ok(())
    }

    async fn ready_check(&self, engine: &dyn ContainerEngine, container: &ContainerId) -> Result<bool> {
        engine.ip_address(container).await.map(|_| true)
    }
}

/// Orchestrator over `engine` driving `role`.
pub fn orchestrator_with_role(
    engine: Arc<RecordingEngine>,
    role: RecordingRole,
    settings: Option<OrchestratorSettings>,
) -> Orchestrator {
    let engine: Arc<dyn ContainerEngine> = engine;
    Orchestrator::new(
        Arc::clone(&engine),
        Arc::new(role),
        Arc::new(DnsServer::new(engine, "dns:test")),
        Arc::new(StaticCa::new()),
        settings.unwrap_or_else(orchestrator_settings),
    )
}
