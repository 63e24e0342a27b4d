use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::port::inbound::role::Role;
use crate::port::outbound::container::{ContainerEngine, ContainerId};
use crate::port::outbound::probe::HealthProbe;

/// Generic cluster worker: no DNS of its own, one persistence bucket,
/// healthy once its monitoring endpoint reports ok.
pub struct ClusterWorker {
    probe: Arc<dyn HealthProbe>,
}

impl ClusterWorker {
    pub const APP_NAME: &'static str = "cluster_worker";
    pub const BUCKET: &'static str = "onedata";

    pub fn new(probe: Arc<dyn HealthProbe>) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl Role for ClusterWorker {
    fn app_name(&self) -> &str {
        Self::APP_NAME
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
        false
    }

    fn pre_start_commands(&self, _domain: &str) -> String {
        "escript bamboos/gen_dev/gen_dev.escript /tmp/gen_dev_args.json".to_string()
    }

    fn couchbase_buckets(&self) -> Vec<(String, u32)> {
        vec![(Self::BUCKET.to_string(), 512)]
    }

    fn couchbase_ramsize(&self) -> u32 {
        1024
    }

    async fn ready_check(&self, engine: &dyn ContainerEngine, container: &ContainerId) -> Result<bool> {
        let address = engine.ip_address(container).await?;
        self.probe.probe(&address).await
    }
}
