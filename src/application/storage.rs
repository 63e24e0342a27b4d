//! Ceph RADOS storage container.

use tracing::info;

use crate::application::poller::ReadinessPoller;
use crate::domain::naming::{self, Uid};
use crate::domain::output::DOCKER_IDS;
use crate::domain::OutputDocument;
use crate::error::Result;
use crate::port::outbound::container::{argv, ContainerEngine, RunSpec};

pub const CEPH_ADMIN: &str = "client.admin";

/// A pool to create and its placement group count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    pub name: String,
    pub pg_num: u32,
}

impl Pool {
    pub fn new(name: impl Into<String>, pg_num: u32) -> Self {
        Self {
            name: name.into(),
            pg_num,
        }
    }
}

pub struct CephStorage<'a> {
    engine: &'a dyn ContainerEngine,
    poller: ReadinessPoller,
}

impl<'a> CephStorage<'a> {
    #[must_use]
    pub fn new(engine: &'a dyn ContainerEngine, poller: ReadinessPoller) -> Self {
        Self { engine, poller }
    }

    /// Starts a single-node cluster, creates `pools` and waits for it to
    /// report healthy.
    ///
    /// The fragment carries what a client needs to connect: admin user,
    /// key and address.
    pub async fn up(&self, image: &str, pools: &[Pool], name: &str, uid: &Uid) -> Result<OutputDocument> {
        let hostname = naming::ceph_hostname(name, uid)?;
        let spec = RunSpec::new(image, &hostname)
            .hostname(&hostname)
            .privileged()
            .detached();
        let container = self.engine.run(&spec).await?;
        info!(container = %container, hostname = %hostname, "Started ceph");

        for pool in pools {
            let pg_num = pool.pg_num.to_string();
            self.engine
                .exec(
                    &container,
                    &argv(["ceph", "osd", "pool", "create", pool.name.as_str(), pg_num.as_str()]),
                )
                .await?;
        }

        let engine = self.engine;
        self.poller
            .wait_all(std::slice::from_ref(&container), move |container| async move {
                let health = engine.exec(&container, &argv(["ceph", "health"])).await?;
                Ok(health.contains("HEALTH_OK"))
            })
            .await?;

        let key = self
            .engine
            .exec(&container, &argv(["ceph", "auth", "print-key", CEPH_ADMIN]))
            .await?;
        let address = self.engine.ip_address(&container).await?;
        info!(container = %container, address = %address, "Ceph ready");

        Ok(OutputDocument::new()
            .with_list(DOCKER_IDS, [container.to_string()])
            .with("username", CEPH_ADMIN)
            .with("key", key.trim())
            .with("host_name", address)
            .with("container_id", container.to_string()))
    }
}
