//! Database bring-up for one instance.
//!
//! Collects the logical database references of every node, starts one
//! couchbase container per distinct reference, registers their hostnames
//! with the DNS registrar, waits for them, joins them into a single cluster
//! and returns the reference-to-endpoint mapping.

use tracing::{debug, info};

use crate::application::poller::ReadinessPoller;
use crate::domain::naming::{self, Uid};
use crate::domain::output::DOCKER_IDS;
use crate::domain::{DbDriver, DbEndpoint, DbNodeMapping, DbNodeRef, OutputDocument};
use crate::error::Result;
use crate::port::inbound::role::Role;
use crate::port::outbound::container::{argv, ContainerEngine, ContainerId, RunSpec};
use crate::port::outbound::dns::{DnsRegistrar, HostRecord};

/// Output key listing the database hostnames.
pub const COUCHBASE_NODES: &str = "couchbase_nodes";

const ADMIN_USER: &str = "admin";
const ADMIN_PASSWORD: &str = "password";
const REST_ADDRESS: &str = "127.0.0.1:8091";

/// Result of bringing up an instance's database.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseCluster {
    pub mapping: DbNodeMapping,
    pub output: OutputDocument,
}

pub struct DatabaseBringUp<'a> {
    engine: &'a dyn ContainerEngine,
    dns: Option<&'a dyn DnsRegistrar>,
    image: &'a str,
    poller: ReadinessPoller,
}

impl<'a> DatabaseBringUp<'a> {
    #[must_use]
    pub fn new(engine: &'a dyn ContainerEngine, image: &'a str, poller: ReadinessPoller) -> Self {
        Self {
            engine,
            dns: None,
            image,
            poller,
        }
    }

    /// Registers every started database hostname with `dns` before the
    /// nodes are joined, so `server-add` can reach them by name.
    #[must_use]
    pub fn registering_with(mut self, dns: &'a dyn DnsRegistrar) -> Self {
        self.dns = Some(dns);
        self
    }

    /// Starts the database cluster backing `refs`.
    ///
    /// References are deduplicated keeping first-occurrence order; the
    /// index of a reference in that order picks its container. An empty
    /// set is a no-op for every driver.
    ///
    /// # Errors
    ///
    /// Engine failures and [`ReadinessTimeout`](crate::error::ReadinessTimeout)
    /// when the containers never answer.
    pub async fn up(
        &self,
        instance: &str,
        driver: DbDriver,
        refs: &[DbNodeRef],
        uid: &Uid,
        dns_servers: &[String],
        role: &dyn Role,
    ) -> Result<DatabaseCluster> {
        let unique = dedup(refs);
        if unique.is_empty() {
            debug!(instance, driver = %driver, "No database nodes referenced");
            return Ok(DatabaseCluster::default());
        }

        match driver {
            DbDriver::Couchbase | DbDriver::Couchdb => {
                self.couchbase_up(instance, &unique, uid, dns_servers, role)
                    .await
            }
        }
    }

    async fn couchbase_up(
        &self,
        instance: &str,
        refs: &[DbNodeRef],
        uid: &Uid,
        dns_servers: &[String],
        role: &dyn Role,
    ) -> Result<DatabaseCluster> {
        let mut mapping = DbNodeMapping::new();
        let mut hostnames = Vec::with_capacity(refs.len());
        for (index, reference) in refs.iter().enumerate() {
            mapping.insert(
                reference.clone(),
                DbEndpoint::new(naming::couchbase_endpoint(index, instance, uid)?),
            );
            hostnames.push(naming::couchbase_hostname(index, instance, uid)?);
        }

        let mut containers = Vec::with_capacity(hostnames.len());
        for hostname in &hostnames {
            let spec = RunSpec::new(self.image, hostname)
                .hostname(hostname)
                .dns(dns_servers)
                .detached();
            let container = self.engine.run(&spec).await?;
            info!(instance, hostname = %hostname, container = %container, "Started database node");
            containers.push(container);
        }

        if let Some(dns) = self.dns {
            let mut hosts = Vec::with_capacity(containers.len());
            for (container, hostname) in containers.iter().zip(&hostnames) {
                let address = self.engine.ip_address(container).await?;
                hosts.push(HostRecord::new(hostname.clone(), address));
            }
            dns.register_hosts(&hosts).await?;
        }

        let engine = self.engine;
        self.poller
            .wait_all(&containers, move |container| async move {
                engine
                    .exec(
                        &container,
                        &argv(["curl", "-sf", &format!("http://{REST_ADDRESS}/pools")]),
                    )
                    .await
                    .map(|_| true)
            })
            .await?;

        self.configure_cluster(&containers, &hostnames, role).await?;
        info!(instance, nodes = containers.len(), "Database cluster ready");

        let output = OutputDocument::new()
            .with_list(DOCKER_IDS, containers.iter().map(ToString::to_string))
            .with_list(COUCHBASE_NODES, hostnames);
        Ok(DatabaseCluster { mapping, output })
    }

    async fn configure_cluster(
        &self,
        containers: &[ContainerId],
        hostnames: &[String],
        role: &dyn Role,
    ) -> Result<()> {
        let Some(primary) = containers.first() else {
            return Ok(());
        };

        self.couchbase_cli(
            primary,
            "cluster-init",
            &[
                "--cluster-username".to_string(),
                ADMIN_USER.to_string(),
                "--cluster-password".to_string(),
                ADMIN_PASSWORD.to_string(),
                "--cluster-ramsize".to_string(),
                role.couchbase_ramsize().to_string(),
                "--services".to_string(),
                "data".to_string(),
            ],
            false,
        )
        .await?;

        for hostname in hostnames.iter().skip(1) {
            self.couchbase_cli(
                primary,
                "server-add",
                &[
                    "--server-add".to_string(),
                    format!("{hostname}:8091"),
                    "--server-add-username".to_string(),
                    ADMIN_USER.to_string(),
                    "--server-add-password".to_string(),
                    ADMIN_PASSWORD.to_string(),
                    "--services".to_string(),
                    "data".to_string(),
                ],
                true,
            )
            .await?;
        }
        if hostnames.len() > 1 {
            self.couchbase_cli(primary, "rebalance", &[], true).await?;
        }

        for (bucket, ramsize) in role.couchbase_buckets() {
            self.couchbase_cli(
                primary,
                "bucket-create",
                &[
                    "--bucket".to_string(),
                    bucket.clone(),
                    "--bucket-ramsize".to_string(),
                    ramsize.to_string(),
                    "--bucket-type".to_string(),
                    "couchbase".to_string(),
                    "--wait".to_string(),
                ],
                true,
            )
            .await?;
            debug!(bucket = %bucket, ramsize, "Created bucket");
        }
        Ok(())
    }

    async fn couchbase_cli(
        &self,
        container: &ContainerId,
        subcommand: &str,
        args: &[String],
        authenticated: bool,
    ) -> Result<String> {
        let mut command = argv(["couchbase-cli", subcommand, "-c", REST_ADDRESS]);
        if authenticated {
            command.extend(argv(["-u", ADMIN_USER, "-p", ADMIN_PASSWORD]));
        }
        command.extend(args.iter().cloned());
        self.engine.exec(container, &command).await
    }
}

/// Distinct references in first-occurrence order.
fn dedup(refs: &[DbNodeRef]) -> Vec<DbNodeRef> {
    let mut unique: Vec<DbNodeRef> = Vec::with_capacity(refs.len());
    for reference in refs {
        if !unique.contains(reference) {
            unique.push(reference.clone());
        }
    }
    unique
}
