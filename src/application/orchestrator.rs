//! Instance orchestration.
//!
//! Drives a whole bring-up: DNS, then for every instance in document order
//! the database, the worker nodes and their host records, the readiness
//! gate and the domain records. Each instance contributes one output fragment; fragments are
//! merged into a single document returned to the caller.
//!
//! A failure aborts the bring-up. Containers that were already started are
//! left running for inspection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::info;

use crate::application::database::DatabaseBringUp;
use crate::application::launcher::{LaunchOptions, NodeLauncher};
use crate::application::poller::ReadinessPoller;
use crate::domain::naming::{self, Uid};
use crate::domain::output::{DOMAINS, DOMAIN_MAPPINGS};
use crate::domain::{EnvironmentConfig, InstanceConfig, NodeConfig, OutputDocument, PreparedNode};
use crate::error::Result;
use crate::port::inbound::role::{InstanceContext, Role};
use crate::port::outbound::certificate::CertificateAuthority;
use crate::port::outbound::container::ContainerEngine;
use crate::port::outbound::dns::{DnsRegistrar, DnsRequest, HostRecord};

/// Application section carrying the persistence driver module.
pub const PERSISTENCE_APP: &str = "cluster_worker";
pub const PERSISTENCE_DRIVER_KEY: &str = "persistence_driver_module";

/// Per-run parameters of a bring-up.
#[derive(Debug, Clone)]
pub struct BringUpOptions {
    /// Worker image.
    pub image: String,
    /// Absolute path of the source tree.
    pub bindir: PathBuf,
    pub logdir: Option<PathBuf>,
    pub dns: DnsRequest,
    pub uid: Uid,
}

/// Timeouts and images the orchestrator needs besides its ports.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub node_ready: ReadinessPoller,
    pub database_ready: ReadinessPoller,
    pub couchbase_image: String,
}

pub struct Orchestrator {
    engine: Arc<dyn ContainerEngine>,
    role: Arc<dyn Role>,
    dns: Arc<dyn DnsRegistrar>,
    ca: Arc<dyn CertificateAuthority>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        engine: Arc<dyn ContainerEngine>,
        role: Arc<dyn Role>,
        dns: Arc<dyn DnsRegistrar>,
        ca: Arc<dyn CertificateAuthority>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            engine,
            role,
            dns,
            ca,
            settings,
        }
    }

    #[must_use]
    pub fn role(&self) -> &dyn Role {
        self.role.as_ref()
    }

    /// Loads an environment document using this orchestrator's role keys.
    pub fn load(&self, path: &Path) -> Result<EnvironmentConfig> {
        EnvironmentConfig::load(path, self.role.document_keys())
    }

    /// Loads, validates and brings up the environment at `path`.
    ///
    /// Nothing is started when the document fails to load.
    pub async fn up_from_path(&self, path: &Path, opts: &BringUpOptions) -> Result<OutputDocument> {
        let env = self.load(path)?;
        self.up(&env, opts).await
    }

    /// Brings up every instance of `env` in order.
    pub async fn up(&self, env: &EnvironmentConfig, opts: &BringUpOptions) -> Result<OutputDocument> {
        let (dns_servers, mut output) = self.dns.maybe_start(&opts.dns, &opts.uid).await?;
        info!(uid = %opts.uid, instances = env.instances.len(), "Starting bring-up");

        for instance in &env.instances {
            let fragment = self.instance_up(env, instance, &dns_servers, opts).await?;
            output.merge(fragment)?;
        }

        self.dns
            .maybe_restart_with_configuration(&opts.dns, &opts.uid, &output)
            .await?;
        info!(uid = %opts.uid, "Bring-up complete");
        Ok(output)
    }

    async fn instance_up(
        &self,
        env: &EnvironmentConfig,
        instance: &InstanceConfig,
        dns_servers: &[String],
        opts: &BringUpOptions,
    ) -> Result<OutputDocument> {
        let role = self.role.as_ref();
        let engine = self.engine.as_ref();
        let uid = &opts.uid;
        let domain = naming::cluster_domain(&instance.name, uid)?;
        info!(instance = %instance.name, domain = %domain, nodes = instance.nodes.len(), "Bringing up instance");

        let prepared = instance
            .nodes
            .iter()
            .map(|node| prepare_node(role, env, instance, node, &domain, uid))
            .collect::<Result<Vec<_>>>()?;
        let refs: Vec<_> = prepared
            .iter()
            .flat_map(|node| node.db_nodes.iter().cloned())
            .collect();

        let database = DatabaseBringUp::new(
            engine,
            &self.settings.couchbase_image,
            self.settings.database_ready,
        )
        .registering_with(self.dns.as_ref())
        .up(&instance.name, instance.db_driver, &refs, uid, dns_servers, role)
        .await?;
        let nodes = prepared
            .into_iter()
            .map(|node| node.resolve(&database.mapping))
            .collect::<Result<Vec<_>>>()?;
        let mut current = database.output;

        role.pre_configure_instance(&instance.name, &domain, env)
            .await?;

        let launcher = NodeLauncher::new(engine, self.ca.as_ref(), role);
        let launch_opts = LaunchOptions {
            image: &opts.image,
            bindir: &opts.bindir,
            dns_servers,
            logdir: opts.logdir.as_deref(),
        };
        let mut containers = Vec::with_capacity(nodes.len());
        let mut addresses = Vec::with_capacity(nodes.len());
        let mut hosts = Vec::with_capacity(nodes.len());
        for node in &nodes {
            let launched = launcher.launch(node, launch_opts).await?;
            let address = engine.ip_address(&launched.container).await?;
            hosts.push(HostRecord::new(node.hostname.clone(), address.clone()));
            addresses.push(address);
            current.merge(launched.output)?;
            containers.push(launched.container);
        }
        self.dns.register_hosts(&hosts).await?;

        self.settings
            .node_ready
            .wait_all(&containers, move |container| async move {
                role.ready_check(engine, &container).await
            })
            .await?;
        info!(instance = %instance.name, "All nodes ready");

        current.merge(domain_records(
            &instance.name,
            &domain,
            addresses,
            role.has_dns_server(),
        ))?;

        role.post_configure_instance(InstanceContext {
            bindir: &opts.bindir,
            instance: &instance.name,
            domain: &domain,
            env,
            containers: &containers,
            output: &current,
        })
        .await?;
        Ok(current)
    }
}

/// Builds the per-node configuration of `node` before database endpoints
/// are known.
pub fn prepare_node(
    role: &dyn Role,
    env: &EnvironmentConfig,
    instance: &InstanceConfig,
    node: &NodeConfig,
    domain: &str,
    uid: &Uid,
) -> Result<PreparedNode> {
    let hostname = naming::worker_hostname(&node.name, &instance.name, uid)?;
    let node_name = naming::worker_node_name(&node.name, &instance.name, uid)?;
    let cm_nodes = node
        .cm_nodes
        .iter()
        .map(|cm| naming::cm_node_name(cm, &instance.name, uid))
        .collect::<Result<Vec<_>>>()?;

    let mut app_env = node.app_env.clone();
    app_env.insert(
        role.domain_env_name().to_string(),
        json!({ "string": domain }),
    );

    let driver_module = Value::String(instance.db_driver.driver_module());
    let mut sys_config = node.sys_config.clone();
    if role.app_name() == PERSISTENCE_APP {
        app_env.insert(PERSISTENCE_DRIVER_KEY.to_string(), driver_module);
    } else {
        let section = sys_config
            .entry(PERSISTENCE_APP)
            .or_insert_with(|| Value::Object(Map::new()));
        match section {
            Value::Object(section) => {
                section.insert(PERSISTENCE_DRIVER_KEY.to_string(), driver_module);
            }
            other => {
                let mut section = Map::new();
                section.insert(PERSISTENCE_DRIVER_KEY.to_string(), driver_module);
                *other = Value::Object(section);
            }
        }
    }

    let mut vm_args = node.vm_args.clone();
    vm_args.insert("name".to_string(), Value::String(node_name.clone()));

    let prepared = PreparedNode {
        name: node.name.clone(),
        instance: instance.name.clone(),
        node_name,
        hostname,
        domain: domain.to_string(),
        cm_nodes,
        db_nodes: node.db_nodes.clone(),
        app_env,
        sys_config,
        vm_args,
        db_driver: instance.db_driver,
        input_dir: env.input_dir.clone(),
        os_config: instance.os_config.clone(),
        gui_override: instance.gui_override.clone(),
    };
    Ok(role.tweak_config(prepared, uid))
}

/// NS records when the role serves its own domain, A records otherwise.
fn domain_records(
    instance: &str,
    domain: &str,
    addresses: Vec<String>,
    has_dns_server: bool,
) -> OutputDocument {
    let (ns, a) = if has_dns_server {
        (addresses, Vec::new())
    } else {
        (Vec::new(), addresses)
    };

    let mut domains = Map::new();
    domains.insert(domain.to_string(), json!({ "ns": ns, "a": a }));
    let mut mappings = Map::new();
    mappings.insert(instance.to_string(), Value::String(domain.to_string()));

    OutputDocument::new()
        .with(DOMAINS, Value::Object(domains))
        .with(DOMAIN_MAPPINGS, Value::Object(mappings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_records_without_own_dns() {
        let records = domain_records("c1", "c1.1.dev", vec!["10.0.0.2".to_string()], false);
        assert_eq!(
            records.pointer(&["domains", "c1.1.dev", "a"]),
            Some(&json!(["10.0.0.2"]))
        );
        assert_eq!(
            records.pointer(&["domains", "c1.1.dev", "ns"]),
            Some(&json!([]))
        );
        assert_eq!(
            records.pointer(&["domain_mappings", "c1"]),
            Some(&json!("c1.1.dev"))
        );
    }

    #[test]
    fn ns_records_with_own_dns() {
        let records = domain_records("c1", "c1.1.dev", vec!["10.0.0.2".to_string()], true);
        assert_eq!(
            records.pointer(&["domains", "c1.1.dev", "ns"]),
            Some(&json!(["10.0.0.2"]))
        );
        assert_eq!(
            records.pointer(&["domains", "c1.1.dev", "a"]),
            Some(&json!([]))
        );
    }
}
