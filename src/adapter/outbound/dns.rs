//! dnsmasq-based DNS server for a bring-up.
//!
//! With [`DnsRequest::Auto`] a dedicated container is started before any
//! instance. Container hostnames are appended to a hosts file as they are
//! registered and dnsmasq reloads it on `SIGHUP`. Once every instance is
//! up its domain records are written as a dnsmasq configuration file and
//! the container is restarted to pick them up.
//!
//! dnsmasq lets hosts-file entries override `address=` domain answers for
//! individual names, so `couchbase0.<domain>` keeps its own address while
//! the rest of the domain answers with the workers.

use std::fmt::Write as _;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::naming::{self, Uid};
use crate::domain::output::{DOCKER_IDS, DOMAINS};
use crate::domain::OutputDocument;
use crate::error::Result;
use crate::port::outbound::container::{argv, ContainerEngine, ContainerId, RunSpec};
use crate::port::outbound::dns::{DnsRegistrar, DnsRequest, HostRecord};

/// Output key holding the started server's address.
pub const DNS: &str = "dns";

const CONFIG_FILE: &str = "/etc/dnsmasq.d/clusterup.conf";
const HOSTS_FILE: &str = "/etc/clusterup.hosts";
const START_COMMAND: &str = "apk add --no-cache dnsmasq >/dev/null \
    && mkdir -p /etc/dnsmasq.d \
    && touch /etc/clusterup.hosts \
    && exec dnsmasq --keep-in-foreground --conf-dir=/etc/dnsmasq.d \
    --addn-hosts=/etc/clusterup.hosts";

#[derive(Default)]
struct Registry {
    container: Option<ContainerId>,
    hosts: Vec<HostRecord>,
}

pub struct DnsServer {
    engine: Arc<dyn ContainerEngine>,
    image: String,
    registry: Mutex<Registry>,
}

impl DnsServer {
    pub fn new(engine: Arc<dyn ContainerEngine>, image: impl Into<String>) -> Self {
        Self {
            engine,
            image: image.into(),
            registry: Mutex::new(Registry::default()),
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        match self.registry.lock() {
            Ok(registry) => registry,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn write_file(&self, container: &ContainerId, contents: &str, path: &str) -> Result<()> {
        self.engine
            .exec(
                container,
                &argv(["sh", "-c", "printf '%s' \"$1\" > \"$2\"", "sh", contents, path]),
            )
            .await
            .map(drop)
    }
}

#[async_trait]
impl DnsRegistrar for DnsServer {
    async fn maybe_start(
        &self,
        request: &DnsRequest,
        uid: &Uid,
    ) -> Result<(Vec<String>, OutputDocument)> {
        match request {
            DnsRequest::None => Ok((Vec::new(), OutputDocument::new())),
            DnsRequest::Server(ip) => Ok((vec![ip.to_string()], OutputDocument::new())),
            DnsRequest::Auto => {
                let hostname = naming::dns_hostname(uid)?;
                let spec = RunSpec::new(&self.image, &hostname)
                    .hostname(&hostname)
                    .privileged()
                    .detached()
                    .command(START_COMMAND);
                let container = self.engine.run(&spec).await?;
                let address = self.engine.ip_address(&container).await?;
                info!(container = %container, address = %address, "Started DNS server");

                let mut registry = self.registry();
                registry.container = Some(container.clone());
                registry.hosts.push(HostRecord::new(hostname, address.clone()));
                drop(registry);

                let output = OutputDocument::new()
                    .with(DNS, address.clone())
                    .with_list(DOCKER_IDS, [container.to_string()]);
                Ok((vec![address], output))
            }
        }
    }

    async fn register_hosts(&self, hosts: &[HostRecord]) -> Result<()> {
        let (container, contents) = {
            let mut registry = self.registry();
            let Some(container) = registry.container.clone() else {
                return Ok(());
            };
            registry.hosts.extend_from_slice(hosts);
            (container, render_hosts(&registry.hosts))
        };

        self.write_file(&container, &contents, HOSTS_FILE).await?;
        self.engine
            .exec(&container, &argv(["kill", "-HUP", "1"]))
            .await?;
        debug!(container = %container, hosts = hosts.len(), "Registered hosts");
        Ok(())
    }

    async fn maybe_restart_with_configuration(
        &self,
        request: &DnsRequest,
        uid: &Uid,
        output: &OutputDocument,
    ) -> Result<()> {
        if *request != DnsRequest::Auto {
            return Ok(());
        }

        let (container, hosts) = {
            let registry = self.registry();
            let container = match &registry.container {
                Some(container) => container.clone(),
                None => ContainerId::new(naming::dns_hostname(uid)?),
            };
            (container, render_hosts(&registry.hosts))
        };
        self.write_file(&container, &hosts, HOSTS_FILE).await?;
        self.write_file(&container, &render_config(output), CONFIG_FILE)
            .await?;
        self.engine.restart(&container).await?;
        info!(container = %container, "DNS server reconfigured");
        Ok(())
    }
}

/// dnsmasq directives for every domain of `output`.
///
/// NS records delegate the domain to the listed servers, A records answer
/// for it directly.
#[must_use]
pub fn render_config(output: &OutputDocument) -> String {
    let mut config = String::new();
    let Some(Value::Object(domains)) = output.get(DOMAINS) else {
        return config;
    };

    for (domain, records) in domains {
        for ip in addresses(records, "ns") {
            let _ = writeln!(config, "server=/{domain}/{ip}");
        }
        for ip in addresses(records, "a") {
            let _ = writeln!(config, "address=/{domain}/{ip}");
        }
    }
    config
}

/// Hosts-file lines for `hosts`, one `<address> <hostname>` per record.
#[must_use]
pub fn render_hosts(hosts: &[HostRecord]) -> String {
    let mut lines = String::new();
    for host in hosts {
        let _ = writeln!(lines, "{} {}", host.address, host.hostname);
    }
    lines
}

fn addresses<'a>(records: &'a Value, kind: &str) -> impl Iterator<Item = &'a str> {
    records
        .get(kind)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}
