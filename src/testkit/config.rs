//! Canonical test configurations.
//!
//! Single source of truth for settings and environment documents used
//! across tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use crate::adapter::outbound::dns::DnsServer;
use crate::application::role::ClusterWorker;
use crate::application::{
    BringUpOptions, Orchestrator, OrchestratorSettings, ReadinessPoller,
};
use crate::domain::Uid;
use crate::port::outbound::container::ContainerEngine;
use crate::port::outbound::dns::DnsRequest;

use super::engine::RecordingEngine;
use super::probe::{ScriptedProbe, StaticCa};

/// Poll interval used by every fast poller.
pub const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Poller that gives up after `timeout_ms`.
#[must_use]
pub fn poller(timeout_ms: u64) -> ReadinessPoller {
    ReadinessPoller::new(POLL_INTERVAL, Duration::from_millis(timeout_ms))
}

/// Orchestrator settings with sub-second budgets.
#[must_use]
pub fn orchestrator_settings() -> OrchestratorSettings {
    OrchestratorSettings {
        node_ready: poller(200),
        database_ready: poller(200),
        couchbase_image: "couchbase:test".to_string(),
    }
}

/// Orchestrator over the recording engine, a cluster worker role using
/// `probe`, a real DNS registrar and a static CA.
#[must_use]
pub fn orchestrator(engine: Arc<RecordingEngine>, probe: Arc<ScriptedProbe>) -> Orchestrator {
    let engine: Arc<dyn ContainerEngine> = engine;
    Orchestrator::new(
        Arc::clone(&engine),
        Arc::new(ClusterWorker::new(probe)),
        Arc::new(DnsServer::new(engine, "dns:test")),
        Arc::new(StaticCa::new()),
        orchestrator_settings(),
    )
}

/// Bring-up options with a fixed uid and no DNS server.
#[must_use]
pub fn options(uid: &str) -> BringUpOptions {
    BringUpOptions {
        image: "worker:test".to_string(),
        bindir: PathBuf::from("/opt/src"),
        logdir: None,
        dns: DnsRequest::None,
        uid: Uid::new(uid).unwrap_or_else(|_| Uid::generate()),
    }
}

/// Node entry of the cluster worker environment document.
#[must_use]
pub fn node(cm_nodes: &[&str], db_nodes: &[&str]) -> Value {
    json!({
        "vm.args": { "setcookie": "cookie" },
        "sys.config": {
            "cluster_worker": {
                "cm_nodes": cm_nodes,
                "db_nodes": db_nodes,
                "verify_oz_cert": false
            }
        }
    })
}

/// Environment document with one instance `c1` of `nodes`.
#[must_use]
pub fn environment(db_driver: Option<&str>, nodes: &[(&str, Value)]) -> Value {
    let mut instance = serde_json::Map::new();
    if let Some(driver) = db_driver {
        instance.insert("db_driver".to_string(), json!(driver));
    }
    let nodes: serde_json::Map<String, Value> = nodes
        .iter()
        .map(|(name, node)| ((*name).to_string(), node.clone()))
        .collect();
    instance.insert("cluster_worker".to_string(), Value::Object(nodes));

    json!({
        "dirs_config": { "cluster_worker": { "input_dir": "rel/cluster_worker" } },
        "cluster_domains": { "c1": instance }
    })
}

/// Two workers sharing the database node `db1`.
#[must_use]
pub fn two_worker_environment(db_driver: Option<&str>) -> Value {
    environment(
        db_driver,
        &[
            ("worker1", node(&["cm1"], &["db1"])),
            ("worker2", node(&["cm1"], &["db1"])),
        ],
    )
}

/// Writes `document` to `dir/env.json`.
pub fn write_environment(dir: &Path, document: &Value) -> std::io::Result<PathBuf> {
    let path = dir.join("env.json");
    std::fs::write(&path, serde_json::to_string_pretty(document)?)?;
    Ok(path)
}
