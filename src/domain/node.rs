//! Per-node configuration values on their way to a container.
//!
//! A [`PreparedNode`] has its names, cluster-manager peers and domain filled
//! in but still references database nodes by logical identifier. Resolving
//! it against the instance's [`DbNodeMapping`] yields a [`LaunchableNode`],
//! which only holds concrete endpoints.

use serde_json::{json, Map, Value};

use super::environment::{DbDriver, DbEndpoint, DbNodeMapping, DbNodeRef, OsConfig};
use crate::error::Result;

/// Directory the node release is generated into inside the container.
pub const TARGET_DIR: &str = "/root/bin";

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedNode {
    /// Name of the node inside its instance (`worker1`).
    pub name: String,
    pub instance: String,
    /// Runtime node name (`worker@worker1.c1.<uid>.dev`).
    pub node_name: String,
    pub hostname: String,
    pub domain: String,
    pub cm_nodes: Vec<String>,
    pub db_nodes: Vec<DbNodeRef>,
    pub app_env: Map<String, Value>,
    pub sys_config: Map<String, Value>,
    pub vm_args: Map<String, Value>,
    pub db_driver: DbDriver,
    pub input_dir: String,
    pub os_config: Option<OsConfig>,
    pub gui_override: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaunchableNode {
    pub name: String,
    pub instance: String,
    pub node_name: String,
    pub hostname: String,
    pub domain: String,
    pub cm_nodes: Vec<String>,
    pub db_nodes: Vec<DbEndpoint>,
    pub app_env: Map<String, Value>,
    pub sys_config: Map<String, Value>,
    pub vm_args: Map<String, Value>,
    pub db_driver: DbDriver,
    pub input_dir: String,
    pub os_config: Option<OsConfig>,
    pub gui_override: Option<Value>,
}

impl PreparedNode {
    /// Substitutes every database reference with its endpoint.
    pub fn resolve(self, mapping: &DbNodeMapping) -> Result<LaunchableNode> {
        let db_nodes = mapping.resolve(&self.db_nodes)?;
        Ok(LaunchableNode {
            name: self.name,
            instance: self.instance,
            node_name: self.node_name,
            hostname: self.hostname,
            domain: self.domain,
            cm_nodes: self.cm_nodes,
            db_nodes,
            app_env: self.app_env,
            sys_config: self.sys_config,
            vm_args: self.vm_args,
            db_driver: self.db_driver,
            input_dir: self.input_dir,
            os_config: self.os_config,
            gui_override: self.gui_override,
        })
    }
}

impl LaunchableNode {
    /// The `sys.config` document with the role's application section rebuilt.
    #[must_use]
    pub fn sys_config_document(&self, app_name: &str) -> Value {
        let mut app_env = self.app_env.clone();
        app_env.insert("cm_nodes".to_string(), json!(self.cm_nodes));
        app_env.insert(
            "db_nodes".to_string(),
            Value::Array(
                self.db_nodes
                    .iter()
                    .map(|endpoint| Value::String(endpoint.to_string()))
                    .collect(),
            ),
        );

        let mut sys_config = self.sys_config.clone();
        // Sections sharing the application's name were folded into `app_env`
        // when the node was prepared.
        match sys_config.get_mut(app_name) {
            Some(Value::Object(existing)) => existing.extend(app_env),
            _ => {
                sys_config.insert(app_name.to_string(), Value::Object(app_env));
            }
        }
        Value::Object(sys_config)
    }

    /// Generator arguments consumed by the release tooling inside the
    /// container.
    #[must_use]
    pub fn node_document(&self, app_name: &str) -> Value {
        let mut document = Map::new();
        document.insert(
            "config".to_string(),
            json!({ "input_dir": self.input_dir, "target_dir": TARGET_DIR }),
        );
        document.insert(
            "nodes".to_string(),
            json!({
                "node": {
                    "vm.args": self.vm_args,
                    "sys.config": self.sys_config_document(app_name),
                }
            }),
        );
        document.insert("db_driver".to_string(), json!(self.db_driver.as_str()));
        if let Some(os_config) = &self.os_config {
            document.insert("os_config".to_string(), json!(os_config));
        }
        if let Some(gui_override) = &self.gui_override {
            document.insert("gui_override".to_string(), gui_override.clone());
        }
        let mut wrapper = Map::new();
        wrapper.insert(app_name.to_string(), Value::Object(document));
        Value::Object(wrapper)
    }
}
