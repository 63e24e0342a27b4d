//! Typed environment document.
//!
//! The environment document is JSON shaped like:
//!
//! ```json
//! {
//!   "dirs_config": { "cluster_worker": { "input_dir": "rel/cluster_worker" } },
//!   "os_configs": { "cfg1": { "users": ["user1"], "groups": { "group1": ["user1"] } } },
//!   "cluster_domains": {
//!     "c1": {
//!       "db_driver": "couchbase",
//!       "os_config": "cfg1",
//!       "cluster_worker": {
//!         "worker1": {
//!           "vm.args": { "setcookie": "cookie" },
//!           "sys.config": {
//!             "cluster_worker": { "cm_nodes": ["cm1"], "db_nodes": ["db1"] }
//!           }
//!         }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! The `cluster_domains` and `cluster_worker` keys depend on the role, see
//! [`DocumentKeys`]. The document is validated once here; the orchestrator
//! only ever sees the typed values.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::naming::validate_name;
use crate::error::{ConfigError, Error, Result};

const CM_NODES: &str = "cm_nodes";
const DB_NODES: &str = "db_nodes";

/// Role-specific keys used to locate instances and node sections.
#[derive(Debug, Clone, Copy)]
pub struct DocumentKeys<'a> {
    /// Application name, e.g. `cluster_worker`.
    pub app_name: &'a str,
    /// Top-level key holding the instances, e.g. `cluster_domains`.
    pub domains_attribute: &'a str,
}

/// Persistence driver a cluster uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DbDriver {
    Couchbase,
    #[default]
    Couchdb,
}

impl DbDriver {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Couchbase => "couchbase",
            Self::Couchdb => "couchdb",
        }
    }

    /// Name of the module implementing this driver inside the worker.
    #[must_use]
    pub fn driver_module(&self) -> String {
        format!("{}_datastore_driver", self.as_str())
    }
}

impl fmt::Display for DbDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DbDriver {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "couchbase" => Ok(Self::Couchbase),
            "couchdb" => Ok(Self::Couchdb),
            other => Err(ConfigError::UnsupportedDbDriver {
                driver: other.to_string(),
            }),
        }
    }
}

/// Logical database node identifier as written in a node's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DbNodeRef(String);

impl DbNodeRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DbNodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Concrete database connection endpoint (`host:port`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbEndpoint(String);

impl DbEndpoint {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DbEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Logical identifier to endpoint table of one instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbNodeMapping(BTreeMap<DbNodeRef, DbEndpoint>);

impl DbNodeMapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: DbNodeRef, endpoint: DbEndpoint) {
        self.0.insert(reference, endpoint);
    }

    #[must_use]
    pub fn get(&self, reference: &DbNodeRef) -> Option<&DbEndpoint> {
        self.0.get(reference)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Endpoints for `references`, in order.
    pub fn resolve(&self, references: &[DbNodeRef]) -> Result<Vec<DbEndpoint>> {
        references
            .iter()
            .map(|reference| {
                self.get(reference).cloned().ok_or_else(|| {
                    Error::from(ConfigError::UnresolvedDbNode {
                        reference: reference.to_string(),
                    })
                })
            })
            .collect()
    }
}

/// OS-level users and groups to create in every node of an instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsConfig {
    #[serde(default)]
    pub users: Vec<String>,
    /// Group name to member users.
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
}

/// One worker node as declared in the environment document.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    pub name: String,
    /// Cluster-manager names as written in the document (`cm1`, ...).
    pub cm_nodes: Vec<String>,
    pub db_nodes: Vec<DbNodeRef>,
    /// Remaining entries of the role's application section.
    pub app_env: Map<String, Value>,
    /// Sections of `sys.config` belonging to other applications.
    pub sys_config: Map<String, Value>,
    pub vm_args: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceConfig {
    pub name: String,
    pub db_driver: DbDriver,
    pub os_config: Option<OsConfig>,
    pub gui_override: Option<Value>,
    pub nodes: Vec<NodeConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentConfig {
    pub input_dir: String,
    /// Instances in document order.
    pub instances: Vec<InstanceConfig>,
}

#[derive(Deserialize)]
struct RawInstance {
    db_driver: Option<String>,
    os_config: Option<String>,
    gui_override: Option<Value>,
    db_docker_host: Option<Value>,
    #[serde(flatten)]
    sections: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawNode {
    #[serde(rename = "sys.config")]
    sys_config: Map<String, Value>,
    #[serde(rename = "vm.args", default)]
    vm_args: Map<String, Value>,
}

impl EnvironmentConfig {
    /// Reads and validates an environment document from disk.
    pub fn load<P: AsRef<Path>>(path: P, keys: DocumentKeys<'_>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content, keys)
    }

    pub fn from_json(content: &str, keys: DocumentKeys<'_>) -> Result<Self> {
        let value: Value = serde_json::from_str(content).map_err(ConfigError::Parse)?;
        Self::from_value(value, keys)
    }

    pub fn from_value(value: Value, keys: DocumentKeys<'_>) -> Result<Self> {
        let Value::Object(mut document) = value else {
            return Err(invalid("document", "expected a JSON object").into());
        };

        let input_dir = document
            .get("dirs_config")
            .and_then(|dirs| dirs.get(keys.app_name))
            .and_then(|dirs| dirs.get("input_dir"))
            .and_then(Value::as_str)
            .ok_or_else(|| missing(format!("dirs_config.{}.input_dir", keys.app_name)))?
            .to_string();

        let os_configs = match document.remove("os_configs") {
            Some(Value::Object(map)) => map,
            Some(_) => return Err(invalid("os_configs", "expected an object").into()),
            None => Map::new(),
        };

        let instances = match document.remove(keys.domains_attribute) {
            Some(Value::Object(map)) => map,
            Some(_) => return Err(invalid(keys.domains_attribute, "expected an object").into()),
            None => return Err(missing(keys.domains_attribute).into()),
        };
        if instances.is_empty() {
            return Err(invalid(keys.domains_attribute, "no instances declared").into());
        }

        let instances = instances
            .into_iter()
            .map(|(name, raw)| parse_instance(name, raw, &os_configs, keys))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            input_dir,
            instances,
        })
    }
}

impl InstanceConfig {
    /// Every database reference of every node, in node order.
    #[must_use]
    pub fn db_refs(&self) -> Vec<DbNodeRef> {
        self.nodes
            .iter()
            .flat_map(|node| node.db_nodes.iter().cloned())
            .collect()
    }
}

fn parse_instance(
    name: String,
    raw: Value,
    os_configs: &Map<String, Value>,
    keys: DocumentKeys<'_>,
) -> Result<InstanceConfig> {
    validate_name(&name)?;
    let field = format!("{}.{name}", keys.domains_attribute);
    let mut raw: RawInstance =
        serde_json::from_value(raw).map_err(|e| invalid(&field, e.to_string()))?;

    if raw.db_docker_host.is_some() {
        return Err(invalid(
            format!("{field}.db_docker_host"),
            "databases on a remote docker host are not supported",
        )
        .into());
    }

    let db_driver = match raw.db_driver.as_deref() {
        Some(driver) => driver.parse::<DbDriver>()?,
        None => DbDriver::default(),
    };

    let os_config = match raw.os_config {
        Some(os_config) => {
            let entry = os_configs
                .get(&os_config)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownOsConfig {
                    instance: name.clone(),
                    os_config: os_config.clone(),
                })?;
            let parsed: OsConfig = serde_json::from_value(entry)
                .map_err(|e| invalid(format!("os_configs.{os_config}"), e.to_string()))?;
            Some(parsed)
        }
        None => None,
    };

    let nodes_field = format!("{field}.{}", keys.app_name);
    let nodes = match raw.sections.remove(keys.app_name) {
        Some(Value::Object(nodes)) => nodes,
        Some(_) => return Err(invalid(&nodes_field, "expected an object").into()),
        None => return Err(missing(nodes_field).into()),
    };
    if nodes.is_empty() {
        return Err(invalid(&nodes_field, "no nodes declared").into());
    }

    let nodes = nodes
        .into_iter()
        .map(|(node, raw)| parse_node(node, raw, &nodes_field, keys.app_name))
        .collect::<Result<Vec<_>>>()?;

    Ok(InstanceConfig {
        name,
        db_driver,
        os_config,
        gui_override: raw.gui_override,
        nodes,
    })
}

fn parse_node(name: String, raw: Value, parent: &str, app_name: &str) -> Result<NodeConfig> {
    validate_name(&name)?;
    let field = format!("{parent}.{name}");
    let RawNode {
        mut sys_config,
        vm_args,
    } = serde_json::from_value(raw).map_err(|e| invalid(&field, e.to_string()))?;

    let app_field = format!("{field}.sys.config.{app_name}");
    let mut app_env = match sys_config.remove(app_name) {
        Some(Value::Object(env)) => env,
        Some(_) => return Err(invalid(&app_field, "expected an object").into()),
        None => return Err(missing(app_field).into()),
    };

    let cm_nodes = take_string_list(&mut app_env, CM_NODES, &app_field)?;
    for cm in &cm_nodes {
        validate_name(cm)?;
    }
    let db_nodes = take_string_list(&mut app_env, DB_NODES, &app_field)?
        .into_iter()
        .map(DbNodeRef::new)
        .collect();

    Ok(NodeConfig {
        name,
        cm_nodes,
        db_nodes,
        app_env,
        sys_config,
        vm_args,
    })
}

fn take_string_list(env: &mut Map<String, Value>, key: &str, parent: &str) -> Result<Vec<String>> {
    let field = format!("{parent}.{key}");
    let Some(value) = env.remove(key) else {
        return Err(missing(field).into());
    };
    serde_json::from_value(value).map_err(|_| invalid(&field, "expected a list of strings").into())
}

fn missing(field: impl Into<String>) -> ConfigError {
    ConfigError::MissingField {
        field: field.into(),
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEYS: DocumentKeys<'static> = DocumentKeys {
        app_name: "cluster_worker",
        domains_attribute: "cluster_domains",
    };

    fn document(instance: Value) -> Value {
        json!({
            "dirs_config": { "cluster_worker": { "input_dir": "rel/cluster_worker" } },
            "os_configs": {
                "cfg1": { "users": ["user1"], "groups": { "group1": ["user1"] } }
            },
            "cluster_domains": { "c1": instance }
        })
    }

    fn node(db_nodes: Value) -> Value {
        json!({
            "vm.args": { "setcookie": "cookie" },
            "sys.config": {
                "cluster_worker": {
                    "cm_nodes": ["cm1"],
                    "db_nodes": db_nodes,
                    "verify_oz_cert": false
                },
                "lager": { "handlers": [] }
            }
        })
    }

    #[test]
    fn parses_typed_instance() {
        let env = EnvironmentConfig::from_value(
            document(json!({
                "db_driver": "couchbase",
                "os_config": "cfg1",
                "gui_override": { "livereload": true },
                "cluster_worker": { "worker1": node(json!(["db1"])) }
            })),
            KEYS,
        )
        .unwrap();

        assert_eq!(env.input_dir, "rel/cluster_worker");
        let instance = &env.instances[0];
        assert_eq!(instance.name, "c1");
        assert_eq!(instance.db_driver, DbDriver::Couchbase);
        assert_eq!(
            instance.os_config.as_ref().map(|os| os.users.clone()),
            Some(vec!["user1".to_string()])
        );
        assert_eq!(instance.gui_override, Some(json!({ "livereload": true })));

        let worker = &instance.nodes[0];
        assert_eq!(worker.cm_nodes, vec!["cm1"]);
        assert_eq!(worker.db_nodes, vec![DbNodeRef::new("db1")]);
        assert_eq!(worker.app_env.get("verify_oz_cert"), Some(&json!(false)));
        assert!(worker.sys_config.contains_key("lager"));
        assert!(!worker.app_env.contains_key("db_nodes"));
    }

    #[test]
    fn driver_defaults_to_couchdb() {
        let env = EnvironmentConfig::from_value(
            document(json!({ "cluster_worker": { "worker1": node(json!([])) } })),
            KEYS,
        )
        .unwrap();
        assert_eq!(env.instances[0].db_driver, DbDriver::Couchdb);
        assert_eq!(
            env.instances[0].db_driver.driver_module(),
            "couchdb_datastore_driver"
        );
    }

    #[test]
    fn rejects_unsupported_driver() {
        let result = EnvironmentConfig::from_value(
            document(json!({
                "db_driver": "mongodb",
                "cluster_worker": { "worker1": node(json!(["db1"])) }
            })),
            KEYS,
        );
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::UnsupportedDbDriver { ref driver })) if driver == "mongodb"
        ));
    }

    #[test]
    fn rejects_unknown_os_config() {
        let result = EnvironmentConfig::from_value(
            document(json!({
                "os_config": "missing",
                "cluster_worker": { "worker1": node(json!([])) }
            })),
            KEYS,
        );
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::UnknownOsConfig { .. }))
        ));
    }

    #[test]
    fn rejects_node_without_db_nodes() {
        let result = EnvironmentConfig::from_value(
            document(json!({
                "cluster_worker": {
                    "worker1": { "sys.config": { "cluster_worker": { "cm_nodes": [] } } }
                }
            })),
            KEYS,
        );
        match result {
            Err(Error::Config(ConfigError::MissingField { field })) => {
                assert!(field.ends_with("db_nodes"), "unexpected field {field}");
            }
            other => panic!("expected missing db_nodes, got {other:?}"),
        }
    }

    #[test]
    fn preserves_document_order() {
        let env = EnvironmentConfig::from_json(
            r#"{
                "dirs_config": { "cluster_worker": { "input_dir": "in" } },
                "cluster_domains": {
                    "zeta": { "cluster_worker": {
                        "w2": { "sys.config": { "cluster_worker": { "cm_nodes": [], "db_nodes": [] } } },
                        "w1": { "sys.config": { "cluster_worker": { "cm_nodes": [], "db_nodes": [] } } }
                    } },
                    "alpha": { "cluster_worker": {
                        "w1": { "sys.config": { "cluster_worker": { "cm_nodes": [], "db_nodes": [] } } }
                    } }
                }
            }"#,
            KEYS,
        )
        .unwrap();

        let instances: Vec<_> = env.instances.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(instances, vec!["zeta", "alpha"]);
        let nodes: Vec<_> = env.instances[0]
            .nodes
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(nodes, vec!["w2", "w1"]);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let result = EnvironmentConfig::from_json("{ not json", KEYS);
        assert!(matches!(result, Err(Error::Config(ConfigError::Parse(_)))));
    }

    #[test]
    fn mapping_resolution_reports_missing_refs() {
        let mut mapping = DbNodeMapping::new();
        mapping.insert(DbNodeRef::new("db1"), DbEndpoint::new("host:11211"));

        let resolved = mapping.resolve(&[DbNodeRef::new("db1")]).unwrap();
        assert_eq!(resolved, vec![DbEndpoint::new("host:11211")]);

        let missing = mapping.resolve(&[DbNodeRef::new("db2")]);
        assert!(matches!(
            missing,
            Err(Error::Config(ConfigError::UnresolvedDbNode { .. }))
        ));
    }
}
