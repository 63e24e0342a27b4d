use std::io::Write;

use serde_json::json;
use tempfile::NamedTempFile;

use clusterup::domain::{DbDriver, DocumentKeys, EnvironmentConfig};
use clusterup::error::{ConfigError, Error};
use clusterup::infrastructure::config::settings::Settings;
use clusterup::testkit::config::{environment, node, two_worker_environment, write_environment};

const KEYS: DocumentKeys<'static> = DocumentKeys {
    app_name: "cluster_worker",
    domains_attribute: "cluster_domains",
};

fn config_error(document: serde_json::Value) -> ConfigError {
    match EnvironmentConfig::from_value(document, KEYS) {
        Err(Error::Config(error)) => error,
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

#[test]
fn environment_loads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_environment(dir.path(), &two_worker_environment(Some("couchbase"))).unwrap();

    let env = EnvironmentConfig::load(&path, KEYS).unwrap();

    assert_eq!(env.input_dir, "rel/cluster_worker");
    assert_eq!(env.instances.len(), 1);
    let instance = &env.instances[0];
    assert_eq!(instance.name, "c1");
    assert_eq!(instance.db_driver, DbDriver::Couchbase);
    let names: Vec<&str> = instance.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["worker1", "worker2"]);
    assert_eq!(instance.db_refs().len(), 2);
}

#[test]
fn missing_driver_defaults_to_couchdb() {
    let env = EnvironmentConfig::from_value(two_worker_environment(None), KEYS).unwrap();
    assert_eq!(env.instances[0].db_driver, DbDriver::Couchdb);
}

#[test]
fn node_order_follows_the_document() {
    let document = environment(
        None,
        &[
            ("worker9", node(&["cm1"], &[])),
            ("worker2", node(&["cm1"], &[])),
            ("worker5", node(&["cm1"], &[])),
        ],
    );
    let env = EnvironmentConfig::from_value(document, KEYS).unwrap();
    let names: Vec<&str> = env.instances[0].nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["worker9", "worker2", "worker5"]);
}

#[test]
fn os_config_is_resolved_by_name() {
    let mut document = environment(None, &[("worker1", node(&["cm1"], &[]))]);
    document["os_configs"] = json!({
        "cfg1": { "users": ["user1"], "groups": { "group1": ["user1"] } }
    });
    document["cluster_domains"]["c1"]["os_config"] = json!("cfg1");

    let env = EnvironmentConfig::from_value(document, KEYS).unwrap();
    let os_config = env.instances[0].os_config.as_ref().unwrap();
    assert_eq!(os_config.users, vec!["user1"]);
    assert_eq!(os_config.groups["group1"], vec!["user1"]);
}

#[test]
fn unknown_os_config_is_rejected() {
    let mut document = environment(None, &[("worker1", node(&["cm1"], &[]))]);
    document["cluster_domains"]["c1"]["os_config"] = json!("missing");

    assert!(matches!(
        config_error(document),
        ConfigError::UnknownOsConfig { ref os_config, .. } if os_config == "missing"
    ));
}

#[test]
fn remote_database_host_is_rejected() {
    let mut document = two_worker_environment(Some("couchbase"));
    document["cluster_domains"]["c1"]["db_docker_host"] = json!("tcp://10.0.0.7:2375");

    assert!(matches!(
        config_error(document),
        ConfigError::InvalidValue { ref field, .. } if field == "cluster_domains.c1.db_docker_host"
    ));
}

#[test]
fn unsupported_driver_is_rejected() {
    assert!(matches!(
        config_error(two_worker_environment(Some("mongodb"))),
        ConfigError::UnsupportedDbDriver { ref driver } if driver == "mongodb"
    ));
}

#[test]
fn node_without_db_nodes_is_rejected() {
    let mut worker = node(&["cm1"], &[]);
    worker["sys.config"]["cluster_worker"]
        .as_object_mut()
        .unwrap()
        .remove("db_nodes");
    let document = environment(None, &[("worker1", worker)]);

    assert!(matches!(
        config_error(document),
        ConfigError::MissingField { ref field } if field.ends_with("db_nodes")
    ));
}

#[test]
fn missing_input_dir_is_rejected() {
    let mut document = two_worker_environment(None);
    document.as_object_mut().unwrap().remove("dirs_config");

    assert!(matches!(
        config_error(document),
        ConfigError::MissingField { ref field } if field == "dirs_config.cluster_worker.input_dir"
    ));
}

#[test]
fn dotted_node_names_are_rejected() {
    let document = environment(None, &[("worker.1", node(&["cm1"], &[]))]);
    assert!(matches!(config_error(document), ConfigError::InvalidName { .. }));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let result = EnvironmentConfig::from_json("{ not json", KEYS);
    assert!(matches!(result, Err(Error::Config(ConfigError::Parse(_)))));
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");

    match EnvironmentConfig::load(&path, KEYS) {
        Err(Error::Config(ConfigError::ReadFile { path: reported, .. })) => assert_eq!(reported, path),
        other => panic!("expected a read error, got {other:?}"),
    }
}

#[test]
fn settings_file_overrides_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[logging]
level = "debug"
format = "json"

[timeouts]
cluster_ready_secs = 30
poll_interval_ms = 250

[docker]
binary = "podman"
"#
    )
    .unwrap();

    let settings = Settings::load(file.path()).unwrap();

    assert_eq!(settings.logging.level, "debug");
    assert_eq!(settings.logging.format, "json");
    assert_eq!(settings.timeouts.cluster_ready_secs, 30);
    assert_eq!(settings.timeouts.couchbase_ready_secs, 60);
    assert_eq!(
        settings.timeouts.cluster_poller().interval(),
        std::time::Duration::from_millis(250)
    );
    assert_eq!(settings.docker.binary, "podman");
}

#[test]
fn absent_settings_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load_or_default(dir.path().join("settings.toml")).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn unknown_settings_table_is_rejected() {
    let result = Settings::parse_toml("[metrics]\nenabled = true\n");
    assert!(matches!(result, Err(Error::Config(ConfigError::ParseSettings(_)))));
}

#[test]
fn zero_timeout_is_rejected() {
    let result = Settings::parse_toml("[timeouts]\nceph_ready_secs = 0\n");
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidValue { ref field, .. })) if field == "timeouts.ceph_ready_secs"
    ));
}

#[test]
fn unknown_log_format_is_rejected() {
    let result = Settings::parse_toml("[logging]\nformat = \"xml\"\n");
    assert!(matches!(result, Err(Error::Config(ConfigError::InvalidValue { .. }))));
}
