use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Configuration-related errors with structured variants.
///
/// Raised while loading tool settings or the environment document, always
/// before any container is started.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("instance '{instance}' references unknown os_config '{os_config}'")]
    UnknownOsConfig { instance: String, os_config: String },

    #[error("unsupported db_driver '{driver}' (expected one of: couchbase, couchdb)")]
    UnsupportedDbDriver { driver: String },

    #[error("database node '{reference}' has no resolved endpoint")]
    UnresolvedDbNode { reference: String },

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse environment document: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("failed to parse settings: {0}")]
    ParseSettings(#[source] toml::de::Error),
}

/// Container engine and node materialization failures.
///
/// Fatal for the enclosing instance; containers started before the failure
/// are left running.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("failed to run container '{name}': {reason}")]
    Run { name: String, reason: String },

    #[error("command {command:?} failed in container {container}: {reason}")]
    Exec {
        container: String,
        command: Vec<String>,
        reason: String,
    },

    #[error("failed to inspect container {container}: {reason}")]
    Inspect { container: String, reason: String },

    #[error("failed to restart container {container}: {reason}")]
    Restart { container: String, reason: String },

    #[error("container {container} has no network address")]
    NoAddress { container: String },

    #[error("failed to spawn container engine: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed to issue certificate for {domain}: {reason}")]
    Certificate { domain: String, reason: String },

    #[error("failed to create log directory {path}: {source}")]
    LogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Units that never passed their health probe within the wait budget.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} unit(s) not ready after {waited:?}: {}", units.len(), units.join(", "))]
pub struct ReadinessTimeout {
    pub units: Vec<String>,
    pub waited: Duration,
}

/// Two output fragments disagree on a leaf value or on its shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("conflicting output value at '{path}'")]
pub struct MergeConflict {
    pub path: String,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Readiness(#[from] ReadinessTimeout),

    #[error(transparent)]
    Merge(#[from] MergeConflict),

    #[error("health probe error: {0}")]
    Probe(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Probe(err.to_string())
    }
}
