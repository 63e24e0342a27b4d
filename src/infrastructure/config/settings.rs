//! Tool settings loading and validation.
//!
//! Settings are read from an optional TOML file; every table and key has a
//! default, so an empty file (or no file) is a valid configuration.
//!
//! # Example
//!
//! ```no_run
//! use clusterup::infrastructure::config::settings::Settings;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load("settings.toml")?;
//!     settings.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::logging::LoggingConfig;
use crate::application::ReadinessPoller;
use crate::error::{ConfigError, Result};

/// How long to wait for each kind of container.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Worker nodes of one instance, measured from the last launch.
    pub cluster_ready_secs: u64,
    pub couchbase_ready_secs: u64,
    pub ceph_ready_secs: u64,
    /// Pause between readiness probe rounds.
    pub poll_interval_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            cluster_ready_secs: 120,
            couchbase_ready_secs: 60,
            ceph_ready_secs: 60,
            poll_interval_ms: 1000,
        }
    }
}

impl TimeoutsConfig {
    fn poller(&self, secs: u64) -> ReadinessPoller {
        ReadinessPoller::new(
            Duration::from_millis(self.poll_interval_ms),
            Duration::from_secs(secs),
        )
    }

    #[must_use]
    pub fn cluster_poller(&self) -> ReadinessPoller {
        self.poller(self.cluster_ready_secs)
    }

    #[must_use]
    pub fn couchbase_poller(&self) -> ReadinessPoller {
        self.poller(self.couchbase_ready_secs)
    }

    #[must_use]
    pub fn ceph_poller(&self) -> ReadinessPoller {
        self.poller(self.ceph_ready_secs)
    }
}

/// Images of the helper containers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub couchbase: String,
    pub dns: String,
    pub ceph: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            couchbase: "couchbase/server:community-4.5.1".into(),
            dns: "alpine:3.19".into(),
            ceph: "ceph/demo:tag-stable-3.0-jewel-ubuntu-16.04".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Container engine client executable.
    pub binary: String,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            binary: "docker".into(),
        }
    }
}

/// Main tool settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub timeouts: TimeoutsConfig,
    pub images: ImagesConfig,
    pub docker: DockerConfig,
}

impl Settings {
    /// Parse settings from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content).map_err(ConfigError::ParseSettings)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_toml(&content)
    }

    /// Load `path` when it exists, defaults otherwise.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(invalid("logging.format", "must be 'pretty' or 'json'"));
        }
        if self.timeouts.poll_interval_ms == 0 {
            return Err(invalid("timeouts.poll_interval_ms", "must be greater than 0"));
        }
        for (field, secs) in [
            ("timeouts.cluster_ready_secs", self.timeouts.cluster_ready_secs),
            ("timeouts.couchbase_ready_secs", self.timeouts.couchbase_ready_secs),
            ("timeouts.ceph_ready_secs", self.timeouts.ceph_ready_secs),
        ] {
            if secs == 0 {
                return Err(invalid(field, "must be greater than 0"));
            }
        }
        for (field, value) in [
            ("images.couchbase", &self.images.couchbase),
            ("images.dns", &self.images.dns),
            ("images.ceph", &self.images.ceph),
            ("docker.binary", &self.docker.binary),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Initialize logging from these settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

fn invalid(field: &str, reason: &str) -> crate::error::Error {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
    .into()
}
