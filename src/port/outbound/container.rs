//! Container engine port.
//!
//! The orchestrator only ever runs, execs into, inspects and restarts
//! containers. Implementations report engine rejections as
//! [`LaunchError`](crate::error::LaunchError)s.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{LaunchError, Result};

/// Engine-assigned container identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeMode {
    ReadOnly,
    ReadWrite,
}

impl VolumeMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadOnly => "ro",
            Self::ReadWrite => "rw",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Volume {
    /// Engine-managed volume mounted at the given path.
    Anonymous { target: String },
    /// Host path bound into the container.
    Bind {
        source: PathBuf,
        target: String,
        mode: VolumeMode,
    },
}

impl Volume {
    pub fn anonymous(target: impl Into<String>) -> Self {
        Self::Anonymous {
            target: target.into(),
        }
    }

    pub fn bind(source: impl Into<PathBuf>, target: impl Into<String>, mode: VolumeMode) -> Self {
        Self::Bind {
            source: source.into(),
            target: target.into(),
            mode,
        }
    }

    /// Value of a `-v` argument.
    #[must_use]
    pub fn to_arg(&self) -> String {
        match self {
            Self::Anonymous { target } => target.clone(),
            Self::Bind {
                source,
                target,
                mode,
            } => format!("{}:{target}:{}", source.display(), mode.as_str()),
        }
    }
}

/// Everything needed to start one container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSpec {
    pub image: String,
    pub name: String,
    pub hostname: Option<String>,
    pub volumes: Vec<Volume>,
    pub dns: Vec<String>,
    pub privileged: bool,
    pub detach: bool,
    pub interactive: bool,
    pub tty: bool,
    pub workdir: Option<PathBuf>,
    /// Shell script passed to `sh -c`; the image default runs when absent.
    pub command: Option<String>,
}

impl RunSpec {
    pub fn new(image: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    #[must_use]
    pub fn volume(mut self, volume: Volume) -> Self {
        self.volumes.push(volume);
        self
    }

    #[must_use]
    pub fn volumes(mut self, volumes: impl IntoIterator<Item = Volume>) -> Self {
        self.volumes.extend(volumes);
        self
    }

    #[must_use]
    pub fn dns(mut self, servers: &[String]) -> Self {
        self.dns.extend(servers.iter().cloned());
        self
    }

    #[must_use]
    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    #[must_use]
    pub fn detached(mut self) -> Self {
        self.detach = true;
        self
    }

    /// Keeps stdin open and allocates a tty.
    #[must_use]
    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self.tty = true;
        self
    }

    #[must_use]
    pub fn workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    #[must_use]
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }
}

/// Settings document returned by [`ContainerEngine::inspect`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSettings(Value);

impl ContainerSettings {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// Address on the default bridge, falling back to the first attached
    /// network.
    #[must_use]
    pub fn ip_address(&self) -> Option<&str> {
        fn non_empty(value: &Value) -> Option<&str> {
            value.as_str().filter(|ip| !ip.is_empty())
        }

        let network = self.0.get("NetworkSettings")?;
        if let Some(ip) = network.get("IPAddress").and_then(non_empty) {
            return Some(ip);
        }
        network
            .get("Networks")?
            .as_object()?
            .values()
            .find_map(|net| net.get("IPAddress").and_then(non_empty))
    }
}

/// Builds an argv from string-like parts.
pub fn argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}

/// Port for the container engine.
///
/// # Errors
///
/// Every method fails with a [`LaunchError`] when the engine rejects the
/// request.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Starts a container and returns its id.
    async fn run(&self, spec: &RunSpec) -> Result<ContainerId>;

    /// Runs `command` inside a running container and returns its stdout.
    async fn exec(&self, container: &ContainerId, command: &[String]) -> Result<String>;

    async fn inspect(&self, container: &ContainerId) -> Result<ContainerSettings>;

    async fn restart(&self, container: &ContainerId) -> Result<()>;

    /// Network address of a running container.
    async fn ip_address(&self, container: &ContainerId) -> Result<String> {
        let settings = self.inspect(container).await?;
        settings.ip_address().map(str::to_string).ok_or_else(|| {
            LaunchError::NoAddress {
                container: container.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn volume_args_follow_engine_syntax() {
        assert_eq!(Volume::anonymous("/root/bin").to_arg(), "/root/bin");
        assert_eq!(
            Volume::bind("/opt/bin", "/opt/bin", VolumeMode::ReadOnly).to_arg(),
            "/opt/bin:/opt/bin:ro"
        );
    }

    #[test]
    fn ip_address_prefers_bridge_address() {
        let settings = ContainerSettings::new(json!({
            "NetworkSettings": {
                "IPAddress": "172.17.0.2",
                "Networks": { "custom": { "IPAddress": "10.0.0.2" } }
            }
        }));
        assert_eq!(settings.ip_address(), Some("172.17.0.2"));
    }

    #[test]
    fn ip_address_falls_back_to_attached_network() {
        let settings = ContainerSettings::new(json!({
            "NetworkSettings": {
                "IPAddress": "",
                "Networks": { "custom": { "IPAddress": "10.0.0.2" } }
            }
        }));
        assert_eq!(settings.ip_address(), Some("10.0.0.2"));
        assert_eq!(ContainerSettings::new(json!({})).ip_address(), None);
    }

    #[test]
    fn run_spec_builder_sets_flags() {
        let spec = RunSpec::new("image", "name")
            .hostname("host")
            .privileged()
            .detached()
            .interactive()
            .dns(&["10.0.0.1".to_string()]);
        assert!(spec.privileged && spec.detach && spec.interactive && spec.tty);
        assert_eq!(spec.hostname.as_deref(), Some("host"));
        assert_eq!(spec.dns, vec!["10.0.0.1"]);
    }
}
