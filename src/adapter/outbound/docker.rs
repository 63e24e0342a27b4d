//! Container engine backed by the `docker` command-line client.

use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::error::{LaunchError, Result};
use crate::port::outbound::container::{ContainerEngine, ContainerId, ContainerSettings, RunSpec};

pub struct DockerCli {
    binary: String,
}

impl DockerCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn invoke(&self, args: &[String]) -> Result<Output> {
        trace!(binary = %self.binary, ?args, "Invoking container engine");
        Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|e| LaunchError::Spawn(e).into())
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

/// Arguments of `docker run` for `spec`.
#[must_use]
pub fn run_args(spec: &RunSpec) -> Vec<String> {
    let mut args = vec!["run".to_string()];
    if spec.detach {
        args.push("--detach".to_string());
    }
    if spec.interactive {
        args.push("--interactive".to_string());
    }
    if spec.tty {
        args.push("--tty".to_string());
    }
    if spec.privileged {
        args.push("--privileged".to_string());
    }
    args.extend(["--name".to_string(), spec.name.clone()]);
    if let Some(hostname) = &spec.hostname {
        args.extend(["--hostname".to_string(), hostname.clone()]);
    }
    if let Some(workdir) = &spec.workdir {
        args.extend(["--workdir".to_string(), workdir.display().to_string()]);
    }
    for volume in &spec.volumes {
        args.extend(["--volume".to_string(), volume.to_arg()]);
    }
    for server in &spec.dns {
        args.extend(["--dns".to_string(), server.clone()]);
    }
    args.push(spec.image.clone());
    if let Some(command) = &spec.command {
        args.extend(["sh".to_string(), "-c".to_string(), command.clone()]);
    }
    args
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn failure_of(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    match output.status.code() {
        Some(code) if stderr.is_empty() => format!("exit code {code}"),
        Some(code) => format!("exit code {code}: {stderr}"),
        None => format!("terminated by signal: {stderr}"),
    }
}

#[async_trait]
impl ContainerEngine for DockerCli {
    async fn run(&self, spec: &RunSpec) -> Result<ContainerId> {
        let output = self.invoke(&run_args(spec)).await?;
        if !output.status.success() {
            return Err(LaunchError::Run {
                name: spec.name.clone(),
                reason: failure_of(&output),
            }
            .into());
        }
        let id = stdout_of(&output).trim().to_string();
        debug!(name = %spec.name, id = %id, "Container started");
        Ok(ContainerId::new(id))
    }

    async fn exec(&self, container: &ContainerId, command: &[String]) -> Result<String> {
        let mut args = vec!["exec".to_string(), container.to_string()];
        args.extend(command.iter().cloned());
        let output = self.invoke(&args).await?;
        if !output.status.success() {
            return Err(LaunchError::Exec {
                container: container.to_string(),
                command: command.to_vec(),
                reason: failure_of(&output),
            }
            .into());
        }
        Ok(stdout_of(&output))
    }

    async fn inspect(&self, container: &ContainerId) -> Result<ContainerSettings> {
        let output = self
            .invoke(&["inspect".to_string(), container.to_string()])
            .await?;
        if !output.status.success() {
            return Err(LaunchError::Inspect {
                container: container.to_string(),
                reason: failure_of(&output),
            }
            .into());
        }
        let mut documents: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout)
            .map_err(|e| LaunchError::Inspect {
                container: container.to_string(),
                reason: e.to_string(),
            })?;
        if documents.is_empty() {
            return Err(LaunchError::Inspect {
                container: container.to_string(),
                reason: "no such container".to_string(),
            }
            .into());
        }
        Ok(ContainerSettings::new(documents.swap_remove(0)))
    }

    async fn restart(&self, container: &ContainerId) -> Result<()> {
        let output = self
            .invoke(&["restart".to_string(), container.to_string()])
            .await?;
        if !output.status.success() {
            return Err(LaunchError::Restart {
                container: container.to_string(),
                reason: failure_of(&output),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::outbound::container::{Volume, VolumeMode};

    #[test]
    fn run_args_place_command_after_image() {
        let spec = RunSpec::new("worker:latest", "worker1.c1.1.dev")
            .hostname("worker1.c1.1.dev")
            .detached()
            .interactive()
            .privileged()
            .workdir("/opt/src")
            .volume(Volume::anonymous("/root/bin"))
            .volume(Volume::bind("/opt/src", "/opt/src", VolumeMode::ReadOnly))
            .dns(&["172.17.0.2".to_string()])
            .command("echo hi");
        let args = run_args(&spec);

        assert_eq!(args[0], "run");
        for flag in ["--detach", "--interactive", "--tty", "--privileged"] {
            assert!(args.contains(&flag.to_string()), "missing {flag}");
        }
        let image = args.iter().position(|a| a == "worker:latest").unwrap();
        assert_eq!(&args[image + 1..], ["sh", "-c", "echo hi"]);
        assert!(args.windows(2).any(|w| w == ["--volume", "/opt/src:/opt/src:ro"]));
        assert!(args.windows(2).any(|w| w == ["--dns", "172.17.0.2"]));
        assert!(args.windows(2).any(|w| w == ["--workdir", "/opt/src"]));
    }

    #[test]
    fn run_args_without_command_end_with_image() {
        let args = run_args(&RunSpec::new("couchbase", "cb0"));
        assert_eq!(args, vec!["run", "--name", "cb0", "couchbase"]);
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let engine = DockerCli::new("/nonexistent/docker-binary");
        let result = engine.restart(&ContainerId::new("abc")).await;
        assert!(matches!(
            result,
            Err(crate::error::Error::Launch(LaunchError::Spawn(_)))
        ));
    }
}
