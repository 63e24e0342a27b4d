//! Per-node container launch.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::application::script::{effective_ids, StartupScript};
use crate::domain::environment::OsConfig;
use crate::domain::naming::posix_id;
use crate::domain::node::TARGET_DIR;
use crate::domain::output::DOCKER_IDS;
use crate::domain::{LaunchableNode, OutputDocument};
use crate::error::{LaunchError, Result};
use crate::port::inbound::role::Role;
use crate::port::outbound::certificate::CertificateAuthority;
use crate::port::outbound::container::{
    argv, ContainerEngine, ContainerId, RunSpec, Volume, VolumeMode,
};

/// Where the release writes its logs inside the container.
pub const NODE_LOG_DIR: &str = "/root/bin/node/log";

/// Launch parameters shared by every node of a bring-up.
#[derive(Debug, Clone, Copy)]
pub struct LaunchOptions<'a> {
    pub image: &'a str,
    /// Absolute path of the source tree, mounted read-only at the same path.
    pub bindir: &'a Path,
    pub dns_servers: &'a [String],
    /// Host directory receiving one log subdirectory per node.
    pub logdir: Option<&'a Path>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaunchedNode {
    pub container: ContainerId,
    pub output: OutputDocument,
}

pub struct NodeLauncher<'a> {
    engine: &'a dyn ContainerEngine,
    ca: &'a dyn CertificateAuthority,
    role: &'a dyn Role,
}

impl<'a> NodeLauncher<'a> {
    #[must_use]
    pub fn new(
        engine: &'a dyn ContainerEngine,
        ca: &'a dyn CertificateAuthority,
        role: &'a dyn Role,
    ) -> Self {
        Self { engine, ca, role }
    }

    /// Materializes one node as a running container.
    ///
    /// Returns the container id and the node's output fragment: its id
    /// under `docker_ids` and its runtime name under the role's node list.
    ///
    /// # Errors
    ///
    /// Certificate, log directory and engine failures.
    pub async fn launch(&self, node: &LaunchableNode, opts: LaunchOptions<'_>) -> Result<LaunchedNode> {
        let app_name = self.role.app_name();
        let certificate = self.ca.issue(&node.domain)?;
        let document = node.node_document(app_name);
        let pre_start = self.role.pre_start_commands(&node.domain);
        let (uid, gid) = effective_ids();

        let script = StartupScript {
            node_document: &document,
            certificate: &certificate,
            pre_start_commands: &pre_start,
            bindir: opts.bindir,
            executable: app_name,
            uid,
            gid,
        }
        .render()?;

        let mut volumes = vec![
            Volume::anonymous(TARGET_DIR),
            Volume::bind(
                opts.bindir,
                opts.bindir.display().to_string(),
                VolumeMode::ReadOnly,
            ),
        ];
        volumes.extend(self.role.extra_volumes(node, opts.bindir));
        if let Some(logdir) = opts.logdir {
            let dir = node_log_dir(logdir, &node.hostname)?;
            volumes.push(Volume::bind(dir, NODE_LOG_DIR, VolumeMode::ReadWrite));
        }

        let spec = RunSpec::new(opts.image, &node.hostname)
            .hostname(&node.hostname)
            .detached()
            .interactive()
            .privileged()
            .workdir(opts.bindir)
            .volumes(volumes)
            .dns(opts.dns_servers)
            .command(script);
        let container = self.engine.run(&spec).await?;
        info!(
            node = %node.node_name,
            container = %container,
            "Started node"
        );

        if let Some(os_config) = &node.os_config {
            create_os_accounts(self.engine, &container, os_config).await?;
        }

        let output = OutputDocument::new()
            .with_list(DOCKER_IDS, [container.to_string()])
            .with_list(self.role.nodes_list_attribute(), [node.node_name.clone()]);
        Ok(LaunchedNode { container, output })
    }
}

fn node_log_dir(logdir: &Path, hostname: &str) -> Result<PathBuf> {
    let dir = logdir.join(hostname);
    std::fs::create_dir_all(&dir).map_err(|source| LaunchError::LogDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}

/// Creates the users and groups of `os_config` inside a running container.
///
/// Ids are derived from the names, so every node of an instance agrees on
/// them.
pub async fn create_os_accounts(
    engine: &dyn ContainerEngine,
    container: &ContainerId,
    os_config: &OsConfig,
) -> Result<()> {
    for user in &os_config.users {
        let uid = posix_id(user).to_string();
        engine
            .exec(
                container,
                &argv([
                    "adduser",
                    "--disabled-password",
                    "--gecos",
                    "",
                    "--uid",
                    uid.as_str(),
                    user.as_str(),
                ]),
            )
            .await?;
        debug!(container = %container, user = %user, uid = %uid, "Created user");
    }

    for (group, members) in &os_config.groups {
        let gid = posix_id(group).to_string();
        engine
            .exec(container, &argv(["groupadd", "-g", gid.as_str(), group.as_str()]))
            .await?;
        for member in members {
            engine
                .exec(
                    container,
                    &argv(["usermod", "-a", "-G", group.as_str(), member.as_str()]),
                )
                .await?;
        }
        debug!(container = %container, group = %group, gid = %gid, "Created group");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_dir_is_created_per_host() {
        let root = tempfile::tempdir().unwrap();
        let dir = node_log_dir(root.path(), "worker1.c1.1.dev").unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir, root.path().join("worker1.c1.1.dev"));
        // a second bring-up into the same directory is fine
        assert!(node_log_dir(root.path(), "worker1.c1.1.dev").is_ok());
    }
}
