//! Role port: the capability set a worker role plugs into the orchestrator.
//!
//! The orchestrator never looks at a concrete role. Everything that differs
//! between roles (document keys, pre-start hooks, extra mounts, health
//! checks, database sizing) is asked of the [`Role`] implementation.
//!
//! # Example
//!
//! ```ignore
//! use clusterup::port::inbound::role::Role;
//!
//! struct MyRole;
//!
//! impl Role for MyRole {
//!     fn app_name(&self) -> &str { "my_worker" }
//!     // ...
//! }
//! ```

use std::path::Path;

use async_trait::async_trait;

use crate::domain::{
    DocumentKeys, EnvironmentConfig, LaunchableNode, OutputDocument, PreparedNode, Uid,
};
use crate::error::Result;
use crate::port::outbound::container::{ContainerEngine, ContainerId, Volume};

/// What a role sees once all nodes of an instance are up.
#[derive(Debug, Clone, Copy)]
pub struct InstanceContext<'a> {
    pub bindir: &'a Path,
    pub instance: &'a str,
    pub domain: &'a str,
    pub env: &'a EnvironmentConfig,
    pub containers: &'a [ContainerId],
    /// Output fragment of this instance only.
    pub output: &'a OutputDocument,
}

#[async_trait]
pub trait Role: Send + Sync {
    /// Application (and executable) name of the role's release.
    fn app_name(&self) -> &str;

    /// Top-level key of the environment document holding the instances.
    fn domains_attribute(&self) -> &str;

    /// Application env key the cluster domain is written to.
    fn domain_env_name(&self) -> &str;

    /// Output key listing the runtime node names.
    fn nodes_list_attribute(&self) -> &str;

    /// Whether nodes of this role serve DNS for their own domain.
    fn has_dns_server(&self) -> bool;

    fn document_keys(&self) -> DocumentKeys<'_> {
        DocumentKeys {
            app_name: self.app_name(),
            domains_attribute: self.domains_attribute(),
        }
    }

    /// Final role-specific adjustment of a prepared node.
    fn tweak_config(&self, node: PreparedNode, _uid: &Uid) -> PreparedNode {
        node
    }

    /// Shell lines run in the container before the release starts.
    fn pre_start_commands(&self, domain: &str) -> String;

    fn extra_volumes(&self, _node: &LaunchableNode, _bindir: &Path) -> Vec<Volume> {
        Vec::new()
    }

    /// Bucket name to RAM quota (MB).
    fn couchbase_buckets(&self) -> Vec<(String, u32)>;

    /// Cluster RAM quota (MB).
    fn couchbase_ramsize(&self) -> u32;

    /// Called once per instance before its nodes are launched.
    async fn pre_configure_instance(
        &self,
        _instance: &str,
        _domain: &str,
        _env: &EnvironmentConfig,
    ) -> Result<()> {
        Ok(())
    }

    /// Called once per instance after all its nodes are ready.
    async fn post_configure_instance(&self, _ctx: InstanceContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Whether the node in `container` is ready to serve.
    async fn ready_check(&self, engine: &dyn ContainerEngine, container: &ContainerId)
        -> Result<bool>;
}
