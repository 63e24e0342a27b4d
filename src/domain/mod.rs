//! Environment model, naming rules and the output document.

pub mod environment;
pub mod naming;
pub mod node;
pub mod output;

pub use environment::{
    DbDriver, DbEndpoint, DbNodeMapping, DbNodeRef, DocumentKeys, EnvironmentConfig,
    InstanceConfig, NodeConfig, OsConfig,
};
pub use naming::Uid;
pub use node::{LaunchableNode, PreparedNode};
pub use output::OutputDocument;
