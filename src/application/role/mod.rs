//! Worker role implementations.

mod cluster_worker;

pub use cluster_worker::ClusterWorker;
