//! Health probe port.

use async_trait::async_trait;

use crate::error::Result;

/// Queries the health endpoint of a node at a network address.
///
/// `Ok(false)` and `Err(_)` both mean "not ready yet" to the readiness
/// poller; errors are only logged.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, address: &str) -> Result<bool>;
}
