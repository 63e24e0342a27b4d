//! DNS registrar that only remembers what it was asked to publish.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{OutputDocument, Uid};
use crate::error::Result;
use crate::port::outbound::dns::{DnsRegistrar, DnsRequest, HostRecord};

#[derive(Default)]
pub struct RecordingDns {
    hosts: Mutex<Vec<HostRecord>>,
}

impl RecordingDns {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every registered host, in registration order.
    #[must_use]
    pub fn hosts(&self) -> Vec<HostRecord> {
        match self.hosts.lock() {
            Ok(hosts) => hosts.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl DnsRegistrar for RecordingDns {
    async fn maybe_start(
        &self,
        _request: &DnsRequest,
        _uid: &Uid,
    ) -> Result<(Vec<String>, OutputDocument)> {
        Ok((Vec::new(), OutputDocument::new()))
    }

    async fn register_hosts(&self, hosts: &[HostRecord]) -> Result<()> {
        match self.hosts.lock() {
            Ok(mut registered) => registered.extend_from_slice(hosts),
            Err(poisoned) => poisoned.into_inner().extend_from_slice(hosts),
        }
        Ok(())
    }

    async fn maybe_restart_with_configuration(
        &self,
        _request: &DnsRequest,
        _uid: &Uid,
        _output: &OutputDocument,
    ) -> Result<()> {
        Ok(())
    }
}
