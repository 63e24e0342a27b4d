//! Health probe against a node's nagios endpoint.
//!
//! The endpoint answers with an XML document whose root element carries a
//! `status` attribute; a node is healthy when it reads `ok`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::{debug, warn};

use crate::error::Result;
use crate::port::outbound::probe::HealthProbe;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct NagiosProbe {
    http: HttpClient,
    scheme: String,
    port: u16,
}

impl NagiosProbe {
    /// Probe for plain HTTP on port 80.
    #[must_use]
    pub fn new() -> Self {
        Self::with_endpoint("http", 80)
    }

    #[must_use]
    pub fn with_endpoint(scheme: impl Into<String>, port: u16) -> Self {
        // Nodes serve certificates from a throwaway test CA.
        let http = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(true)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });
        Self {
            http,
            scheme: scheme.into(),
            port,
        }
    }

    fn url(&self, address: &str) -> String {
        format!("{}://{address}:{}/nagios", self.scheme, self.port)
    }
}

impl Default for NagiosProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HealthProbe for NagiosProbe {
    async fn probe(&self, address: &str) -> Result<bool> {
        let url = self.url(address);
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            debug!(url = %url, status = %response.status(), "Nagios not healthy yet");
            return Ok(false);
        }
        let body = response.text().await?;
        Ok(root_status(&body) == Some("ok"))
    }
}

/// Value of the `status` attribute of the document's root element.
fn root_status(xml: &str) -> Option<&str> {
    let mut rest = xml;
    let root = loop {
        let start = rest.find('<')?;
        let tail = &rest[start + 1..];
        if tail.starts_with('?') || tail.starts_with('!') {
            rest = &tail[tail.find('>')? + 1..];
            continue;
        }
        break &tail[..tail.find('>')?];
    };

    let (_, mut attributes) = root.trim_end_matches('/').split_once(char::is_whitespace)?;
    loop {
        let (name, rest) = attributes.split_once('=')?;
        let rest = rest.trim_start();
        let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
        let rest = &rest[1..];
        let end = rest.find(quote)?;
        if name.trim() == "status" {
            return Some(&rest[..end]);
        }
        attributes = &rest[end + 1..];
    }
}
