//! Miette-based error diagnostics for CLI error presentation.
//!
//! Every crate error is mapped to a [`CliDiagnostic`] carrying a stable
//! code and, where one exists, a hint on how to fix the input.

use std::fmt::Display;

use miette::Diagnostic;
use thiserror::Error;

use crate::error::{ConfigError, Error as CrateError, LaunchError};

#[derive(Debug, Error)]
#[error("{message}")]
pub struct CliDiagnostic {
    pub message: String,
    pub code: String,
    pub help: Option<String>,
}

impl Diagnostic for CliDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new(&self.code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.help
            .as_ref()
            .map(|help| Box::new(help) as Box<dyn Display + 'a>)
    }
}

impl CliDiagnostic {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            help: None,
        }
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl From<&CrateError> for CliDiagnostic {
    fn from(error: &CrateError) -> Self {
        let message = error.to_string();
        match error {
            CrateError::Config(config) => {
                let diagnostic = Self::new("clusterup::config", message);
                match config {
                    ConfigError::UnsupportedDbDriver { .. } => diagnostic
                        .with_help("set db_driver to \"couchbase\" or \"couchdb\", or drop it to use the default"),
                    ConfigError::UnknownOsConfig { .. } => {
                        diagnostic.with_help("declare the entry under the top-level \"os_configs\" object")
                    }
                    ConfigError::InvalidName { .. } => diagnostic
                        .with_help("names must be non-empty and contain no dots or whitespace"),
                    ConfigError::ParseSettings(_) => {
                        diagnostic.with_help("check the file passed with --settings")
                    }
                    _ => diagnostic,
                }
            }
            CrateError::Launch(LaunchError::Spawn(_)) => Self::new("clusterup::launch", message)
                .with_help("is the container engine installed? see [docker] binary in the settings"),
            CrateError::Launch(_) => Self::new("clusterup::launch", message)
                .with_help("containers started so far are left running for inspection"),
            CrateError::Readiness(_) => Self::new("clusterup::readiness", message)
                .with_help("inspect the listed containers' logs, or raise [timeouts] in the settings"),
            CrateError::Merge(_) => Self::new("clusterup::output", message),
            CrateError::Probe(_) | CrateError::Json(_) | CrateError::Io(_) => Self::new("clusterup::internal", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_driver_gets_help() {
        let error: CrateError = ConfigError::UnsupportedDbDriver {
            driver: "mongodb".to_string(),
        }
        .into();
        let diagnostic = CliDiagnostic::from(&error);
        assert_eq!(diagnostic.code, "clusterup::config");
        assert!(diagnostic.message.contains("mongodb"));
        assert!(diagnostic.help.is_some());
    }
}
