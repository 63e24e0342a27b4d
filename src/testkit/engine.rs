//! In-memory [`ContainerEngine`] that records every request.
//!
//! Containers get sequential ids (`c0000`, `c0001`, ...) and addresses
//! (`172.17.0.2`, `172.17.0.3`, ...). They can be addressed by id or by
//! name, like with the real engine.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{LaunchError, Result};
use crate::port::outbound::container::{ContainerEngine, ContainerId, ContainerSettings, RunSpec};

#[derive(Default)]
struct State {
    runs: Vec<RunSpec>,
    execs: Vec<(ContainerId, Vec<String>)>,
    restarts: Vec<ContainerId>,
    /// Id or name to run index.
    known: HashMap<String, usize>,
}

#[derive(Default)]
pub struct RecordingEngine {
    state: Mutex<State>,
    failing_runs: Vec<String>,
    failing_execs: Vec<String>,
    exec_outputs: Vec<(String, String)>,
}

impl RecordingEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects runs whose container name contains `fragment`.
    #[must_use]
    pub fn failing_run(mut self, fragment: impl Into<String>) -> Self {
        self.failing_runs.push(fragment.into());
        self
    }

    /// Fails execs whose space-joined argv starts with `prefix`.
    #[must_use]
    pub fn failing_exec(mut self, prefix: impl Into<String>) -> Self {
        self.failing_execs.push(prefix.into());
        self
    }

    /// Answers execs whose space-joined argv starts with `prefix`.
    #[must_use]
    pub fn with_exec_output(mut self, prefix: impl Into<String>, output: impl Into<String>) -> Self {
        self.exec_outputs.push((prefix.into(), output.into()));
        self
    }

    #[must_use]
    pub fn address_of(index: usize) -> String {
        format!("172.17.0.{}", index + 2)
    }

    #[must_use]
    pub fn run_count(&self) -> usize {
        self.lock().runs.len()
    }

    #[must_use]
    pub fn runs(&self) -> Vec<RunSpec> {
        self.lock().runs.clone()
    }

    /// Names of started containers, in start order.
    #[must_use]
    pub fn run_names(&self) -> Vec<String> {
        self.lock().runs.iter().map(|spec| spec.name.clone()).collect()
    }

    #[must_use]
    pub fn execs(&self) -> Vec<(ContainerId, Vec<String>)> {
        self.lock().execs.clone()
    }

    /// Execs whose argv starts with `program`.
    #[must_use]
    pub fn execs_of(&self, program: &str) -> Vec<Vec<String>> {
        self.lock()
            .execs
            .iter()
            .filter(|(_, argv)| argv.first().map(String::as_str) == Some(program))
            .map(|(_, argv)| argv.clone())
            .collect()
    }

    #[must_use]
    pub fn restarts(&self) -> Vec<ContainerId> {
        self.lock().restarts.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl ContainerEngine for RecordingEngine {
    async fn run(&self, spec: &RunSpec) -> Result<ContainerId> {
        if self.failing_runs.iter().any(|f| spec.name.contains(f.as_str())) {
            return Err(LaunchError::Run {
                name: spec.name.clone(),
                reason: "rejected by test engine".to_string(),
            }
            .into());
        }
        let mut state = self.lock();
        let index = state.runs.len();
        let id = format!("c{index:04}");
        state.known.insert(id.clone(), index);
        state.known.insert(spec.name.clone(), index);
        state.runs.push(spec.clone());
        Ok(ContainerId::new(id))
    }

    async fn exec(&self, container: &ContainerId, command: &[String]) -> Result<String> {
        self.lock()
            .execs
            .push((container.clone(), command.to_vec()));
        let joined = command.join(" ");
        if self.failing_execs.iter().any(|p| joined.starts_with(p.as_str())) {
            return Err(LaunchError::Exec {
                container: container.to_string(),
                command: command.to_vec(),
                reason: "exit code 1".to_string(),
            }
            .into());
        }
        Ok(self
            .exec_outputs
            .iter()
            .find(|(prefix, _)| joined.starts_with(prefix.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_default())
    }

    async fn inspect(&self, container: &ContainerId) -> Result<ContainerSettings> {
        let index = self.lock().known.get(container.as_str()).copied();
        match index {
            Some(index) => Ok(ContainerSettings::new(json!({
                "Id": container.as_str(),
                "NetworkSettings": { "IPAddress": Self::address_of(index) }
            }))),
            None => Err(LaunchError::Inspect {
                container: container.to_string(),
                reason: "no such container".to_string(),
            }
            .into()),
        }
    }

    async fn restart(&self, container: &ContainerId) -> Result<()> {
        self.lock().restarts.push(container.clone());
        Ok(())
    }
}
