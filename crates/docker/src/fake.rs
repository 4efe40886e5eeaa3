//! In-memory [`ContainerBackend`] for tests that must not need a daemon

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::backend::{ContainerBackend, ContainerInfo, PortBinding, RunOptions};
use crate::error::{DockerError, DockerResult};

#[derive(Debug, Default)]
struct FakeState {
    next_id: u64,
    runs: Vec<RunOptions>,
    expirations: Vec<(String, u64)>,
    purged: Vec<String>,
    live: HashSet<String>,
}

/// Records every call and answers with canned port bindings.
///
/// Explicit host ports requested in [`RunOptions`] are echoed back; other
/// ports get whatever was registered with [`FakeBackend::with_published_port`].
#[derive(Debug, Default)]
pub struct FakeBackend {
    published: HashMap<String, Vec<PortBinding>>,
    host_override: Option<String>,
    ping_error: Option<String>,
    run_error: Option<String>,
    expire_error: Option<String>,
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_published_port(mut self, container_port: &str, host_ip: &str, host_port: &str) -> Self {
        self.published
            .entry(container_port.to_string())
            .or_default()
            .push(PortBinding::new(host_ip, host_port));
        self
    }

    pub fn with_host_override(mut self, host: &str) -> Self {
        self.host_override = Some(host.to_string());
        self
    }

    pub fn failing_ping(mut self, message: &str) -> Self {
        self.ping_error = Some(message.to_string());
        self
    }

    pub fn failing_run(mut self, message: &str) -> Self {
        self.run_error = Some(message.to_string());
        self
    }

    pub fn failing_expire(mut self, message: &str) -> Self {
        self.expire_error = Some(message.to_string());
        self
    }

    pub fn runs(&self) -> Vec<RunOptions> {
        self.lock().runs.clone()
    }

    pub fn expirations(&self) -> Vec<(String, u64)> {
        self.lock().expirations.clone()
    }

    pub fn purged(&self) -> Vec<String> {
        self.lock().purged.clone()
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.lock().live.contains(id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ContainerBackend for FakeBackend {
    async fn ping(&self) -> DockerResult<()> {
        match &self.ping_error {
            Some(message) => Err(DockerError::BackendUnavailable {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn run(&self, options: &RunOptions) -> DockerResult<ContainerInfo> {
        let mut state = self.lock();
        state.runs.push(options.clone());

        if let Some(message) = &self.run_error {
            return Err(DockerError::backend(message.clone()));
        }

        state.next_id += 1;
        let id = format!("fake{:012}", state.next_id);
        state.live.insert(id.clone());

        let mut ports = self.published.clone();
        for (port, bindings) in &options.port_bindings {
            if bindings.iter().any(|binding| !binding.host_port.is_empty()) {
                ports.insert(port.clone(), bindings.clone());
            }
        }

        Ok(ContainerInfo {
            name: options.name.clone().unwrap_or_else(|| id.clone()),
            id,
            ports,
        })
    }

    async fn expire(&self, container_id: &str, seconds: u64) -> DockerResult<()> {
        let mut state = self.lock();
        if let Some(message) = &self.expire_error {
            return Err(DockerError::backend(message.clone()));
        }
        if !state.live.contains(container_id) {
            return Err(DockerError::NotFound {
                id: container_id.to_string(),
            });
        }
        state.expirations.push((container_id.to_string(), seconds));
        Ok(())
    }

    async fn purge(&self, container_id: &str) -> DockerResult<()> {
        let mut state = self.lock();
        if !state.live.remove(container_id) {
            return Err(DockerError::NotFound {
                id: container_id.to_string(),
            });
        }
        state.purged.push(container_id.to_string());
        Ok(())
    }

    fn host_override(&self) -> Option<String> {
        self.host_override.clone()
    }
}
