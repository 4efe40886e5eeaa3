//! The container backend seam
//!
//! [`ContainerBackend`] is the boundary to the container runtime. The Docker
//! implementation lives in [`crate::docker`]; tests use an in-memory one.

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::DockerResult;

/// A host-side binding for a container port
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PortBinding {
    /// Host interface; empty means "all interfaces"
    pub host_ip: String,
    /// Host port; empty lets the backend choose an ephemeral one
    pub host_port: String,
}

impl PortBinding {
    pub fn new<I: Into<String>, P: Into<String>>(host_ip: I, host_port: P) -> Self {
        Self {
            host_ip: host_ip.into(),
            host_port: host_port.into(),
        }
    }
}

/// Everything needed to create and start one container. Containers are
/// never restarted by the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    pub name: Option<String>,
    pub repository: String,
    pub tag: String,
    /// `KEY=VALUE` entries, passed through in order
    pub env: Vec<String>,
    pub cmd: Option<Vec<String>>,
    /// Container port (e.g. `5432/tcp`) to host bindings. Exposed ports
    /// without an entry here are published on ephemeral host ports.
    pub port_bindings: HashMap<String, Vec<PortBinding>>,
    pub labels: HashMap<String, String>,
    pub auto_remove: bool,
}

impl RunOptions {
    pub fn new<R: Into<String>, T: Into<String>>(repository: R, tag: T) -> Self {
        Self {
            repository: repository.into(),
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// `repository:tag`
    pub fn image(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_env<S: Into<String>>(mut self, entry: S) -> Self {
        self.env.push(entry.into());
        self
    }

    pub fn with_cmd(mut self, cmd: Vec<String>) -> Self {
        self.cmd = Some(cmd);
        self
    }

    pub fn with_port_binding<S: Into<String>>(mut self, container_port: S, binding: PortBinding) -> Self {
        self.port_bindings
            .entry(container_port.into())
            .or_default()
            .push(binding);
        self
    }

    pub fn with_label<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_auto_remove(mut self, auto_remove: bool) -> Self {
        self.auto_remove = auto_remove;
        self
    }
}

/// What the backend reports about a started container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    /// Published ports as reported after start
    pub ports: HashMap<String, Vec<PortBinding>>,
}

#[async_trait]
pub trait ContainerBackend: Send + Sync + Debug {
    /// Verify the backend answers
    async fn ping(&self) -> DockerResult<()>;

    /// Pull the image if needed, then create, start and inspect a container
    async fn run(&self, options: &RunOptions) -> DockerResult<ContainerInfo>;

    /// Have the backend stop the container after `seconds`
    async fn expire(&self, container_id: &str, seconds: u64) -> DockerResult<()>;

    /// Force-remove the container and its anonymous volumes
    async fn purge(&self, container_id: &str) -> DockerResult<()>;

    /// Host to dial instead of the binding's interface (remote daemons)
    fn host_override(&self) -> Option<String> {
        None
    }
}
