//! A running container

use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::{ContainerBackend, ContainerInfo, PortBinding};
use crate::error::DockerResult;

/// Handle to a container started through a [`crate::DockerPool`]
#[derive(Debug, Clone)]
pub struct Resource {
    info: ContainerInfo,
    backend: Arc<dyn ContainerBackend>,
}

impl Resource {
    pub(crate) fn new(info: ContainerInfo, backend: Arc<dyn ContainerBackend>) -> Self {
        Self { info, backend }
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn ports(&self) -> &HashMap<String, Vec<PortBinding>> {
        &self.info.ports
    }

    /// `host:port` a client on this machine can dial to reach `container_port`
    /// (for example `"5432/tcp"`), or `None` if it is not published.
    ///
    /// Wildcard interfaces resolve to `localhost`. When the daemon is remote
    /// (`DOCKER_HOST=tcp://...`) its host is used instead.
    pub fn host_port(&self, container_port: &str) -> Option<String> {
        let binding = self
            .info
            .ports
            .get(container_port)?
            .iter()
            .find(|binding| !binding.host_port.is_empty())?;

        let host = match self.backend.host_override() {
            Some(host) => host,
            None => match binding.host_ip.as_str() {
                "" | "0.0.0.0" | "::" => "localhost".to_string(),
                ip => ip.to_string(),
            },
        };

        Some(join_host_port(&host, &binding.host_port))
    }

    /// Ask the backend to stop this container after `seconds`
    pub async fn expire(&self, seconds: u64) -> DockerResult<()> {
        self.backend.expire(&self.info.id, seconds).await
    }

    /// Force-remove this container through the backend that started it
    pub async fn purge(&self) -> DockerResult<()> {
        self.backend.purge(&self.info.id).await
    }
}

pub(crate) fn join_host_port(host: &str, port: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeBackend;

    fn resource_with(backend: FakeBackend, ports: &[(&str, &str, &str)]) -> Resource {
        let mut info = ContainerInfo {
            id: "c1".into(),
            name: "testingx-c1".into(),
            ports: HashMap::new(),
        };
        for (port, ip, host_port) in ports {
            info.ports
                .entry(port.to_string())
                .or_default()
                .push(PortBinding::new(*ip, *host_port));
        }
        Resource::new(info, Arc::new(backend))
    }

    #[test]
    fn test_wildcard_interfaces_map_to_localhost() {
        for ip in ["", "0.0.0.0", "::"] {
            let resource = resource_with(FakeBackend::new(), &[("5432/tcp", ip, "49160")]);
            assert_eq!(resource.host_port("5432/tcp").as_deref(), Some("localhost:49160"));
        }
    }

    #[test]
    fn test_specific_interface_is_kept() {
        let resource = resource_with(FakeBackend::new(), &[("5432/tcp", "127.0.0.1", "5433")]);
        assert_eq!(resource.host_port("5432/tcp").as_deref(), Some("127.0.0.1:5433"));

        let resource = resource_with(FakeBackend::new(), &[("5432/tcp", "::1", "5433")]);
        assert_eq!(resource.host_port("5432/tcp").as_deref(), Some("[::1]:5433"));
    }

    #[test]
    fn test_remote_daemon_host_wins() {
        let backend = FakeBackend::new().with_host_override("10.0.0.5");
        let resource = resource_with(backend, &[("5432/tcp", "0.0.0.0", "49160")]);
        assert_eq!(resource.host_port("5432/tcp").as_deref(), Some("10.0.0.5:49160"));
    }

    #[test]
    fn test_unpublished_port() {
        let resource = resource_with(FakeBackend::new(), &[("5432/tcp", "0.0.0.0", "")]);
        assert_eq!(resource.host_port("5432/tcp"), None);
        assert_eq!(resource.host_port("6379/tcp"), None);
    }

    #[test]
    fn test_first_published_binding_is_used() {
        let resource = resource_with(
            FakeBackend::new(),
            &[("5432/tcp", "0.0.0.0", "49160"), ("5432/tcp", "::", "49160")],
        );
        assert_eq!(resource.host_port("5432/tcp").as_deref(), Some("localhost:49160"));
    }
}
