//! Docker Engine backend
//!
//! Talks to the local (or `DOCKER_HOST`) daemon through `bollard`.

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, RemoveContainerOptions,
    StartContainerOptions,
};
use bollard::exec::{CreateExecOptions, StartExecOptions};
use bollard::image::CreateImageOptions;
use bollard::models::{HostConfig, RestartPolicy, RestartPolicyNameEnum};
use bollard::Docker;
use futures_util::StreamExt;
use tracing::{debug, info, warn};

use crate::backend::{ContainerBackend, ContainerInfo, PortBinding, RunOptions};
use crate::error::{DockerError, DockerResult};

/// Signal sent to PID 1 when an expiry timer fires. PostgreSQL treats
/// SIGINT as "fast shutdown", which also ends open sessions.
pub const EXPIRE_SIGNAL: &str = "INT";

#[derive(Debug, Clone)]
pub struct DockerBackend {
    docker: Docker,
    host: Option<String>,
}

impl DockerBackend {
    /// Connect using the platform defaults (`DOCKER_HOST`, else the local socket)
    pub fn connect() -> DockerResult<Self> {
        let docker = Docker::connect_with_local_defaults().map_err(|e| DockerError::BackendUnavailable {
            message: e.to_string(),
        })?;
        let host = std::env::var("DOCKER_HOST")
            .ok()
            .and_then(|endpoint| remote_host(&endpoint));

        Ok(Self { docker, host })
    }

    async fn ensure_image(&self, repository: &str, tag: &str) -> DockerResult<()> {
        let image = format!("{}:{}", repository, tag);

        match self.docker.inspect_image(&image).await {
            Ok(_) => return Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => {}
            Err(e) => return Err(e.into()),
        }

        info!(image = %image, "Pulling image");
        let options = CreateImageOptions {
            from_image: repository,
            tag,
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(progress) = stream.next().await {
            let progress = progress.map_err(|e| DockerError::ImagePull {
                image: image.clone(),
                message: e.to_string(),
            })?;
            if let Some(status) = progress.status {
                debug!(status = %status, "Pull progress");
            }
        }

        Ok(())
    }

    async fn remove_quietly(&self, container_id: &str) {
        let options = RemoveContainerOptions {
            force: true,
            v: true,
            ..Default::default()
        };
        if let Err(e) = self.docker.remove_container(container_id, Some(options)).await {
            warn!(container = %container_id, error = %e, "Failed to remove container");
        }
    }
}

#[async_trait]
impl ContainerBackend for DockerBackend {
    async fn ping(&self) -> DockerResult<()> {
        self.docker
            .ping()
            .await
            .map_err(|e| DockerError::BackendUnavailable {
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn run(&self, options: &RunOptions) -> DockerResult<ContainerInfo> {
        self.ensure_image(&options.repository, &options.tag).await?;

        let create_options = options.name.as_deref().map(|name| CreateContainerOptions {
            name,
            platform: None,
        });

        let response = self
            .docker
            .create_container(create_options, container_config(options))
            .await?;
        info!(container = %response.id, image = %options.image(), "Created container");

        if let Err(e) = self
            .docker
            .start_container(&response.id, None::<StartContainerOptions<String>>)
            .await
        {
            self.remove_quietly(&response.id).await;
            return Err(e.into());
        }

        let inspect = match self
            .docker
            .inspect_container(&response.id, None::<InspectContainerOptions>)
            .await
        {
            Ok(inspect) => inspect,
            Err(e) => {
                self.remove_quietly(&response.id).await;
                return Err(e.into());
            }
        };

        let ports = inspect
            .network_settings
            .and_then(|settings| settings.ports)
            .unwrap_or_default()
            .into_iter()
            .map(|(port, bindings)| {
                let bindings = bindings
                    .unwrap_or_default()
                    .into_iter()
                    .map(|binding| PortBinding {
                        host_ip: binding.host_ip.unwrap_or_default(),
                        host_port: binding.host_port.unwrap_or_default(),
                    })
                    .collect();
                (port, bindings)
            })
            .collect();

        let name = inspect
            .name
            .map(|name| name.trim_start_matches('/').to_string())
            .unwrap_or_default();

        info!(container = %response.id, name = %name, "Started container");

        Ok(ContainerInfo {
            id: response.id,
            name,
            ports,
        })
    }

    async fn expire(&self, container_id: &str, seconds: u64) -> DockerResult<()> {
        // The timer runs inside the container, so it outlives this process.
        let script = format!("sleep {}; kill -s {} 1", seconds, EXPIRE_SIGNAL);
        let exec = self
            .docker
            .create_exec(
                container_id,
                CreateExecOptions {
                    cmd: Some(vec!["sh", "-c", script.as_str()]),
                    attach_stdout: Some(false),
                    attach_stderr: Some(false),
                    ..Default::default()
                },
            )
            .await?;

        self.docker
            .start_exec(
                &exec.id,
                Some(StartExecOptions {
                    detach: true,
                    ..Default::default()
                }),
            )
            .await?;

        debug!(container = %container_id, seconds, "Scheduled container expiry");
        Ok(())
    }

    async fn purge(&self, container_id: &str) -> DockerResult<()> {
        let options = RemoveContainerOptions {
            force: true,
            v: true,
            ..Default::default()
        };

        match self.docker.remove_container(container_id, Some(options)).await {
            Ok(()) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => {
                Err(DockerError::NotFound {
                    id: container_id.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn host_override(&self) -> Option<String> {
        self.host.clone()
    }
}

/// Create-time configuration. Every exposed port is published; explicit
/// bindings pin their own ports on top of that.
fn container_config(options: &RunOptions) -> Config<String> {
    let exposed_ports: HashMap<String, HashMap<(), ()>> = options
        .port_bindings
        .keys()
        .map(|port| (port.clone(), HashMap::new()))
        .collect();

    let port_bindings: HashMap<String, Option<Vec<bollard::models::PortBinding>>> = options
        .port_bindings
        .iter()
        .map(|(port, bindings)| {
            let bindings = bindings
                .iter()
                .map(|binding| bollard::models::PortBinding {
                    host_ip: Some(binding.host_ip.clone()).filter(|ip| !ip.is_empty()),
                    host_port: Some(binding.host_port.clone()).filter(|p| !p.is_empty()),
                })
                .collect();
            (port.clone(), Some(bindings))
        })
        .collect();

    let host_config = HostConfig {
        port_bindings: Some(port_bindings),
        publish_all_ports: Some(true),
        auto_remove: Some(options.auto_remove),
        restart_policy: Some(RestartPolicy {
            name: Some(RestartPolicyNameEnum::NO),
            maximum_retry_count: None,
        }),
        ..Default::default()
    };

    Config {
        image: Some(options.image()),
        env: Some(options.env.clone()),
        cmd: options.cmd.clone(),
        labels: Some(options.labels.clone()),
        exposed_ports: Some(exposed_ports),
        host_config: Some(host_config),
        ..Default::default()
    }
}

/// Host of a `tcp://` daemon endpoint; local sockets and pipes yield `None`.
pub(crate) fn remote_host(endpoint: &str) -> Option<String> {
    let url = url::Url::parse(endpoint).ok()?;
    match url.scheme() {
        "tcp" | "http" | "https" => url.host_str().map(str::to_string),
        _ => None,
    }
}
