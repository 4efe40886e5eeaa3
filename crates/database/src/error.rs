//! Provisioning errors

use sqlx::PgPool;
use testingx_core::Interrupted;
use testingx_docker::{DockerError, Resource};

/// Why [`crate::provision`] failed.
///
/// Every variant raised after the container was created carries its
/// [`Resource`], so the caller can still purge it (see
/// [`ProvisionError::cleanup`]).
#[derive(thiserror::Error, Debug)]
pub enum ProvisionError {
    #[error(transparent)]
    Docker(#[from] DockerError),

    #[error("could not start resource: {0}")]
    ContainerStartFailed(#[source] DockerError),

    #[error("failed to set container expiration: {source}")]
    ExpirationSetFailed {
        source: DockerError,
        resource: Resource,
    },

    #[error("container {container} does not publish port {port}")]
    PortNotPublished {
        port: String,
        container: String,
        resource: Resource,
    },

    #[error("invalid database url: {source}")]
    InvalidUrl {
        source: sqlx::Error,
        resource: Resource,
    },

    #[error("could not connect to database: {source}")]
    DatabaseUnreachable {
        source: sqlx::Error,
        resource: Resource,
        pool: PgPool,
    },

    #[error("provisioning interrupted: {source}")]
    Interrupted {
        source: Interrupted,
        resource: Resource,
    },
}

impl ProvisionError {
    /// The container left behind by a failure after creation
    pub fn resource(&self) -> Option<&Resource> {
        match self {
            ProvisionError::Docker(_) | ProvisionError::ContainerStartFailed(_) => None,
            ProvisionError::ExpirationSetFailed { resource, .. }
            | ProvisionError::PortNotPublished { resource, .. }
            | ProvisionError::InvalidUrl { resource, .. }
            | ProvisionError::DatabaseUnreachable { resource, .. }
            | ProvisionError::Interrupted { resource, .. } => Some(resource),
        }
    }

    /// Close any pool and purge any container the failed call left behind
    pub async fn cleanup(&self) -> Result<(), DockerError> {
        if let ProvisionError::DatabaseUnreachable { pool, .. } = self {
            pool.close().await;
        }
        match self.resource() {
            Some(resource) => resource.purge().await,
            None => Ok(()),
        }
    }
}
