//! The shared orchestration handle

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use testingx_core::retry::{retry, ExponentialBackoff};
use tracing::{debug, info};

use crate::backend::{ContainerBackend, RunOptions};
use crate::docker::DockerBackend;
use crate::error::{DockerError, DockerResult};
use crate::resource::Resource;

/// How long the initial backend handshake may take
pub const HANDSHAKE_WAIT: Duration = Duration::from_secs(120);

/// A connected container backend plus the default retry budget.
///
/// Cheap to clone and safe to share between concurrently running tests. The
/// default wait is fixed at construction; callers that need a different budget
/// pass it to [`DockerPool::retry_with`] instead of mutating a shared pool.
#[derive(Debug, Clone)]
pub struct DockerPool {
    backend: Arc<dyn ContainerBackend>,
    max_wait: Duration,
}

impl DockerPool {
    /// Connect to the local Docker daemon and verify it answers
    pub async fn new() -> DockerResult<Self> {
        let backend = DockerBackend::connect()?;
        Self::with_backend(Arc::new(backend)).await
    }

    /// Wrap an existing backend, verifying it answers within [`HANDSHAKE_WAIT`]
    pub async fn with_backend(backend: Arc<dyn ContainerBackend>) -> DockerResult<Self> {
        match tokio::time::timeout(HANDSHAKE_WAIT, backend.ping()).await {
            Ok(Ok(())) => {}
            Ok(Err(e @ DockerError::BackendUnavailable { .. })) => return Err(e),
            Ok(Err(e)) => {
                return Err(DockerError::BackendUnavailable {
                    message: e.to_string(),
                })
            }
            Err(_) => {
                return Err(DockerError::BackendUnavailable {
                    message: format!("no answer within {}s", HANDSHAKE_WAIT.as_secs()),
                })
            }
        }

        debug!("Container backend handshake succeeded");
        Ok(Self {
            backend,
            max_wait: HANDSHAKE_WAIT,
        })
    }

    /// A copy of this pool with a different default retry budget
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    pub fn backend(&self) -> &Arc<dyn ContainerBackend> {
        &self.backend
    }

    pub async fn run_with_options(&self, options: &RunOptions) -> DockerResult<Resource> {
        let info = self.backend.run(options).await?;
        info!(container = %info.id, image = %options.image(), "Resource running");
        Ok(Resource::new(info, Arc::clone(&self.backend)))
    }

    /// Retry `operation` with exponential backoff for up to [`Self::max_wait`]
    pub async fn retry<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        self.retry_with(self.max_wait, operation).await
    }

    /// Retry `operation` with exponential backoff for up to `max_wait`
    pub async fn retry_with<T, E, F, Fut>(&self, max_wait: Duration, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        retry(ExponentialBackoff::default(), max_wait, operation).await
    }

    /// Force-remove the resource; a second purge reports `NotFound`
    pub async fn purge(&self, resource: &Resource) -> DockerResult<()> {
        resource.purge().await?;
        info!(container = %resource.id(), "Purged resource");
        Ok(())
    }
}
