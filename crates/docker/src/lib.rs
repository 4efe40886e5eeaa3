//! # testingx-docker
//!
//! A thin orchestration client for short-lived test containers. It wraps a
//! [`ContainerBackend`] (the Docker Engine API via `bollard` by default) and
//! exposes the handful of primitives test provisioning needs: run a
//! container, resolve its published ports, schedule its expiry, purge it, and
//! retry an arbitrary operation with backoff until a maximum wait elapses.
//!
//! ```rust,no_run
//! use testingx_docker::{DockerPool, RunOptions};
//!
//! # async fn example() -> Result<(), testingx_docker::DockerError> {
//! let pool = DockerPool::new().await?;
//! let resource = pool
//!     .run_with_options(&RunOptions::new("redis", "7").with_auto_remove(true))
//!     .await?;
//! resource.expire(60).await?;
//! println!("redis at {:?}", resource.host_port("6379/tcp"));
//! pool.purge(&resource).await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod docker;
pub mod error;
pub mod pool;
pub mod resource;

#[cfg(any(test, feature = "test-utils"))]
pub mod fake;

pub use backend::{ContainerBackend, ContainerInfo, PortBinding, RunOptions};
pub use docker::DockerBackend;
pub use error::{DockerError, DockerResult};
pub use pool::{DockerPool, HANDSHAKE_WAIT};
pub use resource::Resource;

#[cfg(any(test, feature = "test-utils"))]
pub use fake::FakeBackend;
