//! # testingx
//!
//! Throwaway PostgreSQL servers for integration tests. A test asks for an
//! instance, gets back a connection pool that has already answered a ping,
//! optionally runs migrations against it, and removes the container when
//! done. Containers also expire on their own, so a crashed test run does not
//! leave servers behind for long.
//!
//! ```rust,no_run
//! use testingx::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let instance = provision(&Context::background(), PostgresTestParams::default()).await?;
//!
//! let migrations = Migrations::new(MigrationParams::embedded(instance.database_url())).await?;
//! migrations.up().await?;
//!
//! // ... exercise code against instance.pool() ...
//!
//! instance.cleanup().await?;
//! # Ok(())
//! # }
//! ```

pub use testingx_core as core;
pub use testingx_database as database;
pub use testingx_docker as docker;
pub use testingx_migrations as migrations;

pub use testingx_core::{Context, Interrupted};
pub use testingx_database::{
    provision, provision_debuggable, PostgresTestInstance, PostgresTestParams, ProvisionError,
};
pub use testingx_docker::{DockerError, DockerPool, Resource};
pub use testingx_migrations::{MigrationError, MigrationParams, Migrations, FS};

pub mod prelude;

/// Current version of testingx
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
