//! Common imports for tests
//!
//! ```rust
//! use testingx::prelude::*;
//! ```

pub use testingx_core::{Context, Interrupted};
pub use testingx_database::{
    provision, provision_debuggable, Expiration, PostgresTestInstance, PostgresTestParams,
    ProvisionError, POSTGRES_PORT,
};
pub use testingx_docker::{DockerError, DockerPool, PortBinding, Resource, RunOptions};
pub use testingx_migrations::{
    DirFs, EmbeddedFs, MigrationError, MigrationFs, MigrationParams, MigrationStatus, Migrations,
    FS, POSTGRES_PATH,
};
