//! # testingx-database
//!
//! Provision a throwaway PostgreSQL server in a container, wait until it
//! accepts connections, and hand back a ready [`sqlx::PgPool`].
//!
//! ```rust,no_run
//! use testingx_core::Context;
//! use testingx_database::{provision, PostgresTestParams};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let instance = provision(&Context::background(), PostgresTestParams::default()).await?;
//!
//! let one: (i32,) = sqlx::query_as("SELECT 1").fetch_one(instance.pool()).await?;
//! assert_eq!(one.0, 1);
//!
//! instance.cleanup().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Containers expire on their own after two minutes unless configured
//! otherwise, so a test that panics before `cleanup` does not leak forever.

pub mod error;
pub mod instance;
pub mod params;
pub mod provision;

pub use error::ProvisionError;
pub use instance::PostgresTestInstance;
pub use params::{
    Expiration, PostgresTestParams, ResolvedParams, DEBUG_EXPIRATION_SECS, DEFAULT_DEBUG_HOST_PORT,
    DEFAULT_EXPIRATION_SECS, DEFAULT_MAX_WAIT, DEFAULT_PROBE_TIMEOUT, POSTGRES_PORT,
};
pub use provision::{provision, provision_debuggable};
