//! # testingx-migrations
//!
//! Applies and reverts versioned SQL scripts against a PostgreSQL database.
//! Scripts come from a [`MigrationFs`]: the embedded [`FS`] shipped with the
//! crate, a directory on disk ([`DirFs`]), or any other implementation.
//!
//! Scripts follow the `{version}_{name}.up.sql` / `{version}_{name}.down.sql`
//! layout; plain `{version}_{name}.sql` files are irreversible.
//!
//! ```rust,no_run
//! use testingx_migrations::{MigrationParams, Migrations};
//!
//! # async fn example(url: &str) -> Result<(), testingx_migrations::MigrationError> {
//! let migrations = Migrations::new(MigrationParams::embedded(url)).await?;
//! migrations.up().await?;
//! migrations.down().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fs;
pub mod source;

use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use sqlx::migrate::{Migrate, MigrateError, Migrator};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tracing::info;

pub use error::{MigrationError, MigrationResult};
pub use fs::{DirFs, EmbeddedFs, MigrationFs};
pub use source::FsSource;

/// Sub-path of [`FS`] holding the PostgreSQL scripts
pub const POSTGRES_PATH: &str = "drivers/postgres";

/// Migrations compiled into this crate, rooted at `drivers/`
pub static FS: EmbeddedFs = EmbeddedFs::new(&[
    (
        "drivers/postgres/1_create_test_records.up.sql",
        include_str!("../drivers/postgres/1_create_test_records.up.sql"),
    ),
    (
        "drivers/postgres/1_create_test_records.down.sql",
        include_str!("../drivers/postgres/1_create_test_records.down.sql"),
    ),
]);

#[derive(Debug, Clone)]
pub struct MigrationParams {
    pub fs: Arc<dyn MigrationFs>,
    /// Directory inside `fs` holding the scripts, e.g. `drivers/postgres`
    pub fs_path: String,
    pub database_url: String,
}

impl MigrationParams {
    pub fn new<P: Into<String>, U: Into<String>>(fs: Arc<dyn MigrationFs>, fs_path: P, database_url: U) -> Self {
        Self {
            fs,
            fs_path: fs_path.into(),
            database_url: database_url.into(),
        }
    }

    /// The embedded PostgreSQL scripts
    pub fn embedded<U: Into<String>>(database_url: U) -> Self {
        Self::new(Arc::new(FS), POSTGRES_PATH, database_url)
    }
}

/// Whether a known migration has been applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub version: i64,
    pub description: String,
    pub applied: bool,
}

/// A migration source bound to one database
#[derive(Debug)]
pub struct Migrations {
    migrator: Migrator,
    pool: PgPool,
}

impl Migrations {
    /// Load the scripts and bind them to `database_url`.
    ///
    /// No connection is opened until [`Migrations::up`], [`Migrations::down`]
    /// or [`Migrations::status`] runs.
    pub async fn new(params: MigrationParams) -> MigrationResult<Self> {
        let source = FsSource::new(Arc::clone(&params.fs), params.fs_path.clone());
        let migrator = Migrator::new(source).await.map_err(|e| match e {
            MigrateError::Source(source) => MigrationError::SourceInitFailed {
                path: params.fs_path.clone(),
                source,
            },
            other => MigrationError::Engine(other),
        })?;

        let pool = connect_lazy(&params.database_url)?;

        info!(
            path = %params.fs_path,
            migrations = migrator.iter().filter(|m| !m.migration_type.is_down_migration()).count(),
            "Loaded migrations"
        );

        Ok(Self { migrator, pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply every pending migration in ascending version order
    pub async fn up(&self) -> MigrationResult<()> {
        self.migrator.run(&self.pool).await?;
        info!("Migrations applied");
        Ok(())
    }

    /// Revert every applied migration in descending version order
    pub async fn down(&self) -> MigrationResult<()> {
        self.migrator.undo(&self.pool, -1).await?;
        info!("Migrations reverted");
        Ok(())
    }

    pub async fn status(&self) -> MigrationResult<Vec<MigrationStatus>> {
        let mut conn = self.pool.acquire().await?;
        conn.ensure_migrations_table().await?;
        let applied: Vec<i64> = conn
            .list_applied_migrations()
            .await?
            .into_iter()
            .map(|m| m.version)
            .collect();

        Ok(self
            .migrator
            .iter()
            .filter(|m| !m.migration_type.is_down_migration())
            .map(|m| MigrationStatus {
                version: m.version,
                description: m.description.to_string(),
                applied: applied.contains(&m.version),
            })
            .collect())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn connect_lazy(database_url: &str) -> MigrationResult<PgPool> {
    let url = url::Url::parse(database_url)
        .map_err(|e| MigrationError::engine_init(format!("invalid database url: {}", e)))?;
    if !matches!(url.scheme(), "postgres" | "postgresql") {
        return Err(MigrationError::engine_init(format!(
            "unsupported database scheme '{}'",
            url.scheme()
        )));
    }

    let options = PgConnectOptions::from_str(database_url)
        .map_err(|e| MigrationError::engine_init(e.to_string()))?;

    // The migrator holds an advisory lock on the connection it runs on.
    Ok(PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy_with(options))
}
