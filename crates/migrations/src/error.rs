//! Migration runner errors

use sqlx::migrate::MigrateError;

pub type MigrationResult<T> = Result<T, MigrationError>;

#[derive(thiserror::Error, Debug)]
pub enum MigrationError {
    #[error("failed to initialize embedded migration file system at '{path}': {source}")]
    SourceInitFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to initialize migration package: {message}")]
    EngineInitFailed { message: String },

    #[error("migration failed: {0}")]
    Engine(#[from] MigrateError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl MigrationError {
    pub(crate) fn engine_init<S: Into<String>>(message: S) -> Self {
        MigrationError::EngineInitFailed {
            message: message.into(),
        }
    }
}
