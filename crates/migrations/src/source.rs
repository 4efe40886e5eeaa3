//! Turning a directory of `.sql` files into sqlx migrations

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use sqlx::error::BoxDynError;
use sqlx::migrate::{Migration, MigrationSource, MigrationType};

use crate::fs::MigrationFs;

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("migration '{name}' has an invalid version number")]
    InvalidVersion { name: String },

    #[error("duplicate {direction} migration for version {version}: '{name}'")]
    Duplicate {
        version: i64,
        direction: &'static str,
        name: String,
    },
}

/// The parts of a migration file name
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScriptName {
    pub version: i64,
    pub description: String,
    pub migration_type: MigrationType,
}

/// Parse `{version}_{name}.sql`, `{version}_{name}.up.sql` or
/// `{version}_{name}.down.sql`. Other names are not migrations and yield
/// `Ok(None)`.
pub(crate) fn parse_name(file_name: &str) -> Result<Option<ScriptName>, SourceError> {
    let stem = match file_name.strip_suffix(".sql") {
        Some(stem) => stem,
        None => return Ok(None),
    };

    let (stem, migration_type) = if let Some(stem) = stem.strip_suffix(".up") {
        (stem, MigrationType::ReversibleUp)
    } else if let Some(stem) = stem.strip_suffix(".down") {
        (stem, MigrationType::ReversibleDown)
    } else {
        (stem, MigrationType::Simple)
    };

    let (version, description) = match stem.split_once('_') {
        Some(parts) => parts,
        None => return Ok(None),
    };
    if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }

    let version = version.parse::<i64>().map_err(|_| SourceError::InvalidVersion {
        name: file_name.to_string(),
    })?;

    Ok(Some(ScriptName {
        version,
        description: description.replace('_', " "),
        migration_type,
    }))
}

/// Read every migration under `dir`, ordered by version with each up script
/// ahead of its down script.
pub(crate) fn load(fs: &dyn MigrationFs, dir: &str) -> Result<Vec<Migration>, SourceError> {
    let dir = dir.trim_matches('/');
    let names = fs.read_dir(dir).map_err(|source| SourceError::Io {
        path: dir.to_string(),
        source,
    })?;

    let mut seen = HashSet::new();
    let mut migrations = Vec::new();

    for name in names {
        let script = match parse_name(&name)? {
            Some(script) => script,
            None => {
                tracing::debug!(file = %name, "Skipping non-migration file");
                continue;
            }
        };

        let direction = if script.migration_type.is_down_migration() {
            "down"
        } else {
            "up"
        };
        if !seen.insert((script.version, direction)) {
            return Err(SourceError::Duplicate {
                version: script.version,
                direction,
                name,
            });
        }

        let path = format!("{}/{}", dir, name);
        let sql = fs
            .read_to_string(&path)
            .map_err(|source| SourceError::Io { path, source })?;

        migrations.push(Migration::new(
            script.version,
            Cow::Owned(script.description),
            script.migration_type,
            Cow::Owned(sql),
        ));
    }

    migrations.sort_by_key(|m| (m.version, m.migration_type.is_down_migration()));
    Ok(migrations)
}

/// A [`MigrationFs`] sub-directory as a sqlx [`MigrationSource`]
pub struct FsSource {
    fs: Arc<dyn MigrationFs>,
    path: String,
}

impl FsSource {
    pub fn new(fs: Arc<dyn MigrationFs>, path: impl Into<String>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }
}

impl fmt::Debug for FsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsSource").field("path", &self.path).finish()
    }
}

impl<'s> MigrationSource<'s> for FsSource {
    fn resolve(self) -> BoxFuture<'s, Result<Vec<Migration>, BoxDynError>> {
        Box::pin(async move { Ok(load(self.fs.as_ref(), &self.path)?) })
    }
}
