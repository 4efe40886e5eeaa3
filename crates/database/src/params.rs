//! Provisioning parameters and their defaults

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use testingx_core::config::{env_parse, env_string};
use testingx_core::ConfigError;
use testingx_docker::{DockerPool, PortBinding, RunOptions};

/// Container port the server listens on
pub const POSTGRES_PORT: &str = "5432/tcp";

pub const DEFAULT_REPOSITORY: &str = "postgres";
pub const DEFAULT_TAG: &str = "14";
pub const DEFAULT_DATABASE: &str = "postgres";
pub const DEFAULT_USERNAME: &str = "postgres";
pub const DEFAULT_PASSWORD: &str = "postgres";

/// Used when `container_expiration` is left at zero
pub const DEFAULT_EXPIRATION_SECS: u64 = 120;

/// Expiration applied by `provision_debuggable`
pub const DEBUG_EXPIRATION_SECS: i64 = 900;

/// Host port `provision_debuggable` binds to unless told otherwise
pub const DEFAULT_DEBUG_HOST_PORT: &str = "5433";

/// Budget for the liveness probe loop of one provisioning call
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(60);

/// Bound on a single liveness probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Label attached to every container this crate starts
pub const CONTAINER_LABEL: &str = "testingx";

/// Parameters for [`crate::provision`].
///
/// Empty strings and a zero expiration mean "use the default". Call sites
/// usually start from `PostgresTestParams::default()` and override a few
/// fields with the `with_*` builders.
#[derive(Debug, Clone, Default)]
pub struct PostgresTestParams {
    /// Reuse an existing orchestration client instead of connecting a new one
    pub pool: Option<Arc<DockerPool>>,

    pub database_name: String,
    pub database_username: String,
    pub database_password: String,

    pub container_repository: String,
    pub container_tag: String,
    /// Extra environment, appended after the `POSTGRES_*` variables
    pub container_env: HashMap<String, String>,
    pub container_host_port_bindings: HashMap<String, Vec<PortBinding>>,
    pub container_cmd: Option<Vec<String>>,
    /// Seconds until the backend stops the container. `0` selects
    /// [`DEFAULT_EXPIRATION_SECS`]; negative values never expire.
    pub container_expiration: i64,
    pub container_disable_auto_remove: bool,

    pub max_wait: Option<Duration>,
    pub probe_timeout: Option<Duration>,
}

impl PostgresTestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `TESTINGX_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut params = Self::default();

        if let Some(repository) = env_string("TESTINGX_POSTGRES_REPOSITORY") {
            params.container_repository = repository;
        }
        if let Some(tag) = env_string("TESTINGX_POSTGRES_TAG") {
            params.container_tag = tag;
        }
        if let Some(name) = env_string("TESTINGX_POSTGRES_DB") {
            params.database_name = name;
        }
        if let Some(username) = env_string("TESTINGX_POSTGRES_USER") {
            params.database_username = username;
        }
        if let Some(password) = env_string("TESTINGX_POSTGRES_PASSWORD") {
            params.database_password = password;
        }
        if let Some(expiration) =
            env_parse::<i64>("TESTINGX_CONTAINER_EXPIRATION", "a whole number of seconds")?
        {
            params.container_expiration = expiration;
        }

        Ok(params)
    }

    pub fn with_pool(mut self, pool: Arc<DockerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_database<S: Into<String>>(mut self, name: S) -> Self {
        self.database_name = name.into();
        self
    }

    pub fn with_credentials<U: Into<String>, P: Into<String>>(mut self, username: U, password: P) -> Self {
        self.database_username = username.into();
        self.database_password = password.into();
        self
    }

    pub fn with_image<R: Into<String>, T: Into<String>>(mut self, repository: R, tag: T) -> Self {
        self.container_repository = repository.into();
        self.container_tag = tag.into();
        self
    }

    pub fn with_env<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.container_env.insert(key.into(), value.into());
        self
    }

    pub fn with_host_port_binding<S: Into<String>>(mut self, container_port: S, binding: PortBinding) -> Self {
        self.container_host_port_bindings
            .entry(container_port.into())
            .or_default()
            .push(binding);
        self
    }

    pub fn with_cmd(mut self, cmd: Vec<String>) -> Self {
        self.container_cmd = Some(cmd);
        self
    }

    pub fn with_expiration(mut self, seconds: i64) -> Self {
        self.container_expiration = seconds;
        self
    }

    pub fn with_auto_remove_disabled(mut self, disabled: bool) -> Self {
        self.container_disable_auto_remove = disabled;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    /// Fill in every unset field
    pub fn with_defaults(self) -> ResolvedParams {
        let expiration = match self.container_expiration {
            0 => Expiration::After(DEFAULT_EXPIRATION_SECS),
            secs if secs < 0 => Expiration::Never,
            secs => Expiration::After(secs as u64),
        };

        ResolvedParams {
            pool: self.pool,
            database_name: or_default(self.database_name, DEFAULT_DATABASE),
            database_username: or_default(self.database_username, DEFAULT_USERNAME),
            database_password: or_default(self.database_password, DEFAULT_PASSWORD),
            container_repository: or_default(self.container_repository, DEFAULT_REPOSITORY),
            container_tag: or_default(self.container_tag, DEFAULT_TAG),
            container_env: self.container_env,
            container_host_port_bindings: self.container_host_port_bindings,
            container_cmd: self.container_cmd,
            expiration,
            auto_remove: !self.container_disable_auto_remove,
            max_wait: self.max_wait.unwrap_or(DEFAULT_MAX_WAIT),
            probe_timeout: self.probe_timeout.unwrap_or(DEFAULT_PROBE_TIMEOUT),
        }
    }
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    After(u64),
    Never,
}

/// [`PostgresTestParams`] with every default applied
#[derive(Debug, Clone)]
pub struct ResolvedParams {
    pub pool: Option<Arc<DockerPool>>,
    pub database_name: String,
    pub database_username: String,
    pub database_password: String,
    pub container_repository: String,
    pub container_tag: String,
    pub container_env: HashMap<String, String>,
    pub container_host_port_bindings: HashMap<String, Vec<PortBinding>>,
    pub container_cmd: Option<Vec<String>>,
    pub expiration: Expiration,
    pub auto_remove: bool,
    pub max_wait: Duration,
    pub probe_timeout: Duration,
}

impl ResolvedParams {
    /// Container environment as `KEY=VALUE` entries.
    ///
    /// The `POSTGRES_*` variables come first; extras follow in key order, so a
    /// duplicate key in `container_env` wins.
    pub fn container_env(&self) -> Vec<String> {
        let mut env = vec![
            format!("POSTGRES_DB={}", self.database_name),
            format!("POSTGRES_USER={}", self.database_username),
            format!("POSTGRES_PASSWORD={}", self.database_password),
        ];

        let mut extras: Vec<_> = self.container_env.iter().collect();
        extras.sort();
        env.extend(extras.into_iter().map(|(key, value)| format!("{}={}", key, value)));
        env
    }

    pub fn run_options(&self, container_name: &str) -> RunOptions {
        RunOptions {
            name: Some(container_name.to_string()),
            repository: self.container_repository.clone(),
            tag: self.container_tag.clone(),
            env: self.container_env(),
            cmd: self.container_cmd.clone(),
            port_bindings: self.container_host_port_bindings.clone(),
            labels: HashMap::from([(CONTAINER_LABEL.to_string(), "true".to_string())]),
            auto_remove: self.auto_remove,
        }
    }

    /// Connection URL for a server reachable at `host_port`
    pub fn database_url(&self, host_port: &str) -> String {
        format!(
            "postgres://{}:{}@{}/{}?sslmode=disable",
            self.database_username, self.database_password, host_port, self.database_name
        )
    }
}
