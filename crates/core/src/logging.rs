//! # Structured Logging
//!
//! Subscriber setup for binaries and test harnesses. The library crates only
//! emit `tracing` events; whoever owns the process installs the subscriber.

use serde_json::{json, Value};
use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn")
    pub level: String,
    /// Enable JSON structured logging (vs plain text)
    pub json_format: bool,
    /// Enable pretty printing for interactive use
    pub pretty_print: bool,
    /// Include file and line number information
    pub include_location: bool,
    /// Environment filter (e.g. "testingx=debug,sqlx=warn"); `RUST_LOG` wins when set
    pub env_filter: Option<String>,
    /// Custom fields logged once at startup
    pub global_fields: serde_json::Map<String, Value>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            pretty_print: false,
            include_location: false,
            env_filter: Some("info,sqlx=warn,bollard=warn".to_string()),
            global_fields: serde_json::Map::new(),
        }
    }
}

impl LoggingConfig {
    /// Verbose, human-readable output
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
            pretty_print: true,
            include_location: true,
            env_filter: Some("testingx=debug,sqlx=warn,bollard=info".to_string()),
            global_fields: serde_json::Map::new(),
        }
    }

    /// Minimal output for test harnesses
    pub fn test() -> Self {
        Self {
            level: "warn".to_string(),
            json_format: false,
            pretty_print: false,
            include_location: false,
            env_filter: Some("testingx=warn".to_string()),
            global_fields: serde_json::Map::new(),
        }
    }

    pub fn with_level<S: Into<String>>(mut self, level: S) -> Self {
        self.level = level.into();
        self.env_filter = None;
        self
    }

    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    pub fn with_json(mut self, json_format: bool) -> Self {
        self.json_format = json_format;
        self
    }

    pub fn with_global_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.global_fields.insert(key.into(), value.into());
        self
    }

    fn filter(&self) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
        let directives = self.env_filter.as_deref().unwrap_or(&self.level);
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(directives))
    }
}

/// Install the global subscriber.
///
/// Fails if the filter does not parse or a subscriber is already installed,
/// which is common when several tests initialise logging in one process.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = config.filter()?;

    if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stderr).json())
            .try_init()?;
    } else if config.pretty_print {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                Layer::new()
                    .with_writer(io::stderr)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .pretty(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                Layer::new()
                    .with_writer(io::stderr)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location),
            )
            .try_init()?;
    }

    announce(&config);
    Ok(())
}

/// Startup line carrying the level, format and global fields
fn announce(config: &LoggingConfig) {
    if config.global_fields.is_empty() {
        tracing::info!(
            "logging initialized (level: {}, format: {})",
            config.level,
            if config.json_format { "json" } else { "text" }
        );
    } else {
        let mut init_msg = json!({ "message": "logging initialized", "level": config.level });
        for (key, value) in &config.global_fields {
            init_msg[key] = value.clone();
        }
        tracing::info!("{}", init_msg);
    }
}
