//! Environment-driven configuration helpers

use std::env;
use std::str::FromStr;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: '{value}', expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },
}

/// Read a non-empty environment variable
pub fn env_string(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.trim().is_empty())
}

/// Read and parse an environment variable.
///
/// Unset or blank variables yield `Ok(None)`; a value that does not parse is
/// an [`ConfigError::InvalidValue`] naming `expected`.
pub fn env_parse<T: FromStr>(var: &str, expected: &str) -> Result<Option<T>, ConfigError> {
    match env_string(var) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                field: var.to_string(),
                value,
                expected: expected.to_string(),
            }),
        None => Ok(None),
    }
}
