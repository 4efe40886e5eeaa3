//! # testingx-core
//!
//! Plumbing shared by the testingx crates: the retry-until-deadline
//! combinator and its backoff policies, a cancellation/deadline [`Context`],
//! structured logging setup and environment configuration helpers.
//!
//! Nothing in here knows about containers or databases.

pub mod config;
pub mod context;
pub mod logging;
pub mod retry;

pub use config::ConfigError;
pub use context::{Context, Interrupted};
pub use logging::{init_logging, LoggingConfig};
pub use retry::{retry, BackoffPolicy, ConstantBackoff, ExponentialBackoff, DEFAULT_MAX_WAIT};
