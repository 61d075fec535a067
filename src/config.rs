//! Helpers for parsing configuration

use std::env::VarError;

use error_stack::{Report, ResultExt};
use thiserror::Error;

use crate::{interceptor::InterceptorConfig, severity::ParseSeverityError, Severity};

/// The error returned when configuration can't be read
#[derive(Error, Debug)]
#[error("Invalid interceptor configuration")]
pub struct ConfigError;

/// Get an environment variable with an optional prefix
pub fn prefixed_env_var(prefix: &str, key: &str) -> Result<String, VarError> {
    if prefix.is_empty() {
        std::env::var(key)
    } else {
        std::env::var(format!("{prefix}{key}"))
    }
}

/// Parse a comma-separated list of severities, such as `error,info`. Blank entries are
/// skipped, so an empty string yields an empty list.
pub fn parse_log_levels(value: &str) -> Result<Vec<Severity>, ParseSeverityError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

impl InterceptorConfig {
    /// Read the configuration from the `<prefix>LOG_LEVEL` environment variable.
    ///
    /// When the variable is unset every level is logged. When it is set but empty, nothing
    /// is logged.
    pub fn from_env(prefix: &str) -> Result<InterceptorConfig, Report<ConfigError>> {
        let log_level = match prefixed_env_var(prefix, "LOG_LEVEL") {
            Ok(value) => Some(
                parse_log_levels(&value)
                    .change_context(ConfigError)
                    .attach_printable_lazy(|| format!("{prefix}LOG_LEVEL={value:?}"))?,
            ),
            Err(VarError::NotPresent) => None,
            Err(e) => {
                return Err(Report::new(e)
                    .change_context(ConfigError)
                    .attach_printable(format!("{prefix}LOG_LEVEL")))
            }
        };

        Ok(InterceptorConfig { log_level })
    }
}
