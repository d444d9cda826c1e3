//! Environment-driven configuration for correlation scopes and logging.
//!
//! # Design
//! - Values come from `CORRID_*` environment variables; unset keys keep defaults.
//! - Flags accept `1/true/yes/on` and `0/false/no/off` (case-insensitive).
//! - Unrecognised values are rejected instead of silently falling back.

use corrid_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig};
use serde::Deserialize;

use crate::error::{CorrelationError, CorrelationResult};
use crate::resolve::ResolutionPolicy;

/// Environment key toggling reuse of headers already staged on the response.
pub const ENV_CHECK_RESPONSE_HEADERS: &str = "CORRID_CHECK_RESPONSE_HEADERS";
/// Environment key for the log level.
pub const ENV_LOG_LEVEL: &str = "CORRID_LOG_LEVEL";
/// Environment key for the log format (`json` or `pretty`).
pub const ENV_LOG_FORMAT: &str = "CORRID_LOG_FORMAT";

/// Settings shared by the middleware, direct attachment, and logging.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Reuse a correlation header already staged on the response.
    pub check_existing_response_headers: bool,
    /// Log level handed to the tracing filter.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            check_existing_response_headers: true,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::infer(),
        }
    }
}

impl CorrelationConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is set to an unrecognised value.
    pub fn from_env() -> CorrelationResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps keys to raw values.
    ///
    /// # Errors
    ///
    /// Returns an error when a value is set but unrecognised.
    pub fn from_lookup<L>(lookup: L) -> CorrelationResult<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_CHECK_RESPONSE_HEADERS) {
            config.check_existing_response_headers = parse_flag(ENV_CHECK_RESPONSE_HEADERS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_LOG_LEVEL) {
            let level = raw.trim();
            if level.is_empty() {
                return Err(invalid(ENV_LOG_LEVEL, &raw, "empty log level"));
            }
            config.log_level = level.to_string();
        }
        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            config.log_format = LogFormat::from_name(raw.trim())
                .ok_or_else(|| invalid(ENV_LOG_FORMAT, &raw, "unknown log format"))?;
        }
        Ok(config)
    }

    /// Resolution policy derived from this configuration.
    #[must_use]
    pub const fn policy(&self) -> ResolutionPolicy {
        ResolutionPolicy {
            check_existing_response_headers: self.check_existing_response_headers,
        }
    }

    /// Logging settings borrowed from this configuration.
    #[must_use]
    pub fn logging(&self) -> LoggingConfig<'_> {
        LoggingConfig {
            level: &self.log_level,
            format: self.log_format,
        }
    }

    /// Install the global tracing subscriber using these settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed.
    pub fn init_logging(&self) -> CorrelationResult<()> {
        corrid_telemetry::init_logging(&self.logging()).map_err(|source| {
            CorrelationError::Telemetry {
                operation: "telemetry.init_logging",
                source,
            }
        })
    }
}

fn parse_flag(name: &'static str, raw: &str) -> CorrelationResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(name, raw, "expected boolean flag")),
    }
}

fn invalid(name: &'static str, value: &str, reason: &'static str) -> CorrelationError {
    CorrelationError::InvalidConfig {
        name,
        value: value.to_string(),
        reason,
    }
}
