//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing.
//! The database URL is wrapped in secrecy::SecretString to prevent log leaks.

use crate::error::{Error, Result};
use secrecy::SecretString;

/// Name of the deployment-local switch that forces every attempt to fail.
pub const FORCE_FAILURES_VAR: &str = "FOIA_FORCE_FAILURES";

const MAX_FAILURES_VAR: &str = "FOIA_MAX_SUBMISSION_FAILURES";

/// Default number of failed attempts before a request is marked failed.
pub const DEFAULT_MAX_SUBMISSION_FAILURES: u32 = 3;

#[derive(Debug)]
pub struct Config {
    pub database_url: SecretString,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
    pub worker: WorkerConfig,
}

/// Settings injected into the submission worker at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Failed attempts allowed before giving up. Always at least 1.
    pub max_submission_failures: u32,
    /// Test environments only. Treat every attempt as a failure with mock error detail.
    pub force_failures: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_submission_failures: DEFAULT_MAX_SUBMISSION_FAILURES,
            force_failures: false,
        }
    }
}

impl WorkerConfig {
    /// Read the worker settings from the environment.
    ///
    /// The forced-failure switch must be both present and truthy; anything
    /// else leaves it off.
    pub fn from_env() -> Result<Self> {
        let max_submission_failures = match std::env::var(MAX_FAILURES_VAR) {
            Ok(raw) => parse_max_failures(&raw)?,
            Err(_) => DEFAULT_MAX_SUBMISSION_FAILURES,
        };
        let force_failures = std::env::var(FORCE_FAILURES_VAR)
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        Ok(Self {
            max_submission_failures,
            force_failures,
        })
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: SecretString::from(required_var("DATABASE_URL")?),
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            worker: WorkerConfig::from_env()?,
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}

fn parse_max_failures(raw: &str) -> Result<u32> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(Error::Config(format!(
            "{MAX_FAILURES_VAR} must be a positive integer, got {raw:?}"
        ))),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
