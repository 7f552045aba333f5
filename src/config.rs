//! Configuration types for banwatch

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Task-solver service settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Base URL of the task service API (default: "https://api.anti-captcha.com")
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Account key authenticating every request to the task service
    #[serde(default)]
    pub client_key: String,

    /// Interval between result polls (default: 5s)
    ///
    /// The service solves tasks out of band; polling faster than this gains
    /// nothing and burns the request quota.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Upper bound on one solve call, submission included (default: 120s)
    #[serde(default = "default_solve_timeout")]
    pub solve_timeout: Duration,

    /// Per-request HTTP timeout (default: 30s)
    #[serde(default = "default_http_timeout")]
    pub http_timeout: Duration,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            client_key: String::new(),
            poll_interval: default_poll_interval(),
            solve_timeout: default_solve_timeout(),
            http_timeout: default_http_timeout(),
        }
    }
}

impl SolverConfig {
    /// Validate solver settings, naming the offending key on failure.
    pub fn validate(&self) -> Result<()> {
        if self.client_key.is_empty() {
            return Err(Error::Config {
                message: "task service client key must not be empty".to_string(),
                key: Some("solver.client_key".to_string()),
            });
        }
        if let Err(e) = Url::parse(&self.api_url) {
            return Err(Error::Config {
                message: format!("invalid task service URL: {e}"),
                key: Some("solver.api_url".to_string()),
            });
        }
        if self.poll_interval.is_zero() {
            return Err(Error::Config {
                message: "poll interval must be non-zero".to_string(),
                key: Some("solver.poll_interval".to_string()),
            });
        }
        if self.solve_timeout.is_zero() {
            return Err(Error::Config {
                message: "solve timeout must be non-zero".to_string(),
                key: Some("solver.solve_timeout".to_string()),
            });
        }
        Ok(())
    }
}

/// Status-check endpoint settings
///
/// Describes the authenticated page fetched to determine an account's
/// standing. Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Page fetched to determine an account's standing
    #[serde(default)]
    pub url: String,

    /// Name of the session cookie carrying the account credential (default: "session")
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// reCAPTCHA site key, when the endpoint is CAPTCHA-gated
    #[serde(default)]
    pub recaptcha_site_key: Option<String>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: String::default(),
            cookie_name: default_cookie_name(),
            recaptcha_site_key: None,
        }
    }
}

impl EndpointConfig {
    /// Validate endpoint settings, naming the offending key on failure.
    pub fn validate(&self) -> Result<()> {
        if let Err(e) = Url::parse(&self.url) {
            return Err(Error::Config {
                message: format!("invalid status endpoint URL: {e}"),
                key: Some("endpoint.url".to_string()),
            });
        }
        if self.cookie_name.is_empty() {
            return Err(Error::Config {
                message: "session cookie name must not be empty".to_string(),
                key: Some("endpoint.cookie_name".to_string()),
            });
        }
        Ok(())
    }
}

/// Sweep orchestration settings (cooldown and batching)
///
/// Used as a nested sub-config within [`Config`]. Both values are read once
/// at process start; they are not meant to change at runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Minimum spacing between two sweeps by the same actor (default: 60s)
    #[serde(default = "default_cooldown_window")]
    pub cooldown_window: Duration,

    /// Maximum results per delivered batch (default: 10)
    ///
    /// Mirrors the downstream message-delivery limit of the notification
    /// channel; the sink is never handed a larger group.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            cooldown_window: default_cooldown_window(),
            batch_size: default_batch_size(),
        }
    }
}

impl CheckConfig {
    /// Validate orchestration settings, naming the offending key on failure.
    pub fn validate(&self) -> Result<()> {
        if self.cooldown_window.is_zero() {
            return Err(Error::Config {
                message: "cooldown window must be non-zero".to_string(),
                key: Some("checks.cooldown_window".to_string()),
            });
        }
        if self.batch_size == 0 {
            return Err(Error::Config {
                message: "batch size must be at least 1".to_string(),
                key: Some("checks.batch_size".to_string()),
            });
        }
        Ok(())
    }
}

/// Main configuration for banwatch
///
/// Fields are organized into logical sub-configs:
/// - [`solver`](SolverConfig) - task service URL, key, polling cadence
/// - [`checks`](CheckConfig) - cooldown window and batch size
/// - [`endpoint`](EndpointConfig) - the authenticated status page
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Task-solver service settings
    #[serde(default)]
    pub solver: SolverConfig,

    /// Sweep orchestration settings
    #[serde(default)]
    pub checks: CheckConfig,

    /// Status endpoint settings
    #[serde(default)]
    pub endpoint: EndpointConfig,
}

impl Config {
    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<()> {
        self.solver.validate()?;
        self.checks.validate()?;
        self.endpoint.validate()
    }
}

fn default_api_url() -> String {
    "https://api.anti-captcha.com".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_solve_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_cookie_name() -> String {
    "session".to_string()
}

fn default_cooldown_window() -> Duration {
    Duration::from_secs(60)
}

fn default_batch_size() -> usize {
    10
}
