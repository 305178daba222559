//! Core types for the group variables API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Placeholder printed instead of variable values.
pub const REDACTED: &str = "(sensitive value)";

/// A CI/CD variable as returned by `GET /groups/:id/variables/:key`.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GroupVariable {
    /// Variable name.
    pub key: String,
    /// Variable value (secret).
    pub value: String,
    /// Only exposed to protected branches and tags.
    #[serde(default)]
    pub protected: bool,
    /// `env_var` or `file`.
    #[serde(default = "default_variable_type")]
    pub variable_type: String,
    /// Masked in job logs.
    #[serde(default)]
    pub masked: bool,
    /// Environment scope; `*` when unscoped.
    #[serde(default)]
    pub environment_scope: Option<String>,
}

fn default_variable_type() -> String {
    "env_var".to_string()
}

impl fmt::Debug for GroupVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupVariable")
            .field("key", &self.key)
            .field("value", &REDACTED)
            .field("protected", &self.protected)
            .field("variable_type", &self.variable_type)
            .field("masked", &self.masked)
            .field("environment_scope", &self.environment_scope)
            .finish()
    }
}

/// Body of `POST /groups/:id/variables`.
///
/// `environment_scope` is deliberately absent so GitLab applies its
/// all-environments default.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct CreateVariableOptions {
    /// Variable name.
    pub key: String,
    /// Variable value.
    pub value: String,
    /// Restrict to protected branches and tags.
    pub protected: bool,
}

impl fmt::Debug for CreateVariableOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateVariableOptions")
            .field("key", &self.key)
            .field("value", &REDACTED)
            .field("protected", &self.protected)
            .finish()
    }
}

/// Body of `PUT /groups/:id/variables/:key`.
///
/// `key` must equal the key in the request path.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct UpdateVariableOptions {
    /// Variable name, identical to the path key.
    pub key: String,
    /// New variable value.
    pub value: String,
    /// Restrict to protected branches and tags.
    pub protected: bool,
}

impl fmt::Debug for UpdateVariableOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateVariableOptions")
            .field("key", &self.key)
            .field("value", &REDACTED)
            .field("protected", &self.protected)
            .finish()
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (1 means no retry)
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
            max_delay: Duration::from_secs(30),
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}
