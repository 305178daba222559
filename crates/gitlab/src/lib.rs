//! # gitlab
//!
//! Blocking client for GitLab's group-level CI/CD variables API.
//!
//! This crate provides:
//! - A [`Backend`](backend::Backend) trait mapping 1-to-1 onto the four
//!   group variable endpoints, with an HTTP and an in-memory implementation
//! - A [`Client`] that applies retry with exponential backoff to transient
//!   failures (connection errors, 429, 5xx)
//! - Validation of variable names and group references
//!
//! ## Example
//!
//! ```no_run
//! use gitlab::{Client, ClientConfig, CreateVariableOptions};
//!
//! let client = Client::new(&ClientConfig {
//!     token: Some("glpat-xxx".into()),
//!     ..ClientConfig::default()
//! })
//! .expect("valid config");
//!
//! client
//!     .create_variable(
//!         "platform/infra",
//!         &CreateVariableOptions {
//!             key: "DEPLOY_TOKEN".into(),
//!             value: "s3cret".into(),
//!             protected: true,
//!         },
//!     )
//!     .expect("create failed");
//! ```
//!
//! ## Not found
//!
//! A missing group or variable surfaces as an [`Error`] whose
//! [`is_not_found`](Error::is_not_found) returns true. It is never retried.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod retry;
pub mod types;
pub mod validate;

pub use error::{Error, ErrorCategory, Result};
pub use types::{
    CreateVariableOptions, GroupVariable, REDACTED, RetryConfig, UpdateVariableOptions,
};

use backend::Backend;
use backend::http::{DEFAULT_BASE_URL, HttpBackend};
use retry::{LogCallback, RetryCallback};
use std::time::Duration;

/// Connection settings for [`Client::new`].
#[derive(Clone)]
pub struct ClientConfig {
    /// API base URL including `/api/v4`.
    pub base_url: String,
    /// Access token sent as `PRIVATE-TOKEN`.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
    /// Retry policy for transient failures.
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout: Some(Duration::from_secs(30)),
            retry: RetryConfig::default(),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| REDACTED))
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

/// High-level client for group variables.
///
/// Wraps a backend and retries transient failures. Safe to share between
/// threads; it holds no per-variable state.
pub struct Client {
    backend: Box<dyn Backend>,
    retry: RetryConfig,
    callback: Box<dyn RetryCallback>,
}

impl Client {
    /// Create a client talking HTTP to the configured instance.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let backend =
            HttpBackend::with_timeout(&config.base_url, config.token.clone(), config.timeout)?;
        Ok(Self {
            backend: Box::new(backend),
            retry: config.retry.clone(),
            callback: Box::new(LogCallback),
        })
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>, retry: RetryConfig) -> Self {
        Self {
            backend,
            retry,
            callback: Box::new(LogCallback),
        }
    }

    /// Create a variable in a group.
    ///
    /// POST is not idempotent: a lost response may hide a committed create,
    /// and resending it would fail with "already taken". Only 429 is retried.
    pub fn create_variable(
        &self,
        group: &str,
        opts: &CreateVariableOptions,
    ) -> Result<GroupVariable> {
        retry::with_retry_if(
            &self.retry,
            Some(self.callback.as_ref()),
            Error::is_rejected_unprocessed,
            || self.backend.create_variable(group, opts),
        )
    }

    /// Fetch a variable by key.
    pub fn get_variable(&self, group: &str, key: &str) -> Result<GroupVariable> {
        self.retrying(|| self.backend.get_variable(group, key))
    }

    /// Update value and protection of an existing variable.
    pub fn update_variable(
        &self,
        group: &str,
        key: &str,
        opts: &UpdateVariableOptions,
    ) -> Result<GroupVariable> {
        self.retrying(|| self.backend.update_variable(group, key, opts))
    }

    /// Delete a variable.
    pub fn remove_variable(&self, group: &str, key: &str) -> Result<()> {
        self.retrying(|| self.backend.remove_variable(group, key))
    }

    fn retrying<T>(&self, operation: impl FnMut() -> Result<T>) -> Result<T> {
        retry::with_retry(&self.retry, Some(self.callback.as_ref()), operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::memory::{MemoryBackend, Operation};
    use std::sync::Arc;

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            backoff_factor: 1.0,
            max_delay: Duration::from_millis(2),
        }
    }

    #[test]
    fn test_client_retries_server_errors() {
        let memory = Arc::new(MemoryBackend::new());
        memory.fail_next(Operation::Get, 502);
        memory.insert(
            "g",
            GroupVariable {
                key: "K".into(),
                value: "v".into(),
                protected: false,
                variable_type: "env_var".into(),
                masked: false,
                environment_scope: None,
            },
        );

        let client = Client::with_backend(Box::new(memory.clone()), fast_retry());
        assert_eq!(client.get_variable("g", "K").unwrap().value, "v");
        assert_eq!(memory.calls().len(), 2);
    }

    #[test]
    fn test_client_does_not_retry_not_found() {
        let memory = Arc::new(MemoryBackend::new());
        let client = Client::with_backend(Box::new(memory.clone()), fast_retry());

        assert!(client.get_variable("g", "K").unwrap_err().is_not_found());
        assert_eq!(memory.calls().len(), 1);
    }

    /// Commits the first create, then loses the response.
    struct LostResponse {
        inner: Arc<MemoryBackend>,
        dropped: std::sync::atomic::AtomicBool,
    }

    impl Backend for LostResponse {
        fn create_variable(
            &self,
            group: &str,
            opts: &CreateVariableOptions,
        ) -> Result<GroupVariable> {
            let created = self.inner.create_variable(group, opts)?;
            if self
                .dropped
                .swap(true, std::sync::atomic::Ordering::SeqCst)
            {
                Ok(created)
            } else {
                Err(Error::http("connection reset", None))
            }
        }

        fn get_variable(&self, group: &str, key: &str) -> Result<GroupVariable> {
            self.inner.get_variable(group, key)
        }

        fn update_variable(
            &self,
            group: &str,
            key: &str,
            opts: &UpdateVariableOptions,
        ) -> Result<GroupVariable> {
            self.inner.update_variable(group, key, opts)
        }

        fn remove_variable(&self, group: &str, key: &str) -> Result<()> {
            self.inner.remove_variable(group, key)
        }
    }

    fn create_opts() -> CreateVariableOptions {
        CreateVariableOptions {
            key: "FOO".into(),
            value: "bar".into(),
            protected: false,
        }
    }

    #[test]
    fn test_create_is_not_resent_after_lost_response() {
        let memory = Arc::new(MemoryBackend::new());
        let backend = LostResponse {
            inner: memory.clone(),
            dropped: std::sync::atomic::AtomicBool::new(false),
        };
        let client = Client::with_backend(Box::new(backend), fast_retry());

        let err = client.create_variable("g", &create_opts()).unwrap_err();
        assert_eq!(err.status_code(), None);
        assert_eq!(memory.calls().len(), 1);
        assert!(memory.variable("g", "FOO").is_some());
    }

    #[test]
    fn test_create_retries_rate_limit() {
        let memory = Arc::new(MemoryBackend::new());
        memory.fail_next(Operation::Create, 429);
        let client = Client::with_backend(Box::new(memory.clone()), fast_retry());

        client.create_variable("g", &create_opts()).unwrap();
        assert_eq!(memory.calls().len(), 2);
    }

    #[test]
    fn test_create_does_not_retry_server_error() {
        let memory = Arc::new(MemoryBackend::new());
        memory.fail_next(Operation::Create, 502);
        let client = Client::with_backend(Box::new(memory.clone()), fast_retry());

        assert_eq!(
            client.create_variable("g", &create_opts()).unwrap_err().status_code(),
            Some(502)
        );
        assert_eq!(memory.calls().len(), 1);
    }

    #[test]
    fn test_client_config_debug_hides_token() {
        let config = ClientConfig {
            token: Some("glpat-secret".into()),
            ..ClientConfig::default()
        };
        assert!(!format!("{config:?}").contains("glpat-secret"));
    }
}
