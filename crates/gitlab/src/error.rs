//! Error types for GitLab API operations.
//!
//! Errors are categorized so the client can decide whether a failed request
//! is worth retrying, and so callers can recognise a missing remote object
//! without parsing messages.

use std::fmt;
use std::io;

/// Result type alias for GitLab operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of GitLab errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connection failures, timeouts, 429 and 5xx responses (transient).
    Network,
    /// The remote object does not exist (404).
    NotFound,
    /// Authentication or authorization rejected (401/403).
    Auth,
    /// Any other 4xx: the request itself is wrong.
    Request,
    /// The response body could not be decoded.
    Format,
    /// Local configuration problem.
    Config,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::NotFound => "Remote object not found",
            Self::Auth => "Authentication failed",
            Self::Request => "Request rejected",
            Self::Format => "Invalid response format",
            Self::Config => "Invalid client configuration",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check connectivity to the GitLab instance and try again",
            Self::NotFound => "Verify the group reference and variable key",
            Self::Auth => "Check that the token is valid and has the api scope",
            Self::Request => "Check the variable attributes against GitLab's rules",
            Self::Format => "The GitLab API returned an unexpected payload",
            Self::Config => "Check the [gitlab] section of the configuration",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to GitLab.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed, either with a status code or at the transport.
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// Invalid response from API.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Client misconfiguration (bad base URL, missing token).
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Http {
            message: message.into(),
            status,
        }
    }

    /// Create an HTTP error from a bare status code.
    pub fn status(code: u16) -> Self {
        Self::http(format!("HTTP {code}"), Some(code))
    }

    /// HTTP status code carried by this error, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether the remote reported the object as absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    /// Get the error category for retry logic.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Http { status: None, .. } => ErrorCategory::Network,
            Error::Http {
                status: Some(code), ..
            } => match code {
                404 => ErrorCategory::NotFound,
                401 | 403 => ErrorCategory::Auth,
                429 | 500..=599 => ErrorCategory::Network,
                _ => ErrorCategory::Request,
            },
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::Config(_) => ErrorCategory::Config,
            Error::Other(_) => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Whether the remote refused the request before acting on it.
    ///
    /// Only 429 qualifies. A lost response or a 5xx may follow a committed
    /// write, so non-idempotent requests must not be resent on those.
    #[must_use]
    pub fn is_rejected_unprocessed(&self) -> bool {
        self.status_code() == Some(429)
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::status(code),
            ureq::Error::Json(e) => Self::InvalidResponse(e.to_string()),
            other => Self::Http {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Http {
            message: err.to_string(),
            status: None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
