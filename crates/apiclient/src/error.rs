//! Error types for API operations.
//!
//! Errors are categorized by HTTP status so callers can translate them into
//! domain messages ("already exists", "version conflict") instead of raw codes.

use std::fmt;

/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 400: the request payload was rejected.
    BadRequest,
    /// 401/403: missing permission or read-only resource.
    Forbidden,
    /// 404: target does not exist.
    NotFound,
    /// 409: duplicate create or concurrent modification.
    Conflict,
    /// 412: optimistic-locking version did not match.
    PreconditionFailed,
    /// 5xx: server-side failure.
    Server,
    /// Connection, TLS or timeout failure.
    Network,
    /// Response body could not be decoded.
    Format,
    /// Anything else.
    Other,
}

impl ErrorCategory {
    /// Map an HTTP status code to a category.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::BadRequest,
            401 | 403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            412 => Self::PreconditionFailed,
            500..=599 => Self::Server,
            _ => Self::Other,
        }
    }

    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Server)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::BadRequest => "Request rejected",
            Self::Forbidden => "Permission denied",
            Self::NotFound => "Not found",
            Self::Conflict => "Conflict",
            Self::PreconditionFailed => "Version conflict",
            Self::Server => "Service unavailable",
            Self::Network => "Network connectivity issue",
            Self::Format => "Invalid response format",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::BadRequest => "Check the payload against the API schema",
            Self::Forbidden => "Check the token scopes and the resource's sharing settings",
            Self::NotFound => "Verify the identifier and the selected environment",
            Self::Conflict => "The resource already exists or changed concurrently",
            Self::PreconditionFailed => "Re-run apply to pick up the latest version",
            Self::Server => "Try again later",
            Self::Network => "Check your network connection and the environment URL",
            Self::Format => "The server returned an unexpected body",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Network(String),

    /// Invalid response from API.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// The transport could not be configured.
    #[error("invalid transport configuration: {0}")]
    Config(String),
}

impl Error {
    /// Create a status error.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Build a status error from a raw error body.
    ///
    /// Understands `{"error": {"message": ...}}` and falls back to the
    /// (truncated) body text.
    pub fn from_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .or_else(|| v.get("message"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    ErrorCategory::from_status(status).description().to_string()
                } else {
                    trimmed.chars().take(300).collect()
                }
            });
        Self::status(status, message)
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Status { status, .. } => ErrorCategory::from_status(*status),
            Error::Network(_) => ErrorCategory::Network,
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::Config(_) => ErrorCategory::Other,
        }
    }

    /// HTTP status, if the server answered.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-provided detail, or the error's own text.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Error::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the target does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::status(code, format!("HTTP {}", code)),
            other => Self::Network(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
