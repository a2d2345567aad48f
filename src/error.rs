use crate::transport::TransportError;
use std::time::Duration;
use thiserror::Error;

/// Structured error context for configuration and validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "max_requests_per_minute")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_loader", "rate_limit_tracker")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Coarse classification used by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Local admission denial; never retried by the executor.
    RateLimitExceeded,
    /// HTTP 429 from upstream.
    ServerRateLimited,
    /// HTTP 5xx from upstream.
    ServerError,
    /// No HTTP response was obtained.
    NetworkFailure,
    /// Attempt budget used up on a retryable failure.
    MaxRetriesExceeded,
    Cancelled,
    /// Everything else: propagated immediately.
    Other,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::RateLimitExceeded => "rate_limit_exceeded",
            ErrorKind::ServerRateLimited => "server_rate_limited",
            ErrorKind::ServerError => "server_error",
            ErrorKind::NetworkFailure => "network_failure",
            ErrorKind::MaxRetriesExceeded => "max_retries_exceeded",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the SDK.
#[derive(Debug, Error)]
pub enum Error {
    /// `cause` is the failure that triggered the denied retry, if any.
    #[error("Rate limit exceeded: next request allowed at {next_allowed_at_ms} (epoch ms){}", format_cause(.cause))]
    RateLimitExceeded {
        next_allowed_at_ms: u64,
        #[source]
        cause: Option<Box<Error>>,
    },

    #[error("Server rate limited (HTTP 429){}: {message}", format_retry_after(.retry_after_secs))]
    ServerRateLimited {
        retry_after_secs: Option<u64>,
        message: String,
    },

    #[error("Server error: HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Remote error: HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Max retries exceeded after {attempts} attempts: {source}")]
    MaxRetriesExceeded {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_retry_after(secs: &Option<u64>) -> String {
    match secs {
        Some(s) => format!(" retry after {}s", s),
        None => String::new(),
    }
}

fn format_cause(cause: &Option<Box<Error>>) -> String {
    match cause {
        Some(e) => format!(" while retrying after: {}", e),
        None => String::new(),
    }
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Classify this error for the retry policy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::RateLimitExceeded { .. } => ErrorKind::RateLimitExceeded,
            Error::ServerRateLimited { .. } => ErrorKind::ServerRateLimited,
            Error::Server { .. } => ErrorKind::ServerError,
            Error::Transport(_) => ErrorKind::NetworkFailure,
            Error::MaxRetriesExceeded { .. } => ErrorKind::MaxRetriesExceeded,
            Error::Cancelled => ErrorKind::Cancelled,
            _ => ErrorKind::Other,
        }
    }

    /// Whether the executor retries this error locally.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ServerRateLimited | ErrorKind::ServerError | ErrorKind::NetworkFailure
        )
    }

    /// Server-supplied retry hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::ServerRateLimited {
                retry_after_secs: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }

    /// HTTP status carried by the error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::ServerRateLimited { .. } => Some(429),
            Error::Server { status, .. } | Error::Remote { status, .. } => Some(*status),
            Error::MaxRetriesExceeded { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Validation { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }
}
