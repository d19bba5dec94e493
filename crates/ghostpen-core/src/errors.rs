use std::fmt;
use std::time::Duration;

/// Typed error hierarchy for model gateway operations.
/// Nothing is retried; the category decides how the failure is reported.
#[derive(Clone, Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },
    #[error("server error {status}: {body}")]
    ServerError { status: u16, body: String },
    #[error("provider overloaded")]
    ProviderOverloaded,
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("timeout after {0:?}")]
    Timeout(Duration),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Human-facing classification used at the process boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    Auth,
    RateLimit,
    Connectivity,
    Timeout,
    Generic,
}

impl ErrorCategory {
    /// One-line advice printed next to the error.
    pub fn hint(self) -> &'static str {
        match self {
            Self::Auth => "ANTHROPIC_API_KEY is missing or invalid. Check your environment.",
            Self::RateLimit => "API rate limit exceeded. Wait a minute and try again.",
            Self::Connectivity => "Cannot reach the API. Check your internet connection.",
            Self::Timeout => "The request timed out. Try again.",
            Self::Generic => "Unexpected error.",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Auth => "auth",
            Self::RateLimit => "rate_limit",
            Self::Connectivity => "connectivity",
            Self::Timeout => "timeout",
            Self::Generic => "generic",
        };
        f.write_str(s)
    }
}

impl GatewayError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AuthenticationFailed(_) => ErrorCategory::Auth,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::NetworkError(_) => ErrorCategory::Connectivity,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::InvalidRequest(_)
            | Self::ServerError { .. }
            | Self::ProviderOverloaded
            | Self::MalformedResponse(_) => ErrorCategory::Generic,
        }
    }

    pub fn suggested_delay(&self) -> Option<Duration> {
        if let Self::RateLimited { retry_after } = self {
            *retry_after
        } else {
            None
        }
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::InvalidRequest(_) => "invalid_request",
            Self::RateLimited { .. } => "rate_limited",
            Self::ServerError { .. } => "server_error",
            Self::ProviderOverloaded => "provider_overloaded",
            Self::NetworkError(_) => "network_error",
            Self::Timeout(_) => "timeout",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }

    /// Classify an HTTP status code into the appropriate error variant.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::AuthenticationFailed(body),
            400 | 404 | 413 => Self::InvalidRequest(body),
            408 => Self::Timeout(Duration::ZERO),
            429 => Self::RateLimited { retry_after: None },
            529 => Self::ProviderOverloaded,
            500..=599 => Self::ServerError { status, body },
            _ => Self::InvalidRequest(format!("unexpected status {status}: {body}")),
        }
    }
}
