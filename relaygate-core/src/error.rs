//! Error types for RelayGate.
//!
//! Every way an invocation of the pipeline can terminate early is a variant of
//! [`GatewayError`]. Guard denials and malformed calls are terminal for the
//! invocation and never retried; forwarding failures surface with a
//! best-effort detail.

use hyper::StatusCode;
use thiserror::Error;

use crate::hooks::HookError;

/// Result type alias for RelayGate operations.
pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

/// Unified error type for the request pipeline.
///
/// # Example
///
/// ```
/// use relaygate_core::error::GatewayError;
/// use hyper::StatusCode;
///
/// let err = GatewayError::RelativeEndpointWithoutBaseUrl("/todos/1".into());
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert_eq!(err.code(), "RELATIVE_ENDPOINT_WITHOUT_BASE_URL");
/// ```
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The auth hook rejected the call.
    #[error("Unauthorized (auth)")]
    Unauthorized,

    /// The CSRF hook rejected the call.
    #[error("Forbidden (csrf/xss)")]
    Forbidden,

    /// The origin policy rejected the call.
    #[error("Origin not allowed: {0}")]
    OriginNotAllowed(String),

    /// The in-memory counter or the external limiter rejected the call.
    #[error("Rate limit exceeded for client: {0}")]
    RateLimitExceeded(String),

    /// The validate hook rejected the call.
    #[error("Unauthorized")]
    ValidationFailed,

    /// `method` or `endpoint` is empty after transformation.
    #[error("Missing method or endpoint in proxy request")]
    MissingMethodOrEndpoint,

    /// A relative endpoint was supplied but no base URL is configured.
    #[error("Relative endpoint '{0}' requires a configured base URL")]
    RelativeEndpointWithoutBaseUrl(String),

    /// The method is not a valid HTTP method token.
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Upstream request timed out.
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    /// Upstream connection failed.
    #[error("Upstream connection failed: {0}")]
    UpstreamConnectionFailed(String),

    /// Failed to read the upstream response body.
    #[error("Body read error: {0}")]
    BodyReadError(String),

    /// Invalid outbound header value.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// A transform, sanitize, mask or monitor hook returned an error.
    #[error("Hook '{hook}' failed: {detail}")]
    HookFailed { hook: &'static str, detail: String },

    /// HTTP client error (from reqwest).
    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),
}

impl GatewayError {
    /// Wraps an error returned by the named hook.
    pub fn hook_failed(hook: &'static str, err: HookError) -> Self {
        Self::HookFailed {
            hook,
            detail: err.to_string(),
        }
    }

    /// Returns the HTTP status code returned to the inbound caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::ValidationFailed => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::OriginNotAllowed(_) => StatusCode::FORBIDDEN,
            Self::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::MissingMethodOrEndpoint
            | Self::RelativeEndpointWithoutBaseUrl(_)
            | Self::InvalidMethod(_) => StatusCode::BAD_REQUEST,
            Self::UpstreamTimeout(_)
            | Self::UpstreamConnectionFailed(_)
            | Self::BodyReadError(_)
            | Self::InvalidHeader(_)
            | Self::HookFailed { .. }
            | Self::HttpClientError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::OriginNotAllowed(_) => "ORIGIN_NOT_ALLOWED",
            Self::RateLimitExceeded(_) => "RATE_LIMIT_EXCEEDED",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::MissingMethodOrEndpoint => "MISSING_METHOD_OR_ENDPOINT",
            Self::RelativeEndpointWithoutBaseUrl(_) => "RELATIVE_ENDPOINT_WITHOUT_BASE_URL",
            Self::InvalidMethod(_) => "INVALID_METHOD",
            Self::UpstreamTimeout(_) => "UPSTREAM_TIMEOUT",
            Self::UpstreamConnectionFailed(_) => "UPSTREAM_CONNECTION_FAILED",
            Self::BodyReadError(_) => "BODY_READ_ERROR",
            Self::InvalidHeader(_) => "INVALID_HEADER",
            Self::HookFailed { .. } => "HOOK_FAILED",
            Self::HttpClientError(_) => "HTTP_CLIENT_ERROR",
        }
    }

    /// Returns the message placed in the `error` field of the response body.
    ///
    /// Guard denials use fixed messages; everything else carries its detail.
    pub fn user_message(&self) -> String {
        match self {
            Self::OriginNotAllowed(_) => "Origin not allowed".to_string(),
            Self::RateLimitExceeded(_) => "Rate limit exceeded".to_string(),
            other => other.to_string(),
        }
    }

    /// Returns true if the call was rejected because it was malformed.
    pub fn is_malformed_call(&self) -> bool {
        matches!(
            self,
            Self::MissingMethodOrEndpoint
                | Self::RelativeEndpointWithoutBaseUrl(_)
                | Self::InvalidMethod(_)
        )
    }

    /// Returns true if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}
