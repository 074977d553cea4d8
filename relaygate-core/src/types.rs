//! Type definitions for RelayGate calls, responses and limiter configuration.
//!
//! This module contains the core types used throughout RelayGate for:
//! - The inbound call as seen by the pipeline ([`InboundCall`])
//! - The logical outbound call description ([`ProxyRequest`])
//! - The response handed back to the host ([`GatewayResponse`])
//! - Rate limiting configuration and state
//! - Proxy behavior configuration

use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::headers;

// ============================================================================
// Inbound call
// ============================================================================

/// Host-neutral view of an inbound HTTP call.
///
/// The host adapter builds one per request; guards and hooks only ever see
/// this type, never the host framework's request object.
///
/// # Example
///
/// ```
/// use relaygate_core::InboundCall;
/// use hyper::Method;
///
/// let call = InboundCall::new(Method::OPTIONS)
///     .with_header("origin", "https://app.example.com");
///
/// assert!(call.is_preflight());
/// assert_eq!(call.origin(), Some("https://app.example.com"));
/// ```
#[derive(Clone, Debug)]
pub struct InboundCall {
    /// HTTP method of the inbound call
    pub method: Method,
    /// Inbound request headers
    pub headers: HeaderMap,
    /// Raw inbound body (expected to be a JSON [`ProxyRequest`])
    pub body: Bytes,
    /// Address of the connected peer, when the host knows it
    pub remote_addr: Option<IpAddr>,
}

impl InboundCall {
    /// Creates an inbound call with no headers and an empty body.
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            remote_addr: None,
        }
    }

    /// Adds a header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets the raw body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the body to the serialized JSON value.
    pub fn with_json(self, body: &Value) -> Self {
        let bytes = serde_json::to_vec(body).unwrap_or_default();
        self.with_body(bytes)
    }

    /// Sets the peer address.
    pub fn with_remote_addr(mut self, addr: IpAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the `Origin` header.
    pub fn origin(&self) -> Option<&str> {
        self.header(headers::ORIGIN)
    }

    /// Returns true for CORS preflight (`OPTIONS`) calls.
    pub fn is_preflight(&self) -> bool {
        self.method == Method::OPTIONS
    }
}

// ============================================================================
// Proxy request
// ============================================================================

fn empty_object() -> Value {
    json!({})
}

/// The logical outbound call carried in the inbound body.
///
/// `endpoint` is either absolute (`scheme://...`) or relative to the
/// configured base URL. Missing fields deserialize to empty values so that a
/// partial body is rejected by validation rather than by the parser.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProxyRequest {
    /// HTTP method for the outbound call
    #[serde(default)]
    pub method: String,
    /// Absolute URL or path relative to the base URL
    #[serde(default)]
    pub endpoint: String,
    /// Payload serialized as the outbound JSON body
    #[serde(default = "empty_object")]
    pub data: Value,
}

impl ProxyRequest {
    /// Creates a proxy request.
    pub fn new(method: impl Into<String>, endpoint: impl Into<String>, data: Value) -> Self {
        Self {
            method: method.into(),
            endpoint: endpoint.into(),
            data,
        }
    }

    /// Parses an inbound body, tolerating empty or invalid JSON as `{}`.
    ///
    /// # Example
    ///
    /// ```
    /// use relaygate_core::ProxyRequest;
    ///
    /// let req = ProxyRequest::from_body(b"not json");
    /// assert!(req.method.is_empty());
    /// assert_eq!(req.data, serde_json::json!({}));
    /// ```
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

impl Default for ProxyRequest {
    fn default() -> Self {
        Self {
            method: String::new(),
            endpoint: String::new(),
            data: empty_object(),
        }
    }
}

/// Partial override returned by a request transform hook.
///
/// Fields left as `None` keep the original values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyRequestPatch {
    /// Replacement method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Replacement endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Replacement payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProxyRequestPatch {
    /// Merges this patch over `base`.
    pub fn apply(self, base: ProxyRequest) -> ProxyRequest {
        ProxyRequest {
            method: self.method.unwrap_or(base.method),
            endpoint: self.endpoint.unwrap_or(base.endpoint),
            data: self.data.unwrap_or(base.data),
        }
    }
}

// ============================================================================
// Gateway response
// ============================================================================

/// Response produced by the pipeline for the host to send back.
#[derive(Clone, Debug)]
pub struct GatewayResponse {
    /// Status code for the inbound caller
    pub status: StatusCode,
    /// Extra headers (CORS)
    pub headers: HeaderMap,
    /// JSON body; `None` for bodyless responses such as a 204 preflight
    pub body: Option<Value>,
}

impl GatewayResponse {
    /// Creates a JSON response.
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Some(body),
        }
    }

    /// Creates a response without a body.
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Creates an `{"error": message}` response.
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self::json(status, json!({ "error": message }))
    }

    /// Adds all headers from `headers`, replacing existing values.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Serializes the body for the wire. Bodyless responses yield empty bytes.
    pub fn body_bytes(&self) -> Bytes {
        match &self.body {
            Some(body) => Bytes::from(serde_json::to_vec(body).unwrap_or_default()),
            None => Bytes::new(),
        }
    }
}

// ============================================================================
// Rate limiting
// ============================================================================

/// Function deriving the rate limiting key from a call.
pub type RateKeyFn = Arc<dyn Fn(&InboundCall) -> String + Send + Sync>;

/// Configuration for the in-memory fixed-window rate limit.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use relaygate_core::RateLimitConfig;
///
/// let config = RateLimitConfig::new(100, Duration::from_secs(60));
/// assert!(config.is_valid());
/// ```
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Maximum number of requests allowed per key within the window
    pub max_requests: u32,
    /// Duration of the fixed window
    pub window_duration: Duration,
    /// Key function; the client identity is used when `None`
    pub key: Option<RateKeyFn>,
}

impl RateLimitConfig {
    /// Creates a configuration keyed by client identity.
    pub fn new(max_requests: u32, window_duration: Duration) -> Self {
        Self {
            max_requests,
            window_duration,
            key: None,
        }
    }

    /// Sets an explicit key function.
    pub fn with_key<F>(mut self, key: F) -> Self
    where
        F: Fn(&InboundCall) -> String + Send + Sync + 'static,
    {
        self.key = Some(Arc::new(key));
        self
    }

    /// Returns `true` if the configuration is valid.
    ///
    /// A valid configuration has at least one allowed request and a non-zero window.
    pub fn is_valid(&self) -> bool {
        self.max_requests > 0 && !self.window_duration.is_zero()
    }

    /// Returns the window length in milliseconds.
    pub fn window_ms(&self) -> u64 {
        u64::try_from(self.window_duration.as_millis()).unwrap_or(u64::MAX)
    }
}

impl fmt::Debug for RateLimitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitConfig")
            .field("max_requests", &self.max_requests)
            .field("window_duration", &self.window_duration)
            .field("key", &self.key.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Configuration for automatic cleanup of expired rate limit entries.
///
/// Bounds the memory of the window store: once the entry count exceeds
/// `threshold`, expired windows are swept at most once per `interval`.
#[derive(Clone, Debug)]
pub struct RateLimitCleanupConfig {
    /// Number of entries before triggering cleanup (0 = disabled)
    pub threshold: usize,
    /// Minimum interval between cleanup operations
    pub interval: Duration,
}

impl RateLimitCleanupConfig {
    /// Returns `true` if automatic cleanup is enabled.
    pub fn is_enabled(&self) -> bool {
        self.threshold > 0
    }
}

impl Default for RateLimitCleanupConfig {
    fn default() -> Self {
        Self {
            threshold: crate::defaults::RATE_LIMIT_CLEANUP_THRESHOLD,
            interval: crate::defaults::RATE_LIMIT_CLEANUP_INTERVAL,
        }
    }
}

/// Per-key fixed window: request count and the instant (epoch ms) the window ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateWindowState {
    /// Number of requests admitted in the current window
    pub count: u32,
    /// Epoch milliseconds at which the window expires
    pub expires_at_ms: u64,
}

impl RateWindowState {
    /// Opens a window at `now_ms` with a count of 1.
    pub fn open(now_ms: u64, window_ms: u64) -> Self {
        Self {
            count: 1,
            expires_at_ms: now_ms.saturating_add(window_ms),
        }
    }

    /// Returns true once the window has run its full length.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_ms <= now_ms
    }
}

/// Thread-safe window store owned by one pipeline.
///
/// Clones share the same state. Uses `tokio::sync::Mutex` for async-friendly
/// locking that won't block the Tokio thread pool.
#[derive(Clone, Default)]
pub struct RateLimiter {
    inner: Arc<Mutex<HashMap<String, RateWindowState>>>,
    last_cleanup: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    /// Creates a new empty rate limiter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a reference to the inner mutex-protected map.
    pub fn inner(&self) -> &Arc<Mutex<HashMap<String, RateWindowState>>> {
        &self.inner
    }

    pub(crate) fn last_cleanup(&self) -> &Mutex<Option<Instant>> {
        &self.last_cleanup
    }
}

// ============================================================================
// Proxy and CORS configuration
// ============================================================================

/// Configuration for upstream communication.
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    /// Timeout for upstream requests
    pub timeout: Duration,
    /// Maximum inbound body size in bytes (0 = unlimited)
    pub max_body_size: usize,
}

impl ProxyConfig {
    /// Returns `true` if the configuration is valid.
    ///
    /// A valid configuration has a non-zero timeout.
    pub fn is_valid(&self) -> bool {
        !self.timeout.is_zero()
    }

    /// Returns the maximum body size formatted for display.
    pub fn max_body_size_mb(&self) -> String {
        if self.max_body_size == 0 {
            "unlimited".to_string()
        } else {
            (self.max_body_size / 1024 / 1024).to_string()
        }
    }

    /// Converts megabytes to bytes; 0 stays 0 (unlimited).
    pub fn mb_to_bytes(mb: usize) -> usize {
        if mb == 0 { 0 } else { mb * 1024 * 1024 }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            timeout: crate::defaults::PROXY_TIMEOUT,
            max_body_size: crate::defaults::MAX_BODY_SIZE,
        }
    }
}

/// Method and header lists advertised on preflight responses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorsConfig {
    /// `Access-Control-Allow-Methods` value
    pub methods: String,
    /// `Access-Control-Allow-Headers` value
    pub headers: String,
}

impl CorsConfig {
    /// Builds the lists from individual entries.
    pub fn new<M, H>(methods: M, headers: H) -> Self
    where
        M: IntoIterator,
        M::Item: AsRef<str>,
        H: IntoIterator,
        H::Item: AsRef<str>,
    {
        let join = |items: Vec<String>| items.join(", ");
        Self {
            methods: join(methods.into_iter().map(|m| m.as_ref().to_string()).collect()),
            headers: join(headers.into_iter().map(|h| h.as_ref().to_string()).collect()),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            methods: crate::defaults::CORS_METHODS.to_string(),
            headers: crate::defaults::CORS_HEADERS.to_string(),
        }
    }
}
