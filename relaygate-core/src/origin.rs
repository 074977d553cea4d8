//! Origin policy and CORS headers.
//!
//! An [`OriginPolicy`] decides whether the caller's `Origin` may use the
//! gateway. It is evaluated for preflight (`OPTIONS`) calls, which are answered
//! directly, and for actual calls, which are rejected with 403 on denial.
//!
//! # Precedence
//!
//! 1. No policy configured: every origin is allowed
//! 2. [`OriginPolicy::Any`]: every origin is allowed
//! 3. [`OriginPolicy::Exact`]: only an exact string match
//! 4. [`OriginPolicy::List`]: the list contains `*` or the origin
//! 5. [`OriginPolicy::Predicate`]: delegated, with the full call visible

use hyper::header::HeaderValue;
use hyper::{HeaderMap, StatusCode};
use serde_json::json;
use std::fmt;
use std::sync::Arc;

use crate::defaults::WILDCARD_ORIGIN;
use crate::error::{GatewayError, Result};
use crate::headers;
use crate::hooks::CorsDeniedFn;
use crate::types::{CorsConfig, GatewayResponse, InboundCall};

/// Predicate over the origin and the full inbound call.
pub type OriginPredicate = Arc<dyn Fn(&str, &InboundCall) -> bool + Send + Sync>;

/// Which origins may call the gateway.
#[derive(Clone)]
pub enum OriginPolicy {
    /// The wildcard marker: any origin
    Any,
    /// A single origin, matched exactly
    Exact(String),
    /// A set of origins; a `*` entry allows any origin
    List(Vec<String>),
    /// Custom decision
    Predicate(OriginPredicate),
}

impl OriginPolicy {
    /// Creates a predicate policy.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str, &InboundCall) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Builds a policy from a list of origins.
    ///
    /// A list holding only `*` becomes [`OriginPolicy::Any`].
    pub fn from_list<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let origins: Vec<String> = origins.into_iter().map(Into::into).collect();
        match origins.as_slice() {
            [single] if single == WILDCARD_ORIGIN => Self::Any,
            _ => Self::List(origins),
        }
    }

    /// Parses a configuration string.
    ///
    /// `*` maps to [`OriginPolicy::Any`], a single entry to
    /// [`OriginPolicy::Exact`], and a comma-separated list to
    /// [`OriginPolicy::List`]. Blank input yields `None`.
    ///
    /// # Example
    ///
    /// ```
    /// use relaygate_core::OriginPolicy;
    ///
    /// assert!(matches!(OriginPolicy::parse("*"), Some(OriginPolicy::Any)));
    /// assert!(matches!(
    ///     OriginPolicy::parse("https://a.test"),
    ///     Some(OriginPolicy::Exact(_))
    /// ));
    /// assert!(matches!(
    ///     OriginPolicy::parse("https://a.test, https://b.test"),
    ///     Some(OriginPolicy::List(_))
    /// ));
    /// assert!(OriginPolicy::parse("  ").is_none());
    /// ```
    pub fn parse(value: &str) -> Option<Self> {
        let entries: Vec<String> = value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        match entries.as_slice() {
            [] => None,
            [single] if single == WILDCARD_ORIGIN => Some(Self::Any),
            [single] => Some(Self::Exact(single.clone())),
            _ => Some(Self::List(entries)),
        }
    }

    /// Returns true if `origin` may call the gateway.
    pub fn is_allowed(&self, origin: &str, call: &InboundCall) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(allowed) => allowed == origin,
            Self::List(allowed) => allowed
                .iter()
                .any(|entry| entry == WILDCARD_ORIGIN || entry == origin),
            Self::Predicate(predicate) => predicate(origin, call),
        }
    }
}

impl fmt::Debug for OriginPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Exact(origin) => f.debug_tuple("Exact").field(origin).finish(),
            Self::List(origins) => f.debug_tuple("List").field(origins).finish(),
            Self::Predicate(_) => f.write_str("Predicate(<fn>)"),
        }
    }
}

/// Evaluates an optional policy; no policy allows every origin.
pub fn is_origin_allowed(
    policy: Option<&OriginPolicy>,
    origin: &str,
    call: &InboundCall,
) -> bool {
    policy.is_none_or(|policy| policy.is_allowed(origin, call))
}

/// Checks the call's `Origin` header (empty when absent) against the policy.
///
/// # Errors
///
/// Returns [`GatewayError::OriginNotAllowed`] carrying the rejected origin.
pub fn check_origin(policy: Option<&OriginPolicy>, call: &InboundCall) -> Result<()> {
    let origin = call.origin().unwrap_or_default();
    if is_origin_allowed(policy, origin, call) {
        Ok(())
    } else {
        Err(GatewayError::OriginNotAllowed(origin.to_string()))
    }
}

/// Response for a rejected call. The `on_denied` hook replaces the default
/// `{"error": "Origin not allowed"}` body of an origin denial.
pub fn denial_response(err: &GatewayError, on_denied: Option<&CorsDeniedFn>) -> GatewayResponse {
    let body = match (err, on_denied) {
        (GatewayError::OriginNotAllowed(origin), Some(hook)) => hook(origin),
        _ => json!({ "error": err.user_message() }),
    };
    GatewayResponse::json(err.status_code(), body)
}

/// `Access-Control-Allow-Origin` value for an allowed origin.
///
/// The origin is echoed back; calls without an origin get `*`.
fn allow_origin_value(origin: &str) -> Option<HeaderValue> {
    if origin.is_empty() {
        Some(HeaderValue::from_static(WILDCARD_ORIGIN))
    } else {
        HeaderValue::from_str(origin).ok()
    }
}

/// Headers attached to responses for an allowed origin.
pub fn allow_headers(origin: &str) -> HeaderMap {
    let mut map = HeaderMap::new();
    if let Some(value) = allow_origin_value(origin) {
        map.insert(headers::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    map.insert(headers::VARY, HeaderValue::from_static("Origin"));
    map
}

/// Method and header lists present on every preflight response.
fn preflight_headers(cors: &CorsConfig) -> HeaderMap {
    let mut map = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&cors.methods) {
        map.insert(headers::ACCESS_CONTROL_ALLOW_METHODS, value);
    }
    if let Ok(value) = HeaderValue::from_str(&cors.headers) {
        map.insert(headers::ACCESS_CONTROL_ALLOW_HEADERS, value);
    }
    map.insert(headers::VARY, HeaderValue::from_static("Origin"));
    map
}

/// Answers a preflight call.
///
/// Allowed: 204, no body, allow-origin echoing the origin. Denied: 403 with the
/// denial body and no allow-origin. Both carry the method and header lists.
pub fn preflight_response(
    policy: Option<&OriginPolicy>,
    cors: &CorsConfig,
    on_denied: Option<&CorsDeniedFn>,
    call: &InboundCall,
) -> GatewayResponse {
    let headers = preflight_headers(cors);

    match check_origin(policy, call) {
        Ok(()) => GatewayResponse::empty(StatusCode::NO_CONTENT)
            .with_headers(headers)
            .with_headers(allow_headers(call.origin().unwrap_or_default())),
        Err(err) => denial_response(&err, on_denied).with_headers(headers),
    }
}
